use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

/// Summary of one scrape run, used for logging. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct JobRunOutcome {
    pub job_id: Uuid,
    pub site: String,
    pub status: JobStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub duration: Duration,
    pub scraped_count: usize,
    pub saved_count: usize,
    pub error_count: usize,
    pub message: Option<String>,
    #[serde(skip)]
    started: Instant,
}

impl JobRunOutcome {
    /// A running outcome for `site`, timed from now.
    pub fn start(site: impl Into<String>) -> Self {
        Self {
            job_id: Uuid::new_v4(),
            site: site.into(),
            status: JobStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            duration: Duration::ZERO,
            scraped_count: 0,
            saved_count: 0,
            error_count: 0,
            message: None,
            started: Instant::now(),
        }
    }

    pub fn complete(&mut self, scraped: usize, saved: usize, errors: usize) {
        self.scraped_count = scraped;
        self.saved_count = saved;
        self.error_count = errors;
        self.finish(JobStatus::Completed);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
        self.finish(JobStatus::Failed);
    }

    fn finish(&mut self, status: JobStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
        self.duration = self.started.elapsed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle() {
        let mut outcome = JobRunOutcome::start("rumah123");
        assert_eq!(outcome.status, JobStatus::Running);
        assert!(outcome.finished_at.is_none());

        outcome.complete(5, 4, 1);
        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(outcome.saved_count, 4);
        assert!(outcome.finished_at.is_some());
    }

    #[test]
    fn test_fail_keeps_message() {
        let mut outcome = JobRunOutcome::start("rumah123");
        outcome.fail("HTTP 503");
        assert_eq!(outcome.status, JobStatus::Failed);
        assert_eq!(outcome.message.as_deref(), Some("HTTP 503"));
    }
}
