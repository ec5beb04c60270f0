//! Executes one firing of a scrape job.
//!
//! ```text
//! fire(slot)
//!     │
//!     ├─► local guard (previous firing still running → skip)
//!     ├─► try_acquire("job:lock:<site>", worker_id, ttl)
//!     │       ├─► held elsewhere → skip
//!     │       └─► backend error  → skip, log
//!     ├─► ScrapeWorkflow::scrape_website (own task, panics caught)
//!     └─► release lock
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::definition::JobDefinition;
use super::outcome::JobRunOutcome;
use crate::domains::scraping::{ScrapeWorkflow, WorkflowError};
use crate::kernel::locks::{lock_key, LockStore};
use crate::kernel::notifier::Notifier;

/// Configuration for the job runner.
#[derive(Debug, Clone)]
pub struct JobRunnerConfig {
    /// Worker ID written into lock records
    pub worker_id: String,
    /// Lock lifetime; must exceed the longest expected run
    pub lock_ttl: Duration,
}

impl Default for JobRunnerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("worker-{}", Uuid::new_v4()),
            lock_ttl: Duration::from_secs(600),
        }
    }
}

impl JobRunnerConfig {
    /// Create a new config with a specific worker ID.
    pub fn with_worker_id(worker_id: impl Into<String>) -> Self {
        Self {
            worker_id: worker_id.into(),
            ..Default::default()
        }
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }
}

/// How a firing ended.
#[derive(Debug)]
pub enum FireOutcome {
    Completed(JobRunOutcome),
    /// The workflow returned an error or panicked
    Failed,
    /// This worker's previous firing of the job had not returned
    SkippedRunning,
    /// Another worker holds the lock
    SkippedLocked,
    /// The lock store could not be reached; the job did not run
    LockUnavailable,
}

impl FireOutcome {
    pub fn ran(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Failed)
    }
}

/// A scheduled job plus its local "still running" flag.
#[derive(Debug)]
pub struct JobSlot {
    definition: JobDefinition,
    running: AtomicBool,
}

impl JobSlot {
    pub fn new(definition: JobDefinition) -> Self {
        Self {
            definition,
            running: AtomicBool::new(false),
        }
    }

    pub fn definition(&self) -> &JobDefinition {
        &self.definition
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Clears the running flag however the firing ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs job bodies under the local guard and the distributed lock.
pub struct JobRunner {
    config: JobRunnerConfig,
    locks: Arc<dyn LockStore>,
    workflow: Arc<dyn ScrapeWorkflow>,
    notifier: Arc<dyn Notifier>,
    cancel: CancellationToken,
}

impl JobRunner {
    pub fn new(
        locks: Arc<dyn LockStore>,
        workflow: Arc<dyn ScrapeWorkflow>,
        notifier: Arc<dyn Notifier>,
        config: JobRunnerConfig,
    ) -> Self {
        Self {
            config,
            locks,
            workflow,
            notifier,
            cancel: CancellationToken::new(),
        }
    }

    pub fn worker_id(&self) -> &str {
        &self.config.worker_id
    }

    pub fn has_site(&self, site: &str) -> bool {
        self.workflow.has_site(site)
    }

    /// Cancelled when a shutdown stops waiting for in-flight runs.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// One scheduled firing of `slot`.
    pub async fn fire(&self, slot: &JobSlot) -> FireOutcome {
        let job = slot.definition();
        let worker_id = self.worker_id();

        if slot
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!(site = %job.site, "Previous run still in progress, skipping");
            return FireOutcome::SkippedRunning;
        }
        let _guard = RunningGuard(&slot.running);

        let key = lock_key(&job.site);
        match self
            .locks
            .try_acquire(&key, worker_id, self.config.lock_ttl)
            .await
        {
            Ok(true) => {
                debug!(site = %job.site, lock_key = %key, worker_id = %worker_id, "Lock acquired");
            }
            Ok(false) => {
                info!(site = %job.site, lock_key = %key, "Job locked by another worker, skipping");
                return FireOutcome::SkippedLocked;
            }
            Err(e) => {
                error!(site = %job.site, lock_key = %key, error = %e, "Failed to acquire job lock, skipping");
                return FireOutcome::LockUnavailable;
            }
        }

        let outcome = self.execute(&job.site, &job.seed_url).await;

        if let Err(e) = self.locks.release(&key, worker_id).await {
            error!(site = %job.site, lock_key = %key, error = %e, "Failed to release job lock");
        }

        outcome
    }

    /// An out-of-band run. Takes no lock, so it can overlap a scheduled run.
    pub async fn run_on_demand(&self, site: &str, url: &str) -> FireOutcome {
        info!(site = %site, url = %url, "On-demand scrape started");
        self.execute(site, url).await
    }

    /// Run the workflow on its own task so a panic still returns here.
    async fn execute(&self, site: &str, url: &str) -> FireOutcome {
        let workflow = self.workflow.clone();
        let cancel = self.cancel.child_token();
        let task_site = site.to_string();
        let task_url = url.to_string();

        let handle = tokio::spawn(async move {
            workflow
                .scrape_website(&task_site, &task_url, &cancel)
                .await
        });

        match handle.await {
            Ok(Ok(outcome)) => FireOutcome::Completed(outcome),
            Ok(Err(e @ WorkflowError::SiteNotRegistered(_))) => {
                error!(site = %site, error = %e, "Job failed");
                self.notify_error(site, &e.to_string()).await;
                FireOutcome::Failed
            }
            Ok(Err(e)) => {
                // Already reported by the workflow.
                error!(site = %site, error = %e, "Job failed");
                FireOutcome::Failed
            }
            Err(e) => {
                error!(site = %site, error = %e, "Job panicked");
                self.notify_error(site, &format!("job panicked: {}", e)).await;
                FireOutcome::Failed
            }
        }
    }

    async fn notify_error(&self, site: &str, message: &str) {
        if let Err(e) = self.notifier.notify_error(site, message).await {
            error!(site = %site, error = %format!("{:#}", e), "Failed to send error notification");
        }
    }
}
