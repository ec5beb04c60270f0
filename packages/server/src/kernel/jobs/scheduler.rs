//! Cron-driven scrape scheduling using tokio-cron-scheduler.
//!
//! Each registered site gets one cron job. A tick hands the site's
//! [`JobSlot`] to the [`JobRunner`], which applies the local and distributed
//! guards. Every job body and on-demand run is tracked so [`JobScheduler::stop`]
//! can wait for them.
//!
//! ```text
//! cron tick (per site)
//!     │
//!     └─► tracker.track_future(runner.fire(slot))
//!
//! trigger(site, url)
//!     │
//!     └─► tracker.spawn(runner.run_on_demand(site, url))
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use thiserror::Error;
use tokio_cron_scheduler::Job;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::definition::JobDefinition;
use super::runner::{JobRunner, JobSlot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("no scraper registered for site: {0}")]
    UnknownSite(String),

    #[error("scheduler is shutting down")]
    ShuttingDown,
}

struct ScheduledJob {
    slot: Arc<JobSlot>,
    cron_id: Uuid,
}

/// Owns the cron jobs, one per site, and the tasks they start.
pub struct JobScheduler {
    cron: tokio_cron_scheduler::JobScheduler,
    runner: Arc<JobRunner>,
    jobs: RwLock<HashMap<String, ScheduledJob>>,
    tracker: TaskTracker,
}

impl JobScheduler {
    pub async fn new(runner: JobRunner) -> Result<Self> {
        let cron = tokio_cron_scheduler::JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create cron scheduler: {}", e))?;

        Ok(Self {
            cron,
            runner: Arc::new(runner),
            jobs: RwLock::new(HashMap::new()),
            tracker: TaskTracker::new(),
        })
    }

    pub fn runner(&self) -> &Arc<JobRunner> {
        &self.runner
    }

    /// Schedule `definition`. One job per site.
    pub async fn add_job(&self, definition: JobDefinition) -> Result<Uuid> {
        if self.read_jobs().contains_key(&definition.site) {
            bail!("job already scheduled for site {}", definition.site);
        }
        if !self.runner.has_site(&definition.site) {
            bail!("no scraper registered for site {}", definition.site);
        }

        let slot = Arc::new(JobSlot::new(definition.clone()));
        let runner = self.runner.clone();
        let tracker = self.tracker.clone();
        let tick_slot = slot.clone();

        let job = Job::new_async(definition.schedule.as_str(), move |_uuid, _lock| {
            let runner = runner.clone();
            let tracker = tracker.clone();
            let slot = tick_slot.clone();
            Box::pin(async move {
                if tracker.is_closed() {
                    debug!(site = %slot.definition().site, "Scheduler stopping, tick ignored");
                    return;
                }
                tracker
                    .track_future(async move {
                        runner.fire(&slot).await;
                    })
                    .await;
            })
        })
        .map_err(|e| {
            anyhow!(
                "Invalid schedule {:?} for site {}: {}",
                definition.schedule,
                definition.site,
                e
            )
        })?;

        let cron_id = self
            .cron
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to schedule site {}: {}", definition.site, e))?;

        info!(site = %definition.site, schedule = %definition.schedule, "Job scheduled");
        self.write_jobs()
            .insert(definition.site.clone(), ScheduledJob { slot, cron_id });

        Ok(cron_id)
    }

    /// Unschedule a site's job. Returns false if none was scheduled.
    pub async fn remove_job(&self, site: &str) -> Result<bool> {
        let Some(job) = self.write_jobs().remove(site) else {
            return Ok(false);
        };

        self.cron
            .remove(&job.cron_id)
            .await
            .map_err(|e| anyhow!("Failed to unschedule site {}: {}", site, e))?;

        info!(site = %site, "Job unscheduled");
        Ok(true)
    }

    /// Scheduled jobs, sorted by site.
    pub fn jobs(&self) -> Vec<JobDefinition> {
        let mut jobs: Vec<JobDefinition> = self
            .read_jobs()
            .values()
            .map(|j| j.slot.definition().clone())
            .collect();
        jobs.sort_by(|a, b| a.site.cmp(&b.site));
        jobs
    }

    /// Begin firing every scheduled job.
    pub async fn start(&self) -> Result<()> {
        self.cron
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start cron scheduler: {}", e))?;
        info!(jobs = self.read_jobs().len(), "Scheduler started");
        Ok(())
    }

    /// Start an unlocked run for `site`, against `url` or the site's seed URL.
    ///
    /// Returns the URL that will be scraped.
    pub fn trigger(&self, site: &str, url: Option<&str>) -> Result<String, TriggerError> {
        let seed_url = self
            .read_jobs()
            .get(site)
            .map(|j| j.slot.definition().seed_url.clone())
            .ok_or_else(|| TriggerError::UnknownSite(site.to_string()))?;

        if self.tracker.is_closed() {
            return Err(TriggerError::ShuttingDown);
        }

        let target = url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .unwrap_or(seed_url);

        let runner = self.runner.clone();
        let task_site = site.to_string();
        let task_url = target.clone();
        self.tracker.spawn(async move {
            runner.run_on_demand(&task_site, &task_url).await;
        });

        Ok(target)
    }

    /// Stop firing and wait up to `deadline` for in-flight runs.
    ///
    /// Returns true if everything finished in time. On timeout the runs are
    /// signalled to cancel but not awaited further.
    pub async fn stop(&self, deadline: Duration) -> bool {
        let mut cron = self.cron.clone();
        if let Err(e) = cron.shutdown().await {
            warn!(error = %e, "Failed to shut down cron scheduler");
        }

        self.tracker.close();
        info!(in_flight = self.tracker.len(), "Waiting for in-flight jobs");

        match tokio::time::timeout(deadline, self.tracker.wait()).await {
            Ok(()) => {
                info!("All jobs finished");
                true
            }
            Err(_) => {
                warn!(
                    in_flight = self.tracker.len(),
                    "Shutdown deadline elapsed, abandoning in-flight jobs"
                );
                self.runner.cancel_token().cancel();
                false
            }
        }
    }

    fn read_jobs(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, ScheduledJob>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_jobs(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, ScheduledJob>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }
}
