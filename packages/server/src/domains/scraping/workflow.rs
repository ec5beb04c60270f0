//! The per-run workflow: extract one page, save its listings, report once.

use std::sync::Arc;

use async_trait::async_trait;
use listing_extraction::ExtractionError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::registry::ScraperRegistry;
use crate::domains::listings::ListingRepository;
use crate::kernel::jobs::JobRunOutcome;
use crate::kernel::notifier::Notifier;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// No extractor is registered under this site name
    #[error("scraper not found for site: {0}")]
    SiteNotRegistered(String),

    /// Fetching or extracting the page failed
    #[error("scraping {site} failed: {source}")]
    Extraction {
        site: String,
        #[source]
        source: ExtractionError,
    },
}

/// Entry point shared by scheduled and on-demand runs.
#[async_trait]
pub trait ScrapeWorkflow: Send + Sync {
    fn has_site(&self, site: &str) -> bool;

    async fn scrape_website(
        &self,
        site: &str,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<JobRunOutcome, WorkflowError>;
}

/// Runs a site's extractor, upserts the listings and sends one notification.
pub struct ScraperService {
    registry: ScraperRegistry,
    repository: Arc<dyn ListingRepository>,
    notifier: Arc<dyn Notifier>,
}

impl ScraperService {
    pub fn new(
        registry: ScraperRegistry,
        repository: Arc<dyn ListingRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            registry,
            repository,
            notifier,
        }
    }

    pub fn registry(&self) -> &ScraperRegistry {
        &self.registry
    }

    async fn notify_error(&self, site: &str, message: &str) {
        if let Err(e) = self.notifier.notify_error(site, message).await {
            error!(site = %site, error = %format!("{:#}", e), "Failed to send error notification");
        }
    }

    async fn notify_success(&self, site: &str, count: usize) {
        if let Err(e) = self.notifier.notify_success(site, count).await {
            error!(site = %site, error = %format!("{:#}", e), "Failed to send success notification");
        }
    }
}

#[async_trait]
impl ScrapeWorkflow for ScraperService {
    fn has_site(&self, site: &str) -> bool {
        self.registry.contains(site)
    }

    async fn scrape_website(
        &self,
        site: &str,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<JobRunOutcome, WorkflowError> {
        let scraper = self
            .registry
            .get(site)
            .ok_or_else(|| WorkflowError::SiteNotRegistered(site.to_string()))?;

        let mut outcome = JobRunOutcome::start(site);
        info!(job_id = %outcome.job_id, site = %site, url = %url, "Scrape started");

        let result = match scraper.scrape(url, cancel).await {
            Ok(result) => result,
            Err(e) => {
                let message = e.to_string();
                outcome.fail(&message);
                error!(
                    job_id = %outcome.job_id,
                    site = %site,
                    duration_ms = outcome.duration.as_millis() as u64,
                    error = %message,
                    "Scrape failed"
                );
                self.notify_error(site, &message).await;
                return Err(WorkflowError::Extraction {
                    site: site.to_string(),
                    source: e,
                });
            }
        };

        let mut saved = 0;
        let mut failed = 0;
        for listing in &result.listings {
            match self.repository.save(listing).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    failed += 1;
                    warn!(
                        site = %site,
                        url = %listing.url,
                        error = %format!("{:#}", e),
                        "Failed to save listing"
                    );
                }
            }
        }

        self.notify_success(site, saved).await;

        outcome.complete(result.total_scraped, saved, result.error_count + failed);
        info!(
            job_id = %outcome.job_id,
            site = %site,
            scraped = outcome.scraped_count,
            saved = outcome.saved_count,
            errors = outcome.error_count,
            duration_ms = outcome.duration.as_millis() as u64,
            "Scrape completed"
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::listings::MemoryListingRepository;
    use crate::kernel::jobs::JobStatus;
    use crate::kernel::notifier::{Notification, RecordingNotifier};
    use listing_extraction::testing::MockScraper;

    fn service(
        scraper: MockScraper,
        repo: Arc<MemoryListingRepository>,
        notifier: Arc<RecordingNotifier>,
    ) -> ScraperService {
        let mut registry = ScraperRegistry::new();
        registry.register("rumah123", Arc::new(scraper));
        ScraperService::new(registry, repo, notifier)
    }

    #[tokio::test]
    async fn test_unregistered_site_is_not_notified() {
        let notifier = Arc::new(RecordingNotifier::new());
        let svc = service(
            MockScraper::new("rumah123"),
            Arc::new(MemoryListingRepository::new()),
            notifier.clone(),
        );

        let err = svc
            .scrape_website("olx", "https://www.olx.co.id/", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::SiteNotRegistered(ref s) if s == "olx"));
        assert_eq!(err.to_string(), "scraper not found for site: olx");
        assert!(notifier.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_notifies_once_and_saves_nothing() {
        let repo = Arc::new(MemoryListingRepository::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let svc = service(
            MockScraper::new("rumah123").failing("HTTP 503"),
            repo.clone(),
            notifier.clone(),
        );

        let err = svc
            .scrape_website("rumah123", "https://www.rumah123.com/", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Extraction { .. }));
        assert!(repo.is_empty());

        let sent = notifier.notifications();
        assert_eq!(sent.len(), 1);
        match &sent[0] {
            Notification::Error { site_name, error, .. } => {
                assert_eq!(site_name, "rumah123");
                assert!(error.contains("HTTP 503"));
            }
            other => panic!("unexpected notification: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_success_reports_outcome() {
        let repo = Arc::new(MemoryListingRepository::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let listings = vec![
            listing_extraction::Listing::new("rumah123", "https://x.test/1", "A", 1.0, "Depok"),
            listing_extraction::Listing::new("rumah123", "https://x.test/2", "B", 2.0, "Bogor"),
        ];
        let svc = service(
            MockScraper::new("rumah123").with_listings(listings),
            repo.clone(),
            notifier.clone(),
        );

        let outcome = svc
            .scrape_website("rumah123", "https://www.rumah123.com/", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.status, JobStatus::Completed);
        assert_eq!(outcome.scraped_count, 2);
        assert_eq!(outcome.saved_count, 2);
        assert_eq!(outcome.error_count, 0);
        assert!(outcome.finished_at.is_some());
        assert_eq!(repo.len(), 2);
        let sent = notifier.notifications();
        assert!(matches!(
            sent.as_slice(),
            [Notification::Success { count: 2, .. }]
        ));
    }
}
