//! Test fixtures: listings and in-memory wiring of the worker.

use std::sync::Arc;
use std::time::Duration;

use listing_extraction::testing::MockScraper;
use listing_extraction::{Listing, ListingScraper};
use uuid::Uuid;
use worker_core::domains::listings::MemoryListingRepository;
use worker_core::domains::scraping::{ScraperRegistry, ScraperService};
use worker_core::kernel::jobs::{JobRunner, JobRunnerConfig};
use worker_core::kernel::{MemoryLockStore, RecordingNotifier};

pub const SEED_URL: &str = "https://www.rumah123.test/jual/rumah/";

/// A listing with a unique URL under `site`.
pub fn listing(site: &str, price: f64) -> Listing {
    Listing::new(
        site,
        format!("https://www.{}.test/properti/{}", site, Uuid::new_v4()),
        "Rumah Minimalis",
        price,
        "Jakarta Selatan",
    )
}

pub fn listings(site: &str, count: usize) -> Vec<Listing> {
    (1..=count)
        .map(|i| listing(site, 500_000_000.0 * i as f64))
        .collect()
}

/// In-memory collaborators shared by runners in one test.
pub struct Wiring {
    pub locks: Arc<MemoryLockStore>,
    pub repository: Arc<MemoryListingRepository>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Wiring {
    pub fn new() -> Self {
        Self::with_repository(MemoryListingRepository::new())
    }

    pub fn with_repository(repository: MemoryListingRepository) -> Self {
        Self {
            locks: Arc::new(MemoryLockStore::new()),
            repository: Arc::new(repository),
            notifier: Arc::new(RecordingNotifier::new()),
        }
    }

    /// Workflow with `scrapers` registered under their site names.
    pub fn service(&self, scrapers: &[Arc<MockScraper>]) -> Arc<ScraperService> {
        let mut registry = ScraperRegistry::new();
        for scraper in scrapers {
            registry.register(scraper.site_name(), scraper.clone());
        }
        Arc::new(ScraperService::new(
            registry,
            self.repository.clone(),
            self.notifier.clone(),
        ))
    }

    /// A runner for `worker_id` over the shared lock store.
    pub fn runner(&self, worker_id: &str, scrapers: &[Arc<MockScraper>]) -> JobRunner {
        JobRunner::new(
            self.locks.clone(),
            self.service(scrapers),
            self.notifier.clone(),
            JobRunnerConfig::with_worker_id(worker_id).with_lock_ttl(Duration::from_secs(600)),
        )
    }
}
