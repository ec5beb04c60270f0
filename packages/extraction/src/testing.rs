//! Testing utilities including mock implementations.
//!
//! Mocks never touch the network and record every call so tests can assert
//! on how they were driven.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::{ExtractionError, FetchError, FetchResult, Result};
use crate::fetch::{FetchedPage, PageFetcher};
use crate::sites::ListingScraper;
use crate::types::listing::Listing;
use crate::types::result::ScrapeResult;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

fn connection_refused() -> FetchError {
    FetchError::Http(Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "Mock connection refused",
    )))
}

/// A mock fetcher that serves predefined HTML by URL.
#[derive(Default)]
pub struct MockFetcher {
    pages: Mutex<HashMap<String, String>>,

    /// URL -> remaining failures before the page is served
    failures: Mutex<HashMap<String, u32>>,

    calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `html` for `url`.
    pub fn with_page(self, url: impl Into<String>, html: impl Into<String>) -> Self {
        lock(&self.pages).insert(url.into(), html.into());
        self
    }

    /// Fail every fetch of `url`.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        lock(&self.failures).insert(url.into(), u32::MAX);
        self
    }

    /// Fail the first `times` fetches of `url`, then serve it.
    pub fn fail_times(self, url: impl Into<String>, times: u32) -> Self {
        lock(&self.failures).insert(url.into(), times);
        self
    }

    /// URLs fetched so far, in order.
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        lock(&self.calls).push(url.to_string());

        {
            let mut failures = lock(&self.failures);
            if let Some(remaining) = failures.get_mut(url) {
                if *remaining > 0 {
                    if *remaining != u32::MAX {
                        *remaining -= 1;
                    }
                    return Err(connection_refused());
                }
            }
        }

        lock(&self.pages)
            .get(url)
            .map(|html| FetchedPage::new(url, html.clone()))
            .ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
    }
}

/// A mock scraper returning a canned outcome.
///
/// Tracks how many scrapes run at once so tests can assert mutual exclusion.
pub struct MockScraper {
    site_name: String,
    listings: Vec<Listing>,
    fail_with: Option<String>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockScraper {
    /// A scraper that succeeds with no listings.
    pub fn new(site_name: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            listings: Vec::new(),
            fail_with: None,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_listings(mut self, listings: Vec<Listing>) -> Self {
        self.listings = listings;
        self
    }

    /// Fail every scrape as if the fetch had been exhausted.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_with = Some(message.into());
        self
    }

    /// Hold each scrape open for `delay` (honours cancellation).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Highest number of scrapes observed running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ListingScraper for MockScraper {
    fn site_name(&self) -> &str {
        &self.site_name
    }

    async fn scrape(&self, url: &str, cancel: &CancellationToken) -> Result<ScrapeResult> {
        lock(&self.calls).push(url.to_string());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let cancelled = if self.delay.is_zero() {
            false
        } else {
            tokio::select! {
                _ = cancel.cancelled() => true,
                _ = tokio::time::sleep(self.delay) => false,
            }
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if cancelled {
            return Err(ExtractionError::Cancelled);
        }

        if let Some(message) = &self.fail_with {
            return Err(ExtractionError::FetchExhausted {
                url: url.to_string(),
                attempts: 3,
                source: FetchError::Http(message.clone().into()),
            });
        }

        let mut result = ScrapeResult::new(&self.site_name, url);
        result.total_found = self.listings.len();
        for listing in &self.listings {
            result.push_listing(listing.clone());
        }
        Ok(result)
    }
}
