//! Output of one extraction run over one page.

use serde::Serialize;
use std::time::Duration;

use super::listing::Listing;

/// What one pipeline invocation produced.
///
/// Consumed immediately by the orchestration workflow; never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct ScrapeResult {
    pub site_name: String,

    /// Page that was scraped
    pub url: String,

    /// Valid listings in document order
    pub listings: Vec<Listing>,

    /// Candidate nodes matched by the list-item selector
    pub total_found: usize,

    /// Candidates that became listings
    pub total_scraped: usize,

    /// Candidates rejected for missing or malformed required fields
    pub error_count: usize,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,

    #[serde(with = "duration_secs")]
    pub duration: Duration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_url: Option<String>,

    pub has_next_page: bool,
}

impl ScrapeResult {
    /// Empty result for `url`.
    pub fn new(site_name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            site_name: site_name.into(),
            url: url.into(),
            listings: Vec::new(),
            total_found: 0,
            total_scraped: 0,
            error_count: 0,
            errors: Vec::new(),
            duration: Duration::ZERO,
            next_page_url: None,
            has_next_page: false,
        }
    }

    /// Record a valid listing.
    pub fn push_listing(&mut self, listing: Listing) {
        self.listings.push(listing);
        self.total_scraped += 1;
    }

    /// Record a rejected candidate.
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.error_count += 1;
    }

    /// Set the continuation URL for the next page.
    pub fn set_next_page(&mut self, url: impl Into<String>) {
        self.next_page_url = Some(url.into());
        self.has_next_page = true;
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
