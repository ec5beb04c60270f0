//! Site extractors.
//!
//! Every supported site is one variant of [`SiteExtractor`]. Callers depend on
//! the [`ListingScraper`] capability and never on a concrete variant.

pub mod rumah123;

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::fetch::PageFetcher;
use crate::pipeline::SelectorPipeline;
use crate::types::result::ScrapeResult;
use crate::types::selectors::SelectorConfig;

pub use rumah123::Rumah123Scraper;

/// Extractor names accepted in site configuration.
pub const SUPPORTED_EXTRACTORS: &[&str] = &["rumah123", "generic"];

/// Scrapes one listing page for a site.
#[async_trait]
pub trait ListingScraper: Send + Sync {
    fn site_name(&self) -> &str;

    async fn scrape(&self, url: &str, cancel: &CancellationToken) -> Result<ScrapeResult>;
}

#[async_trait]
impl<T: ListingScraper + ?Sized> ListingScraper for Arc<T> {
    fn site_name(&self) -> &str {
        (**self).site_name()
    }

    async fn scrape(&self, url: &str, cancel: &CancellationToken) -> Result<ScrapeResult> {
        (**self).scrape(url, cancel).await
    }
}

/// The supported site extractors.
#[derive(Debug, Clone)]
pub enum SiteExtractor {
    Rumah123(Rumah123Scraper),
    /// Plain selector pipeline with no site-specific checks
    Generic(SelectorPipeline),
}

impl SiteExtractor {
    /// Build the extractor named `kind` for `site_name`.
    ///
    /// Returns `Ok(None)` when `kind` is not a supported extractor.
    pub fn build(
        kind: &str,
        site_name: &str,
        selectors: &SelectorConfig,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Option<Self>> {
        let extractor = match kind.to_ascii_lowercase().as_str() {
            "rumah123" => Self::Rumah123(Rumah123Scraper::new(site_name, selectors, fetcher)?),
            "generic" => Self::Generic(SelectorPipeline::new(site_name, selectors, fetcher)?),
            _ => return Ok(None),
        };
        Ok(Some(extractor))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Rumah123(_) => "rumah123",
            Self::Generic(_) => "generic",
        }
    }
}

#[async_trait]
impl ListingScraper for SiteExtractor {
    fn site_name(&self) -> &str {
        match self {
            Self::Rumah123(s) => s.site_name(),
            Self::Generic(p) => p.site_name(),
        }
    }

    async fn scrape(&self, url: &str, cancel: &CancellationToken) -> Result<ScrapeResult> {
        match self {
            Self::Rumah123(s) => s.scrape(url, cancel).await,
            Self::Generic(p) => p.scrape(url, cancel).await,
        }
    }
}
