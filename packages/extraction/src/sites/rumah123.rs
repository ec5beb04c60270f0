//! rumah123.com extractor.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::{ExtractionError, Result};
use crate::fetch::PageFetcher;
use crate::pipeline::SelectorPipeline;
use crate::types::result::ScrapeResult;
use crate::types::selectors::SelectorConfig;

/// Selector pipeline plus anti-bot page detection.
///
/// rumah123 serves a challenge page that still matches the list-item selector
/// but has none of the listing fields. A page where every candidate was
/// rejected is therefore treated as a challenge, not as an empty result.
#[derive(Debug, Clone)]
pub struct Rumah123Scraper {
    pipeline: SelectorPipeline,
}

impl Rumah123Scraper {
    pub fn new(
        site_name: &str,
        selectors: &SelectorConfig,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self> {
        Ok(Self {
            pipeline: SelectorPipeline::new(site_name, selectors, fetcher)?,
        })
    }

    pub fn site_name(&self) -> &str {
        self.pipeline.site_name()
    }

    pub async fn scrape(&self, url: &str, cancel: &CancellationToken) -> Result<ScrapeResult> {
        let result = self.pipeline.scrape(url, cancel).await?;

        if result.listings.is_empty() {
            if result.error_count > 0 {
                error!(
                    url = %url,
                    errors = result.error_count,
                    "No listings extracted, page looks like a challenge"
                );
                return Err(ExtractionError::ChallengeDetected {
                    url: url.to_string(),
                });
            }
            warn!(url = %url, "No listings found on page");
        }

        Ok(result)
    }
}
