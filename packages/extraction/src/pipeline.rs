//! Selector-driven extraction of listings from one page.
//!
//! The pipeline fetches a page through the retry policy, runs the configured
//! selectors over every list item and turns each item into a [`Listing`] or a
//! counted error. It never follows pagination itself; the next-page link is
//! reported on the [`ScrapeResult`] for the caller.

use std::sync::Arc;
use std::time::Instant;

use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ExtractionError, RecordError, Result, RetryError};
use crate::fetch::PageFetcher;
use crate::parse::{clean_text, make_absolute_url, parse_float, parse_int, parse_price};
use crate::retry::RetryPolicy;
use crate::types::listing::Listing;
use crate::types::result::ScrapeResult;
use crate::types::selectors::{CompiledSelectors, SelectorConfig};

/// Extracts listings for one site.
#[derive(Clone)]
pub struct SelectorPipeline {
    site_name: String,
    selectors: Arc<CompiledSelectors>,
    fetcher: Arc<dyn PageFetcher>,
    retry: RetryPolicy,
}

impl std::fmt::Debug for SelectorPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectorPipeline")
            .field("site_name", &self.site_name)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl SelectorPipeline {
    /// Build a pipeline, compiling the selectors up front.
    pub fn new(
        site_name: impl Into<String>,
        selectors: &SelectorConfig,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self> {
        Ok(Self {
            site_name: site_name.into(),
            selectors: Arc::new(selectors.compile()?),
            fetcher,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn site_name(&self) -> &str {
        &self.site_name
    }

    /// Fetch `url` and extract every listing on it.
    pub async fn scrape(&self, url: &str, cancel: &CancellationToken) -> Result<ScrapeResult> {
        let seed = Url::parse(url).map_err(|_| ExtractionError::InvalidUrl {
            url: url.to_string(),
        })?;

        let started = Instant::now();
        info!(site = %self.site_name, url = %url, "Starting extraction");

        let page = self
            .retry
            .execute(cancel, || self.fetcher.fetch(seed.as_str()))
            .await
            .map_err(|e| match e {
                RetryError::Cancelled => ExtractionError::Cancelled,
                RetryError::Exhausted { attempts, source } => ExtractionError::FetchExhausted {
                    url: url.to_string(),
                    attempts,
                    source,
                },
            })?;

        // Resolve relative links against where the page actually came from.
        let page_url = Url::parse(&page.url).unwrap_or_else(|_| seed.clone());

        let mut result = ScrapeResult::new(&self.site_name, url);
        self.extract_page(&page.body, &page_url, &mut result);
        result.duration = started.elapsed();

        info!(
            site = %self.site_name,
            url = %url,
            found = result.total_found,
            scraped = result.total_scraped,
            errors = result.error_count,
            has_next_page = result.has_next_page,
            duration_ms = result.duration.as_millis() as u64,
            "Extraction finished"
        );

        Ok(result)
    }

    /// Run the selectors over an already-fetched document.
    pub fn extract_page(&self, html: &str, page_url: &Url, result: &mut ScrapeResult) {
        let document = Html::parse_document(html);
        let selectors = &*self.selectors;

        let candidates: Vec<ElementRef> = document.select(&selectors.list_item).collect();
        result.total_found = candidates.len();
        debug!(site = %self.site_name, candidates = candidates.len(), "Matched list items");

        for (index, item) in candidates.into_iter().enumerate() {
            match self.extract_listing(item, page_url) {
                Ok(listing) => result.push_listing(listing),
                Err(e) => {
                    warn!(site = %self.site_name, item = index, error = %e, "Skipping candidate");
                    result.push_error(format!("item {}: {}", index, e));
                }
            }
        }

        if let Some(next) = selectors
            .next_page
            .as_ref()
            .and_then(|sel| document.select(sel).next())
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| make_absolute_url(page_url, href))
        {
            result.set_next_page(next);
        }
    }

    fn extract_listing(
        &self,
        item: ElementRef<'_>,
        page_url: &Url,
    ) -> std::result::Result<Listing, RecordError> {
        let s = &*self.selectors;

        let title = text_of(item, &s.title).ok_or(RecordError::MissingField("title"))?;
        let price_text = text_of(item, &s.price).ok_or(RecordError::MissingField("price"))?;
        let location = text_of(item, &s.location).ok_or(RecordError::MissingField("location"))?;

        let url = item
            .select(&s.detail_url)
            .next()
            .and_then(|el| el.value().attr("href"))
            .or_else(|| item.value().attr("href"))
            .and_then(|href| make_absolute_url(page_url, href))
            .ok_or(RecordError::MissingField("detail URL"))?;

        let price = parse_price(&price_text)?;
        if price <= 0.0 {
            return Err(RecordError::NonPositivePrice(price));
        }

        let optional_text = |sel: &Option<Selector>| {
            sel.as_ref()
                .and_then(|sel| text_of(item, sel))
                .unwrap_or_default()
        };

        let mut listing = Listing::new(&self.site_name, url, title, price, location)
            .with_rooms(
                parse_int(&optional_text(&s.bedrooms)),
                parse_int(&optional_text(&s.bathrooms)),
            )
            .with_areas(
                parse_float(&optional_text(&s.land_area)),
                parse_float(&optional_text(&s.building_area)),
            )
            .with_description(optional_text(&s.description))
            .with_images(image_urls(item, s.images.as_ref(), page_url));

        let agent_name = optional_text(&s.agent_name);
        let agent_phone = optional_text(&s.agent_phone);
        if !agent_name.is_empty() || !agent_phone.is_empty() {
            listing = listing.with_agent(agent_name, agent_phone);
        }

        Ok(listing)
    }
}

/// Cleaned text of the first match under `item`, if non-empty.
fn text_of(item: ElementRef<'_>, selector: &Selector) -> Option<String> {
    item.select(selector)
        .next()
        .map(|el| clean_text(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

fn image_urls(item: ElementRef<'_>, selector: Option<&Selector>, page_url: &Url) -> Vec<String> {
    let Some(selector) = selector else {
        return Vec::new();
    };

    let mut images: Vec<String> = Vec::new();
    for el in item.select(selector) {
        let src = el
            .value()
            .attr("src")
            .filter(|s| !s.trim().is_empty())
            .or_else(|| el.value().attr("data-src"));
        if let Some(abs) = src.and_then(|s| make_absolute_url(page_url, s)) {
            if !images.contains(&abs) {
                images.push(abs);
            }
        }
    }
    images
}
