//! Listing Extraction Library
//!
//! Turns real-estate listing pages into structured [`Listing`] records using
//! per-site CSS selector configuration.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use listing_extraction::{FetcherConfig, HttpFetcher, ListingScraper, SiteExtractor};
//!
//! let fetcher = Arc::new(HttpFetcher::new(FetcherConfig::default())?);
//! let scraper = SiteExtractor::build("rumah123", "rumah123", &selectors, fetcher)?
//!     .expect("supported extractor");
//!
//! let result = scraper.scrape("https://www.rumah123.com/jual/rumah/", &cancel).await?;
//! println!("{} listings, {} rejected", result.total_scraped, result.error_count);
//! ```
//!
//! # Modules
//!
//! - [`types`] - Listing, scrape result and selector configuration
//! - [`parse`] - Price, number, text and URL normalisation
//! - [`retry`] - Exponential backoff with cancellation
//! - [`fetch`] - Page fetching (HTTP with rate limiting)
//! - [`pipeline`] - Selector-driven extraction over one page
//! - [`sites`] - Site extractors and the [`ListingScraper`] capability
//! - [`testing`] - Mock implementations for testing

pub mod error;
pub mod fetch;
pub mod parse;
pub mod pipeline;
pub mod retry;
pub mod sites;
pub mod testing;
pub mod types;

// Re-export core types at crate root
pub use error::{ExtractionError, FetchError, ParseError, RecordError, RetryError};
pub use fetch::{FetchedPage, FetcherConfig, HttpFetcher, PageFetcher};
pub use pipeline::SelectorPipeline;
pub use retry::RetryPolicy;
pub use sites::{ListingScraper, Rumah123Scraper, SiteExtractor, SUPPORTED_EXTRACTORS};
pub use types::{
    listing::{AgentContact, Listing},
    result::ScrapeResult,
    selectors::{CompiledSelectors, SelectorConfig},
};
