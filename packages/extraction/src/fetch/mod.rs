//! Page fetching.
//!
//! [`PageFetcher`] is the seam between extraction and the network. The
//! production implementation is [`HttpFetcher`]; tests use
//! [`crate::testing::MockFetcher`].

pub mod http;

use async_trait::async_trait;

use crate::error::FetchResult;

pub use http::{FetcherConfig, HttpFetcher};

/// A fetched HTML page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn new(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: 200,
            body: body.into(),
        }
    }
}

/// Fetches one page at a time.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        (**self).fetch(url).await
    }
}
