use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use listing_extraction::Listing;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::ListingRepository;
use crate::domains::listings::models::filter::ListingFilter;

/// In-memory listing store.
///
/// Useful for testing and development. Data is lost on restart.
#[derive(Default)]
pub struct MemoryListingRepository {
    listings: RwLock<HashMap<String, Listing>>,
    fail_urls: RwLock<HashSet<String>>,
}

impl MemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make saves of `url` fail.
    pub fn fail_on(self, url: impl Into<String>) -> Self {
        self.fail_urls
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into());
        self
    }

    pub fn len(&self) -> usize {
        self.listings.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn matching(&self, filter: &ListingFilter) -> Vec<Listing> {
        let listings = self.listings.read().unwrap_or_else(|e| e.into_inner());
        let mut found: Vec<Listing> = listings
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.scraped_at.cmp(&a.scraped_at).then_with(|| a.url.cmp(&b.url)));
        found
    }
}

#[async_trait]
impl ListingRepository for MemoryListingRepository {
    async fn save(&self, listing: &Listing) -> Result<()> {
        if self
            .fail_urls
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&listing.url)
        {
            bail!("write rejected for {}", listing.url);
        }

        let mut listings = self.listings.write().unwrap_or_else(|e| e.into_inner());
        let mut stored = listing.clone();
        if let Some(existing) = listings.get(&listing.url) {
            stored.first_seen_at = existing.first_seen_at;
            stored.updated_at = Utc::now();
        }
        listings.insert(stored.url.clone(), stored);
        Ok(())
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Listing>> {
        Ok(self
            .listings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(url)
            .cloned())
    }

    async fn find_all(&self, filter: &ListingFilter) -> Result<Vec<Listing>> {
        Ok(self
            .matching(filter)
            .into_iter()
            .skip(filter.offset() as usize)
            .take(filter.limit() as usize)
            .collect())
    }

    async fn count(&self, filter: &ListingFilter) -> Result<i64> {
        Ok(self.matching(filter).len() as i64)
    }
}
