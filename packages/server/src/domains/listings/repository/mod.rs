mod memory;
mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use listing_extraction::Listing;

use super::models::filter::ListingFilter;

pub use memory::MemoryListingRepository;
pub use postgres::PostgresListingRepository;

/// Storage for scraped listings, keyed by canonical URL.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Insert or update by `url`. An update keeps the stored `first_seen_at`
    /// and refreshes `scraped_at` and `updated_at`.
    async fn save(&self, listing: &Listing) -> Result<()>;

    async fn find_by_url(&self, url: &str) -> Result<Option<Listing>>;

    /// Matching listings, most recently scraped first.
    async fn find_all(&self, filter: &ListingFilter) -> Result<Vec<Listing>>;

    /// Number of matching listings, ignoring limit and offset.
    async fn count(&self, filter: &ListingFilter) -> Result<i64>;
}
