//! Persisted listings: upsert by canonical URL and filtered queries.

pub mod models;
pub mod repository;

pub use models::filter::ListingFilter;
pub use repository::{ListingRepository, MemoryListingRepository, PostgresListingRepository};
