// Business domains
pub mod listings;
pub mod scraping;
