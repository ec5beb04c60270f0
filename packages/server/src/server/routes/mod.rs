// HTTP routes
pub mod health;
pub mod listings;
pub mod scrape;

pub use health::*;
pub use listings::*;
pub use scrape::*;
