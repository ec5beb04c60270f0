//! Scrape orchestration: site registry and the extract, persist, notify workflow.

pub mod registry;
pub mod workflow;

pub use registry::ScraperRegistry;
pub use workflow::{ScrapeWorkflow, ScraperService, WorkflowError};
