//! Listing data types shared by the extractor and the worker.

pub mod listing;
pub mod result;
pub mod selectors;
