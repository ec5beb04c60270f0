//! Scheduled scrape jobs.
//!
//! - [`JobScheduler`] owns one cron job per site and tracks in-flight runs
//! - [`JobRunner`] runs a single firing under the local and distributed guards
//! - [`JobRunOutcome`] records what a run did

pub mod definition;
pub mod outcome;
pub mod runner;
pub mod scheduler;

pub use definition::JobDefinition;
pub use outcome::{JobRunOutcome, JobStatus};
pub use runner::{FireOutcome, JobRunner, JobRunnerConfig, JobSlot};
pub use scheduler::{JobScheduler, TriggerError};
