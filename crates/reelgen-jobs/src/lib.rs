//! Asynchronous job submission and polling.
//!
//! This crate provides:
//! - [`JobService`]: submit a job to a provider and query its status
//! - [`Poller`]: caller-side loop that waits for a terminal state
//! - Job metrics

pub mod error;
pub mod metrics;
pub mod poller;
pub mod service;

pub use error::{JobError, JobResult};
pub use poller::{PollConfig, PollOutcome, Poller, StatusSource};
pub use service::JobService;
