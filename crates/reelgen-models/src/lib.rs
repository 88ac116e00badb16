//! Shared data models for the reelgen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their normalized status
//! - Provider identifiers
//! - Job submission requests and their validation rules
//! - History entries and collections

pub mod history;
pub mod job;
pub mod job_status;
pub mod provider;
pub mod request;

// Re-export common types
pub use history::{Collection, CollectionId, HistoryEntry, HistoryId};
pub use job::{Job, JobId};
pub use job_status::{JobSnapshot, JobStatus};
pub use provider::ProviderId;
pub use request::{GenerationRequest, MAX_MEDIA_REF_LEN, MAX_PROMPT_LEN};
