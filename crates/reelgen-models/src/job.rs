//! Generation job definitions.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{JobSnapshot, JobStatus, ProviderId};

/// Opaque, provider-assigned job handle.
///
/// No format is guaranteed across providers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Local mirror of a remote generation job.
///
/// The server never transitions a job itself; every field except `id`,
/// `provider` and `created_at` is overwritten from the latest poll.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    pub id: JobId,
    pub provider: ProviderId,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a freshly submitted job.
    pub fn new(id: JobId, provider: ProviderId) -> Self {
        Self {
            id,
            provider,
            status: JobStatus::Starting,
            result: None,
            error: None,
            progress: None,
            created_at: Utc::now(),
        }
    }

    /// Overwrite the mirrored state with a poll result.
    pub fn apply(&mut self, snapshot: JobSnapshot) {
        self.status = snapshot.status;
        self.result = snapshot.result;
        self.error = snapshot.error;
        self.progress = snapshot.progress;
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
