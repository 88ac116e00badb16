//! Normalized job status shared by every provider.
//!
//! Providers report progress in their own vocabulary; adapters map it onto
//! [`JobStatus`] and return a [`JobSnapshot`] per poll.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Provider-agnostic job status.
///
/// `Starting` and `Processing` are non-terminal. A caller may observe
/// `Processing` without ever seeing `Starting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the provider, work not yet started
    #[default]
    Starting,
    /// Provider is generating output
    Processing,
    /// Output is available
    Succeeded,
    /// Provider gave up on the job
    Failed,
    /// Job was canceled on the provider side
    #[serde(alias = "cancelled")]
    Canceled,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Starting => "starting",
            JobStatus::Processing => "processing",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Canceled => "canceled",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
        )
    }

    /// Whether moving from `self` to `next` is a forward transition.
    ///
    /// Terminal states only admit themselves, and `Processing` never goes
    /// back to `Starting`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match self {
            JobStatus::Starting => true,
            JobStatus::Processing => next != JobStatus::Starting,
            terminal => *terminal == next,
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized result of one status query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct JobSnapshot {
    pub status: JobStatus,
    /// Output URI once the job succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Provider error message if the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Progress percentage (0-100)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl JobSnapshot {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn with_result(mut self, result: impl Into<String>) -> Self {
        self.result = Some(result.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Set progress, clamped to 100.
    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }

    /// Apply the error tie-break: an error reported alongside a non-terminal
    /// status means the job failed.
    pub fn resolve_error_precedence(mut self) -> Self {
        let has_error = self
            .error
            .as_deref()
            .map(|e| !e.trim().is_empty())
            .unwrap_or(false);
        if has_error && !self.status.is_terminal() {
            self.status = JobStatus::Failed;
        }
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobStatus; 5] = [
        JobStatus::Starting,
        JobStatus::Processing,
        JobStatus::Succeeded,
        JobStatus::Failed,
        JobStatus::Canceled,
    ];

    #[test]
    fn test_terminal_states() {
        assert!(!JobStatus::Starting.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
    }

    #[test]
    fn test_terminal_states_never_leave() {
        for from in ALL.iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert_eq!(from.can_transition_to(to), *from == to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_processing_does_not_go_back() {
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Starting));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Succeeded));
        assert!(JobStatus::Starting.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Starting.can_transition_to(JobStatus::Canceled));
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(serde_json::to_string(&JobStatus::Canceled).unwrap(), "\"canceled\"");
        let parsed: JobStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, JobStatus::Canceled);
    }

    #[test]
    fn test_error_takes_precedence_over_non_terminal() {
        let snap = JobSnapshot::new(JobStatus::Processing)
            .with_error("out of credits")
            .resolve_error_precedence();
        assert_eq!(snap.status, JobStatus::Failed);
        assert_eq!(snap.error.as_deref(), Some("out of credits"));
    }

    #[test]
    fn test_blank_error_is_ignored() {
        let snap = JobSnapshot::new(JobStatus::Starting)
            .with_error("  ")
            .resolve_error_precedence();
        assert_eq!(snap.status, JobStatus::Starting);
    }

    #[test]
    fn test_progress_clamped() {
        let snap = JobSnapshot::new(JobStatus::Processing).with_progress(250);
        assert_eq!(snap.progress, Some(100));
    }
}
