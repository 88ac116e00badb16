//! Provider error types.

use thiserror::Error;

pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Provider {provider} is not configured: set {credential}")]
    CredentialMissing {
        provider: String,
        credential: String,
    },

    #[error("Provider {provider} is rate limiting requests")]
    RateLimited {
        provider: String,
        retry_after_secs: Option<u64>,
    },

    #[error("Provider {provider} returned {status}: {message}")]
    Upstream {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProviderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn credential_missing(provider: impl Into<String>, credential: impl Into<String>) -> Self {
        Self::CredentialMissing {
            provider: provider.into(),
            credential: credential.into(),
        }
    }

    pub fn invalid_response(provider: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Safe to retry the same call later.
    ///
    /// A network failure says nothing about the job itself.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Network(_) | ProviderError::RateLimited { .. })
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, ProviderError::Network(_))
    }

    /// Stable machine-readable error kind, used in responses and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProviderError::Validation(_) => "validation_error",
            ProviderError::CredentialMissing { .. } => "credential_missing",
            ProviderError::RateLimited { .. } => "upstream_rate_limited",
            ProviderError::Upstream { .. } | ProviderError::InvalidResponse { .. } => {
                "upstream_error"
            }
            ProviderError::JobNotFound(_) => "not_found",
            ProviderError::Network(_) => "transient_network",
        }
    }

    /// Reinterpret an upstream 404 returned by a status query.
    pub(crate) fn not_found_for(self, job_id: &str) -> Self {
        match self {
            ProviderError::Upstream { status: 404, .. } => Self::JobNotFound(job_id.to_string()),
            other => other,
        }
    }
}
