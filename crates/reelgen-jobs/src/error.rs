//! Poller error types.

use reelgen_providers::ProviderError;
use thiserror::Error;

pub type JobResult<T> = Result<T, JobError>;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Gave up after {count} consecutive network errors: {last}")]
    TooManyTransientErrors { count: u32, last: ProviderError },
}

impl JobError {
    pub fn kind(&self) -> &'static str {
        match self {
            JobError::Provider(e) => e.kind(),
            JobError::TooManyTransientErrors { .. } => "transient_network",
        }
    }
}
