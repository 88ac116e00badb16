//! The provider interface.

use async_trait::async_trait;

use reelgen_models::{GenerationRequest, JobId, JobSnapshot, ProviderId};

use crate::error::{ProviderError, ProviderResult};

/// A generation backend that runs long jobs remotely.
///
/// Implementations hold no per-job state: `create_job` starts remote work and
/// returns its handle, `get_status` is a pure read of the remote state.
/// Credentials are passed per call since they may change at runtime.
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Registry key of this provider.
    fn id(&self) -> ProviderId;

    /// Name of the credential this provider needs, `None` if it needs none.
    fn credential_name(&self) -> Option<&'static str> {
        None
    }

    /// Whether a reference media URI is mandatory.
    fn requires_media_ref(&self) -> bool {
        false
    }

    /// Check the request carries what this provider needs.
    ///
    /// Called before any network traffic.
    fn validate(&self, request: &GenerationRequest) -> ProviderResult<()> {
        if request.prompt().is_empty() {
            return Err(ProviderError::validation("prompt is required"));
        }
        if self.requires_media_ref() && request.media_ref().is_none() {
            return Err(ProviderError::validation(format!(
                "mediaRef is required for provider {}",
                self.id()
            )));
        }
        Ok(())
    }

    /// Start a job. Not idempotent: every call creates a new remote job.
    async fn create_job(
        &self,
        request: &GenerationRequest,
        credential: Option<&str>,
    ) -> ProviderResult<JobId>;

    /// Query the job and normalize the answer.
    async fn get_status(&self, job_id: &JobId, credential: Option<&str>)
        -> ProviderResult<JobSnapshot>;
}

/// Unwrap a credential the registry should already have checked.
pub(crate) fn require_credential<'a>(
    provider: &dyn VideoProvider,
    credential: Option<&'a str>,
) -> ProviderResult<&'a str> {
    match credential {
        Some(c) if !c.trim().is_empty() => Ok(c),
        _ => Err(ProviderError::credential_missing(
            provider.id().as_str(),
            provider.credential_name().unwrap_or("credential"),
        )),
    }
}
