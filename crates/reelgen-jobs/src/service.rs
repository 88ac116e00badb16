//! Job submission and status queries.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use reelgen_models::{GenerationRequest, JobId, JobSnapshot, ProviderId};
use reelgen_providers::{ProviderAvailability, ProviderError, ProviderRegistry, ProviderResult};

use crate::metrics;
use crate::poller::StatusSource;

/// Stateless façade over the provider registry.
///
/// Holds no job records: `submit` starts remote work and `poll` reads it
/// back, so concurrent calls never interact.
#[derive(Clone)]
pub struct JobService {
    registry: ProviderRegistry,
}

impl JobService {
    pub fn new(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Start a generation job and return its handle.
    ///
    /// Validation and the credential gate run before any network call.
    /// Not idempotent.
    pub async fn submit(&self, request: &GenerationRequest) -> ProviderResult<JobId> {
        request.check().map_err(ProviderError::Validation)?;

        let provider_id = request.provider_id();
        let provider = self.registry.get(&provider_id)?;
        provider.validate(request)?;
        let credential = self.registry.credential_for(provider.as_ref())?;

        let start = Instant::now();
        let result = provider.create_job(request, credential.as_deref()).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(job_id) => {
                info!(provider = %provider_id, job_id = %job_id, "Job submitted");
                metrics::record_submission(provider_id.as_str(), "ok", elapsed);
            }
            Err(e) => {
                warn!(provider = %provider_id, error = %e, "Job submission failed");
                metrics::record_submission(provider_id.as_str(), e.kind(), elapsed);
            }
        }

        result
    }

    /// Query a job's normalized status. Pure read; safe to repeat.
    pub async fn poll(&self, job_id: &JobId, provider_id: &ProviderId) -> ProviderResult<JobSnapshot> {
        if job_id.is_empty() {
            return Err(ProviderError::validation("job id is required"));
        }

        let provider = self.registry.get(provider_id)?;
        let credential = self.registry.credential_for(provider.as_ref())?;

        let start = Instant::now();
        let result = provider.get_status(job_id, credential.as_deref()).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(snapshot) => metrics::record_poll(provider_id.as_str(), snapshot.status.as_str(), elapsed),
            Err(e) => {
                warn!(provider = %provider_id, job_id = %job_id, error = %e, "Status query failed");
                metrics::record_poll(provider_id.as_str(), e.kind(), elapsed);
            }
        }

        result
    }

    pub fn available(&self, provider_id: &ProviderId) -> bool {
        self.registry.available(provider_id)
    }

    pub fn providers(&self) -> Vec<ProviderAvailability> {
        self.registry.availability()
    }
}

#[async_trait]
impl StatusSource for JobService {
    async fn status(&self, job_id: &JobId, provider: &ProviderId) -> ProviderResult<JobSnapshot> {
        self.poll(job_id, provider).await
    }
}
