//! Job submission and status handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use reelgen_models::{GenerationRequest, JobId, JobSnapshot, ProviderId};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub success: bool,
    pub job_id: JobId,
    pub provider: ProviderId,
}

/// Start a generation job.
pub async fn submit_job(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerationRequest>,
) -> ApiResult<Json<SubmitJobResponse>> {
    let job_id = state.jobs.submit(&request).await?;
    let provider = request.provider_id();

    info!(provider = %provider, job_id = %job_id, "Accepted generation job");

    Ok(Json(SubmitJobResponse {
        success: true,
        job_id,
        provider,
    }))
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub provider: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusResponse {
    pub success: bool,
    pub job_id: JobId,
    pub provider: ProviderId,
    #[serde(flatten)]
    pub snapshot: JobSnapshot,
}

/// Normalized status of a job.
///
/// A job that failed is still a successful request: `200` with
/// `status: "failed"`.
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> ApiResult<Json<JobStatusResponse>> {
    let provider = query
        .provider
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ProviderId::new)
        .ok_or_else(|| ApiError::validation("provider query parameter is required"))?;
    let job_id = JobId::from_string(job_id.trim());

    let snapshot = state.jobs.poll(&job_id, &provider).await?;

    Ok(Json(JobStatusResponse {
        success: true,
        job_id,
        provider,
        snapshot,
    }))
}
