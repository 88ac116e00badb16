//! Generation history handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use reelgen_models::{HistoryEntry, HistoryId, JobId, JobStatus, ProviderId};

use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 500;

#[derive(Deserialize)]
pub struct ListHistoryQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
pub struct HistoryListResponse {
    pub success: bool,
    pub entries: Vec<HistoryEntry>,
}

#[derive(Serialize)]
pub struct HistoryEntryResponse {
    pub success: bool,
    pub entry: HistoryEntry,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub success: bool,
    pub deleted: usize,
}

/// Body of `POST /api/history`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RecordHistoryRequest {
    #[validate(length(min = 1, max = 512))]
    pub job_id: String,
    #[validate(length(min = 1, max = 64))]
    pub provider: String,
    #[validate(length(max = 4000))]
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub media_ref: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

pub async fn list_history(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListHistoryQuery>,
) -> ApiResult<Json<HistoryListResponse>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let entries = state.history.list(limit).await?;
    Ok(Json(HistoryListResponse {
        success: true,
        entries,
    }))
}

pub async fn record_history(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RecordHistoryRequest>,
) -> ApiResult<Json<HistoryEntryResponse>> {
    body.validate()
        .map_err(|e| ApiError::validation(e.to_string()))?;

    let mut entry = HistoryEntry::new(
        JobId::from_string(body.job_id.trim()),
        ProviderId::new(&body.provider),
        body.prompt.trim(),
    );
    entry.media_ref = body.media_ref.filter(|m| !m.trim().is_empty());
    entry.result = body.result.filter(|r| !r.trim().is_empty());
    if let Some(status) = body.status {
        entry.status = status;
    }

    state.history.record(&entry).await?;
    Ok(Json(HistoryEntryResponse {
        success: true,
        entry,
    }))
}

pub async fn get_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<HistoryEntryResponse>> {
    let entry = state
        .history
        .get(&HistoryId::from_string(id.clone()))
        .await?
        .ok_or_else(|| ApiError::not_found(format!("history entry {id}")))?;
    Ok(Json(HistoryEntryResponse {
        success: true,
        entry,
    }))
}

/// Deleting an entry that does not exist succeeds with `deleted: 0`.
pub async fn delete_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = state.history.delete(&HistoryId::from_string(id)).await?;
    Ok(Json(DeletedResponse {
        success: true,
        deleted: usize::from(deleted),
    }))
}

pub async fn clear_history(State(state): State<AppState>) -> ApiResult<Json<DeletedResponse>> {
    let deleted = state.history.clear().await?;
    Ok(Json(DeletedResponse {
        success: true,
        deleted,
    }))
}
