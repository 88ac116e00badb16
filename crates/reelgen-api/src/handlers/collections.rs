//! Collection handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use reelgen_models::{Collection, CollectionId, HistoryId};

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CollectionNameRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Serialize)]
pub struct CollectionResponse {
    pub success: bool,
    pub collection: Collection,
}

#[derive(Serialize)]
pub struct CollectionListResponse {
    pub success: bool,
    pub collections: Vec<Collection>,
}

#[derive(Serialize)]
pub struct CollectionDeletedResponse {
    pub success: bool,
    pub deleted: bool,
}

fn respond(collection: Collection) -> Json<CollectionResponse> {
    Json(CollectionResponse {
        success: true,
        collection,
    })
}

pub async fn list_collections(
    State(state): State<AppState>,
) -> ApiResult<Json<CollectionListResponse>> {
    Ok(Json(CollectionListResponse {
        success: true,
        collections: state.collections.list().await?,
    }))
}

pub async fn create_collection(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CollectionNameRequest>,
) -> ApiResult<Json<CollectionResponse>> {
    Ok(respond(state.collections.create(&body.name).await?))
}

pub async fn get_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CollectionResponse>> {
    state
        .collections
        .get(&CollectionId::from_string(id.clone()))
        .await?
        .map(respond)
        .ok_or_else(|| ApiError::not_found(format!("collection {id}")))
}

pub async fn rename_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CollectionNameRequest>,
) -> ApiResult<Json<CollectionResponse>> {
    let collection = state
        .collections
        .rename(&CollectionId::from_string(id), &body.name)
        .await?;
    Ok(respond(collection))
}

pub async fn delete_collection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CollectionDeletedResponse>> {
    let deleted = state
        .collections
        .delete(&CollectionId::from_string(id))
        .await?;
    Ok(Json(CollectionDeletedResponse {
        success: true,
        deleted,
    }))
}

/// Add a history entry to a collection. The entry must exist.
pub async fn add_collection_entry(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(String, String)>,
) -> ApiResult<Json<CollectionResponse>> {
    let entry_id = HistoryId::from_string(entry_id);
    if state.history.get(&entry_id).await?.is_none() {
        return Err(ApiError::not_found(format!("history entry {entry_id}")));
    }
    let collection = state
        .collections
        .add_entry(&CollectionId::from_string(id), entry_id)
        .await?;
    Ok(respond(collection))
}

pub async fn remove_collection_entry(
    State(state): State<AppState>,
    Path((id, entry_id)): Path<(String, String)>,
) -> ApiResult<Json<CollectionResponse>> {
    let collection = state
        .collections
        .remove_entry(&CollectionId::from_string(id), &HistoryId::from_string(entry_id))
        .await?;
    Ok(respond(collection))
}
