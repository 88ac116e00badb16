//! Provider availability and polling configuration.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use reelgen_jobs::PollConfig;
use reelgen_providers::ProviderAvailability;

use crate::state::AppState;

#[derive(Serialize)]
pub struct ProvidersResponse {
    pub success: bool,
    pub providers: Vec<ProviderAvailability>,
}

/// List registered providers. Credentials are re-checked on every request.
pub async fn list_providers(State(state): State<AppState>) -> Json<ProvidersResponse> {
    Json(ProvidersResponse {
        success: true,
        providers: state.jobs.providers(),
    })
}

#[derive(Serialize)]
pub struct PollingConfigResponse {
    pub success: bool,
    #[serde(flatten)]
    pub config: PollConfig,
}

/// Polling policy clients should follow.
pub async fn polling_config(State(state): State<AppState>) -> Json<PollingConfigResponse> {
    Json(PollingConfigResponse {
        success: true,
        config: state.poll_config.clone(),
    })
}
