//! API routes.

use std::sync::Arc;

use axum::error_handling::HandleErrorLayer;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::timeout::error::Elapsed;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;

use crate::error::ApiError;
use crate::handlers::collections::{
    add_collection_entry, create_collection, delete_collection, get_collection,
    list_collections, remove_collection_entry, rename_collection,
};
use crate::handlers::history::{
    clear_history, delete_history_entry, get_history_entry, list_history, record_history,
};
use crate::handlers::jobs::{job_status, submit_job};
use crate::handlers::providers::{list_providers, polling_config};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{
    cors_layer, rate_limit_middleware, request_id, request_logging, security_headers,
};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let job_routes = Router::new()
        .route("/jobs", post(submit_job))
        .route("/jobs/:job_id/status", get(job_status))
        .route("/providers", get(list_providers))
        .route("/config/polling", get(polling_config));

    let history_routes = Router::new()
        .route(
            "/history",
            get(list_history).post(record_history).delete(clear_history),
        )
        .route(
            "/history/:id",
            get(get_history_entry).delete(delete_history_entry),
        );

    let collection_routes = Router::new()
        .route("/collections", get(list_collections).post(create_collection))
        .route(
            "/collections/:id",
            get(get_collection)
                .patch(rename_collection)
                .delete(delete_collection),
        )
        .route(
            "/collections/:id/entries/:entry_id",
            post(add_collection_entry).delete(remove_collection_entry),
        );

    let timeout_ms = state.config.request_timeout.as_millis() as u64;

    let api_routes = Router::new()
        .merge(job_routes)
        .merge(history_routes)
        .merge(collection_routes)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.rate_limiter),
            rate_limit_middleware,
        ));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                    if err.is::<Elapsed>() {
                        ApiError::Timeout(timeout_ms)
                    } else {
                        ApiError::internal(err.to_string())
                    }
                }))
                .timeout(state.config.request_timeout),
        )
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
