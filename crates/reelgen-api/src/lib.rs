//! Axum HTTP API server.
//!
//! This crate provides:
//! - Job submission and status endpoints over the provider registry
//! - History and collection endpoints backed by the key-value store
//! - Uniform `{success, ...}` JSON envelope for every response
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, StorageBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
