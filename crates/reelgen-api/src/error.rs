//! API error types.
//!
//! Every failure leaves the server as `{success: false, error, code}`.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use reelgen_providers::ProviderError;
use reelgen_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Timeout(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Provider(e) => provider_status(e),
            ApiError::Storage(StorageError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Storage(StorageError::InvalidKey(_) | StorageError::InvalidValue(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound(_) => "not_found",
            ApiError::RateLimited => "rate_limited",
            ApiError::Internal(_) => "internal_error",
            ApiError::Timeout(_) => "transient_network",
            ApiError::Provider(e) => e.kind(),
            ApiError::Storage(StorageError::NotFound(_)) => "not_found",
            ApiError::Storage(StorageError::InvalidKey(_) | StorageError::InvalidValue(_)) => {
                "validation_error"
            }
            ApiError::Storage(_) => "internal_error",
        }
    }

    /// Whether the caller may retry the same request.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::RateLimited | ApiError::Timeout(_) => true,
            ApiError::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<u64> {
        match self {
            ApiError::RateLimited => Some(1),
            ApiError::Provider(ProviderError::RateLimited { retry_after_secs, .. }) => {
                *retry_after_secs
            }
            _ => None,
        }
    }

    fn is_internal(&self) -> bool {
        match self {
            ApiError::Internal(_) => true,
            ApiError::Storage(e) => !matches!(
                e,
                StorageError::NotFound(_) | StorageError::InvalidKey(_) | StorageError::InvalidValue(_)
            ),
            _ => false,
        }
    }
}

fn provider_status(e: &ProviderError) -> StatusCode {
    match e {
        ProviderError::Validation(_) => StatusCode::BAD_REQUEST,
        ProviderError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
        ProviderError::JobNotFound(_) => StatusCode::NOT_FOUND,
        ProviderError::CredentialMissing { .. }
        | ProviderError::Upstream { .. }
        | ProviderError::InvalidResponse { .. }
        | ProviderError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    retryable: bool,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        // Don't expose internal error details in production
        let error = if self.is_internal()
            && std::env::var("ENVIRONMENT").unwrap_or_default() == "production"
        {
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorResponse {
            success: false,
            error,
            code: self.code(),
            retryable: self.is_retryable(),
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = self.retry_after() {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
