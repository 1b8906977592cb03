//! Error types for the key cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Fetch Error Enum ==
/// Failure reported by (or on behalf of) a [`KeyFetcher`](crate::fetcher::KeyFetcher).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The origin answered with an error or could not be reached
    #[error("upstream error: {0}")]
    Upstream(String),

    /// The fetch did not complete in time
    #[error("fetch timed out after {0}s")]
    Timeout(u64),

    /// No origin is configured for this fetcher
    #[error("no upstream configured")]
    NotConfigured,
}

// == Cache Error Enum ==
/// Unified error type for the key cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid cache configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Cache miss whose fetch failed
    #[error("Fetch failed for key {key}: {source}")]
    Fetch {
        key: String,
        #[source]
        source: FetchError,
    },

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::Fetch { .. } => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the key cache.
pub type Result<T> = std::result::Result<T, CacheError>;
