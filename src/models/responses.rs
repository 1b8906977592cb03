//! Response DTOs for the admin API
//!
//! Statistics and cache info are served directly from
//! [`CacheStats`](crate::cache::CacheStats) and
//! [`CacheInfo`](crate::cache::CacheInfo).

use serde::Serialize;

/// Response body for lookups (GET /keys/:key, GET /keys/:key/resolve)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    pub key: String,
    pub value: String,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for PUT /keys
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Success message
    pub message: String,
    /// The key that was stored
    pub key: String,
}

impl PutResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' stored successfully", key),
            key,
        }
    }
}

/// Response body for DELETE /keys/:key
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub key: String,
    /// Whether the key was cached
    pub removed: bool,
}

/// Response body for bulk removals (DELETE /keys, POST /cleanup)
#[derive(Debug, Clone, Serialize)]
pub struct RemovedResponse {
    /// Number of entries removed
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Whether the prefetch worker is running
    pub prefetch_running: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(prefetch_running: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            prefetch_running,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
