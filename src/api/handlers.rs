//! API Handlers
//!
//! HTTP request handlers for each admin endpoint. Every handler is a thin
//! wrapper over one [`KeyCache`] operation.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{CacheInfo, CacheStats, KeyCache};
use crate::error::{CacheError, Result};
use crate::models::{
    GetResponse, HealthResponse, InvalidateResponse, PutRequest, PutResponse, RemovedResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cache; cloning shares the same instance
    pub cache: KeyCache,
}

impl AppState {
    pub fn new(cache: KeyCache) -> Self {
        Self { cache }
    }
}

/// Handler for PUT /keys
///
/// Stores key material with optional TTL and validators.
pub async fn put_handler(
    State(state): State<AppState>,
    Json(req): Json<PutRequest>,
) -> Result<Json<PutResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state
        .cache
        .put(&req.key, req.value, req.ttl, req.etag, req.last_modified);

    Ok(Json(PutResponse::new(req.key)))
}

/// Handler for GET /keys/:key
///
/// Returns the cached value, 404 on a miss.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .get(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /keys/:key/resolve
///
/// Returns the cached value, fetching it from the origin on a miss.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state.cache.get_or_fetch(&key).await?;
    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /keys/:key
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate(&key);
    Json(InvalidateResponse { key, removed })
}

/// Handler for DELETE /keys
pub async fn clear_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    Json(RemovedResponse {
        removed: state.cache.clear(),
    })
}

/// Handler for POST /cleanup
pub async fn cleanup_handler(State(state): State<AppState>) -> Json<RemovedResponse> {
    Json(RemovedResponse {
        removed: state.cache.cleanup_expired(),
    })
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    Json(state.cache.get_stats())
}

/// Handler for GET /info
pub async fn info_handler(State(state): State<AppState>) -> Json<CacheInfo> {
    Json(state.cache.get_cache_info())
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.cache.is_running()))
}
