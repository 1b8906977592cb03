//! API Routes
//!
//! Configures the Axum router with all admin endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cleanup_handler, clear_handler, get_handler, health_handler, info_handler,
    invalidate_handler, put_handler, resolve_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /keys` - Store key material
/// - `DELETE /keys` - Clear the cache
/// - `GET /keys/:key` - Cached lookup
/// - `DELETE /keys/:key` - Invalidate a key
/// - `GET /keys/:key/resolve` - Lookup, fetching from the origin on a miss
/// - `POST /cleanup` - Sweep expired entries
/// - `GET /stats` - Cache statistics
/// - `GET /info` - Statistics plus per-entry diagnostics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/keys", put(put_handler).delete(clear_handler))
        .route("/keys/:key", get(get_handler).delete(invalidate_handler))
        .route("/keys/:key/resolve", get(resolve_handler))
        .route("/cleanup", post(cleanup_handler))
        .route("/stats", get(stats_handler))
        .route("/info", get(info_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
