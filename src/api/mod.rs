//! API Module
//!
//! HTTP handlers and routing for the admin REST API.
//!
//! # Endpoints
//! - `PUT /keys` / `DELETE /keys` - Store key material / clear the cache
//! - `GET /keys/:key` / `DELETE /keys/:key` - Lookup / invalidate
//! - `GET /keys/:key/resolve` - Lookup with fetch on miss
//! - `POST /cleanup` - Sweep expired entries
//! - `GET /stats` / `GET /info` - Statistics and diagnostics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
