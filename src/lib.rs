//! keycache - In-memory cache for remotely published key material
//!
//! Caches slowly-rotating key sets (such as signing-key documents) with TTL
//! expiration, LRU eviction and background prefetch ahead of expiry.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheInfo, CacheStats, EntryInfo, KeyCache};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, FetchError, Result};
pub use fetcher::{FetchedKey, KeyFetcher};
pub use tasks::spawn_cleanup_task;
