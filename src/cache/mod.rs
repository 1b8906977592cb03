//! Cache Module
//!
//! Provides the in-memory key material cache with TTL expiration, LRU
//! eviction and statistics.

mod entry;
mod keycache;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp_ms, CacheEntry};
pub use keycache::KeyCache;
pub(crate) use keycache::WeakKeyCache;
pub use lru::LruTracker;
pub use stats::{CacheInfo, CacheStats, EntryInfo, MetricsCollector, ACCESS_TIME_ALPHA};
pub use store::{CacheStore, Lookup};

// == Public Constants ==
/// Maximum accepted key length in bytes on the admin API
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum accepted payload size in bytes on the admin API
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
