//! Background Tasks Module
//!
//! Contains the long-lived tasks that run beside the cache.
//!
//! # Tasks
//! - Prefetch: refreshes entries nearing expiry off the lookup path
//! - TTL Cleanup: removes expired entries at configured intervals

mod cleanup;
mod prefetch;

pub use cleanup::spawn_cleanup_task;
pub use prefetch::PrefetchScheduler;
