//! Cache Statistics Module
//!
//! Tracks hit/miss/eviction/error counters and a smoothed access latency.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::entry::CacheEntry;

/// Smoothing factor for the access-time moving average.
pub const ACCESS_TIME_ALPHA: f64 = 0.1;

// == Metrics Collector ==
/// Monotonic counters owned by the cache store.
///
/// Counters only move forward; [`MetricsCollector::reset`] is the single
/// way to bring them back to zero.
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector {
    hits: u64,
    misses: u64,
    evictions: u64,
    errors: u64,
    avg_access_time_ms: f64,
    access_samples: u64,
}

impl MetricsCollector {
    // == Constructor ==
    /// Creates a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    /// Increments the miss counter (absent or expired key).
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    /// Increments the capacity eviction counter.
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    /// Increments the fetch/prefetch failure counter.
    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    // == Record Access Time ==
    /// Folds one lookup duration into the exponential moving average.
    ///
    /// The first sample seeds the average directly.
    pub fn record_access_time(&mut self, elapsed_ms: f64) {
        if self.access_samples == 0 {
            self.avg_access_time_ms = elapsed_ms;
        } else {
            self.avg_access_time_ms = ACCESS_TIME_ALPHA * elapsed_ms
                + (1.0 - ACCESS_TIME_ALPHA) * self.avg_access_time_ms;
        }
        self.access_samples += 1;
    }

    // == Reset ==
    /// Zeroes every counter and the moving average.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // == Snapshot ==
    /// Builds a point-in-time [`CacheStats`] for the given store totals.
    pub fn snapshot(&self, total_entries: usize, total_size_bytes: usize) -> CacheStats {
        let observed = self.hits + self.misses;
        let hit_rate = if observed == 0 {
            0.0
        } else {
            self.hits as f64 / observed as f64
        };

        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            errors: self.errors,
            total_entries,
            total_size_bytes,
            avg_access_time_ms: self.avg_access_time_ms,
            hit_rate,
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of cache performance.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of live lookups
    pub hits: u64,
    /// Number of lookups on absent or expired keys
    pub misses: u64,
    /// Number of entries removed to respect capacity
    pub evictions: u64,
    /// Number of failed fetches and prefetches
    pub errors: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Bytes held by keys, payloads and validators
    pub total_size_bytes: usize,
    /// Smoothed lookup latency in milliseconds
    pub avg_access_time_ms: f64,
    /// hits / (hits + misses), 0 with no lookups
    pub hit_rate: f64,
}

// == Entry Info ==
/// Diagnostic view of one cached entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Seconds since the entry was created
    pub age_seconds: f64,
    /// Seconds until the entry expires, zero once expired
    pub ttl_remaining_seconds: f64,
    pub access_count: u64,
    pub last_accessed: DateTime<Utc>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl EntryInfo {
    /// Describes `entry` as observed at `now` (Unix milliseconds).
    pub fn describe(key: &str, entry: &CacheEntry, now: u64) -> Self {
        Self {
            key: key.to_string(),
            created_at: datetime_from_ms(entry.created_at),
            expires_at: datetime_from_ms(entry.expires_at),
            age_seconds: now.saturating_sub(entry.created_at) as f64 / 1000.0,
            ttl_remaining_seconds: entry.ttl_remaining_ms(now) as f64 / 1000.0,
            access_count: entry.access_count,
            last_accessed: datetime_from_ms(entry.last_accessed),
            etag: entry.etag.clone(),
            last_modified: entry.last_modified.clone(),
        }
    }
}

// == Cache Info ==
/// Statistics plus per-entry diagnostics, entries ordered least to most
/// recently used.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    #[serde(flatten)]
    pub stats: CacheStats,
    pub entries: Vec<EntryInfo>,
}

fn datetime_from_ms(ms: u64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(ms as i64).unwrap_or_default()
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = MetricsCollector::new().snapshot(0, 0);
        assert_eq!(stats, CacheStats::default());
    }

    #[test]
    fn test_hit_rate_no_requests() {
        let stats = MetricsCollector::new().snapshot(0, 0);
        assert_eq!(stats.hit_rate, 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        let mut metrics = MetricsCollector::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        assert_eq!(metrics.snapshot(0, 0).hit_rate, 1.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut metrics = MetricsCollector::new();
        metrics.record_hit();
        metrics.record_miss();
        assert_eq!(metrics.snapshot(0, 0).hit_rate, 0.5);
    }

    #[test]
    fn test_record_eviction_and_error() {
        let mut metrics = MetricsCollector::new();
        metrics.record_eviction();
        metrics.record_eviction();
        metrics.record_error();

        let stats = metrics.snapshot(3, 42);
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.total_entries, 3);
        assert_eq!(stats.total_size_bytes, 42);
    }

    #[test]
    fn test_first_access_time_seeds_average() {
        let mut metrics = MetricsCollector::new();
        metrics.record_access_time(4.0);
        assert_eq!(metrics.snapshot(0, 0).avg_access_time_ms, 4.0);
    }

    #[test]
    fn test_access_time_moving_average() {
        let mut metrics = MetricsCollector::new();
        metrics.record_access_time(10.0);
        metrics.record_access_time(20.0);

        let avg = metrics.snapshot(0, 0).avg_access_time_ms;
        assert!((avg - 11.0).abs() < 1e-9, "unexpected average {avg}");
    }

    #[test]
    fn test_entry_info_describe() {
        let mut entry = CacheEntry::new("payload".to_string(), 60, Some("v1".to_string()), None);
        entry.created_at = 1_700_000_000_000;
        entry.expires_at = 1_700_000_060_000;
        entry.last_accessed = 1_700_000_030_000;
        entry.access_count = 4;

        let info = EntryInfo::describe("issuer", &entry, 1_700_000_030_500);
        assert_eq!(info.key, "issuer");
        assert_eq!(info.age_seconds, 30.5);
        assert_eq!(info.ttl_remaining_seconds, 29.5);
        assert_eq!(info.access_count, 4);
        assert_eq!(info.created_at.timestamp(), 1_700_000_000);
        assert_eq!(info.expires_at.timestamp(), 1_700_000_060);
        assert_eq!(info.last_accessed.timestamp(), 1_700_000_030);
        assert_eq!(info.etag.as_deref(), Some("v1"));
    }

    #[test]
    fn test_reset() {
        let mut metrics = MetricsCollector::new();
        metrics.record_hit();
        metrics.record_miss();
        metrics.record_access_time(1.0);
        metrics.reset();

        assert_eq!(metrics.snapshot(0, 0), CacheStats::default());
    }
}
