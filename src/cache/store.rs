//! Cache Store Module
//!
//! Cache engine combining HashMap storage with LRU tracking and TTL expiration.
//! The store is single-threaded; [`KeyCache`](crate::cache::KeyCache) puts it
//! behind a lock.

use std::collections::HashMap;
use std::time::Instant;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, CacheInfo, CacheStats, EntryInfo, LruTracker, MetricsCollector};
use crate::config::CacheConfig;
use crate::error::Result;

// == Lookup ==
/// A live hit returned by [`CacheStore::get`].
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// The cached payload
    pub value: String,
    /// Whether enough of the entry's TTL has elapsed to schedule a refresh
    pub refresh_due: bool,
}

// == Cache Store ==
/// Capacity-bounded storage with LRU eviction and TTL support.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// LRU access tracker
    lru: LruTracker,
    /// Performance counters
    metrics: MetricsCollector,
    /// Bytes held by keys, payloads and validators
    total_size_bytes: usize,
    config: CacheConfig,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a new store, rejecting an inconsistent `config`.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            metrics: MetricsCollector::new(),
            total_size_bytes: 0,
            config,
        })
    }

    // == Put ==
    /// Stores a payload, replacing any existing entry for `key`.
    ///
    /// The requested TTL (or the default) is clamped into the configured
    /// bounds. Least recently used entries are evicted until the store is
    /// back within capacity.
    pub fn put(
        &mut self,
        key: &str,
        value: String,
        ttl_seconds: Option<u64>,
        etag: Option<String>,
        last_modified: Option<String>,
    ) {
        let ttl = self.config.effective_ttl(ttl_seconds);
        let entry = CacheEntry::new(value, ttl, etag, last_modified);

        self.remove_entry(key);
        self.total_size_bytes += key.len() + entry.payload_size();
        self.entries.insert(key.to_string(), entry);
        self.lru.touch(key);

        while self.entries.len() > self.config.max_size {
            let Some(oldest) = self.lru.evict_oldest() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.total_size_bytes -= oldest.len() + evicted.payload_size();
                self.metrics.record_eviction();
            }
        }
    }

    // == Get ==
    /// Looks up a live entry.
    ///
    /// An expired entry is removed and counted as a miss without touching its
    /// access metadata; that removal is not a capacity eviction.
    pub fn get(&mut self, key: &str) -> Option<Lookup> {
        let started = Instant::now();
        let now = current_timestamp_ms();

        let threshold = self.config.prefetch_threshold;
        let result = match self.entries.get(key).map(|entry| entry.is_expired_at(now)) {
            None => {
                self.metrics.record_miss();
                None
            }
            Some(true) => {
                self.remove_entry(key);
                self.metrics.record_miss();
                None
            }
            Some(false) => {
                let lookup = self.entries.get_mut(key).map(|entry| {
                    entry.record_access(now);
                    Lookup {
                        value: entry.value.clone(),
                        refresh_due: entry.needs_refresh(now, threshold),
                    }
                });
                self.lru.touch(key);
                self.metrics.record_hit();
                lookup
            }
        };

        self.metrics
            .record_access_time(started.elapsed().as_secs_f64() * 1000.0);
        result
    }

    // == Invalidate ==
    /// Removes an entry, returning whether it was present.
    pub fn invalidate(&mut self, key: &str) -> bool {
        self.remove_entry(key).is_some()
    }

    // == Clear ==
    /// Removes every entry and returns how many there were.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.lru.clear();
        self.total_size_bytes = 0;
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries and returns how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.remove_entry(key);
        }
        expired_keys.len()
    }

    // == Metrics ==
    /// Counts a failed fetch or prefetch.
    pub fn record_error(&mut self) {
        self.metrics.record_error();
    }

    /// Zeroes the counters. Entries are kept.
    pub fn reset_stats(&mut self) {
        self.metrics.reset();
    }

    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.metrics
            .snapshot(self.entries.len(), self.total_size_bytes)
    }

    /// Returns statistics plus per-entry diagnostics, least recently used
    /// first.
    pub fn info(&self) -> CacheInfo {
        let now = current_timestamp_ms();
        let entries = self
            .lru
            .iter()
            .filter_map(|key| {
                self.entries
                    .get(key)
                    .map(|entry| EntryInfo::describe(key, entry, now))
            })
            .collect();

        CacheInfo {
            stats: self.stats(),
            entries,
        }
    }

    /// Returns the entry for `key` without affecting recency or counters.
    pub fn peek(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.lru.remove(key);
        self.total_size_bytes -= key.len() + entry.payload_size();
        Some(entry)
    }
}
