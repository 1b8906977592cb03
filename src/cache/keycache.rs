//! Key Cache Module
//!
//! Thread-safe handle over the cache store, the fetcher and the prefetch
//! worker. This is the API callers and the admin server use.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{CacheInfo, CacheStats, CacheStore};
use crate::config::CacheConfig;
use crate::error::{CacheError, FetchError, Result};
use crate::fetcher::{FetchedKey, KeyFetcher};
use crate::tasks::PrefetchScheduler;

struct Inner {
    store: Mutex<CacheStore>,
    config: CacheConfig,
    fetcher: Arc<dyn KeyFetcher>,
    prefetch: PrefetchScheduler,
}

// == Key Cache ==
/// Cloneable handle to one cache instance.
///
/// Every store operation, lookups included, runs under a single lock. The
/// lock is released before a prefetch is scheduled and is never held across
/// an `.await`.
#[derive(Clone)]
pub struct KeyCache {
    inner: Arc<Inner>,
}

/// Non-owning handle held by background tasks.
#[derive(Clone)]
pub(crate) struct WeakKeyCache(Weak<Inner>);

impl WeakKeyCache {
    pub(crate) fn upgrade(&self) -> Option<KeyCache> {
        self.0.upgrade().map(|inner| KeyCache { inner })
    }
}

impl KeyCache {
    // == Constructor ==
    /// Builds a cache after validating `config`.
    pub fn new(config: CacheConfig, fetcher: Arc<dyn KeyFetcher>) -> Result<Self> {
        let store = CacheStore::new(config.clone())?;

        Ok(Self {
            inner: Arc::new(Inner {
                store: Mutex::new(store),
                prefetch: PrefetchScheduler::new(config.prefetch_queue_size),
                config,
                fetcher,
            }),
        })
    }

    /// The configuration this cache was built with.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    // == Get ==
    /// Returns the live value for `key`, or `None` on a miss.
    ///
    /// A hit past the prefetch threshold schedules a background refresh
    /// when the worker is running.
    pub fn get(&self, key: &str) -> Option<String> {
        let lookup = self.inner.store.lock().get(key)?;
        if lookup.refresh_due {
            self.inner.prefetch.enqueue(key);
        }
        Some(lookup.value)
    }

    // == Put ==
    /// Stores `value` under `key`, replacing any previous entry.
    pub fn put(
        &self,
        key: &str,
        value: String,
        ttl_seconds: Option<u64>,
        etag: Option<String>,
        last_modified: Option<String>,
    ) {
        self.inner
            .store
            .lock()
            .put(key, value, ttl_seconds, etag, last_modified);
    }

    /// Removes `key`, returning whether it was cached.
    pub fn invalidate(&self, key: &str) -> bool {
        self.inner.store.lock().invalidate(key)
    }

    /// Removes every entry and returns how many were removed.
    pub fn clear(&self) -> usize {
        self.inner.store.lock().clear()
    }

    /// Eagerly removes expired entries and returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.inner.store.lock().cleanup_expired()
    }

    pub fn get_stats(&self) -> CacheStats {
        self.inner.store.lock().stats()
    }

    pub fn get_cache_info(&self) -> CacheInfo {
        self.inner.store.lock().info()
    }

    /// Zeroes hit/miss/eviction/error counters and the latency average.
    pub fn reset_stats(&self) {
        self.inner.store.lock().reset_stats();
    }

    pub fn len(&self) -> usize {
        self.inner.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.store.lock().is_empty()
    }

    // == Get Or Fetch ==
    /// Returns the cached value or fetches, caches and returns fresh material.
    ///
    /// A failed fetch is counted in `errors` and reported as
    /// [`CacheError::Fetch`]; nothing is cached in that case.
    pub async fn get_or_fetch(&self, key: &str) -> Result<String> {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        match self.fetch(key).await {
            Ok(fetched) => {
                let value = fetched.value.clone();
                self.put(
                    key,
                    fetched.value,
                    fetched.ttl_seconds,
                    fetched.etag,
                    fetched.last_modified,
                );
                debug!(key, "Cached freshly fetched key material");
                Ok(value)
            }
            Err(source) => {
                self.record_error();
                warn!(key, error = %source, "Fetch failed on cache miss");
                Err(CacheError::Fetch {
                    key: key.to_string(),
                    source,
                })
            }
        }
    }

    /// Like [`get_or_fetch`](Self::get_or_fetch) but reports "temporarily
    /// unable to serve" as `None`. Callers must fail closed on `None`.
    pub async fn resolve(&self, key: &str) -> Option<String> {
        self.get_or_fetch(key).await.ok()
    }

    // == Lifecycle ==
    /// Starts the prefetch worker. Must be called inside a tokio runtime.
    ///
    /// Returns `false` without spawning anything if it is already running.
    pub fn start(&self) -> bool {
        let started = self.inner.prefetch.start(self.downgrade(), &self.inner.config);
        if started {
            info!("Key cache prefetch worker started");
        }
        started
    }

    /// Stops the prefetch worker and waits for it to exit. Safe to call when
    /// it was never started, and safe to call repeatedly.
    pub async fn stop(&self) {
        self.inner.prefetch.stop().await;
    }

    /// Whether the prefetch worker is running.
    pub fn is_running(&self) -> bool {
        self.inner.prefetch.is_running()
    }

    /// Number of keys with a refresh queued or in progress.
    pub fn pending_prefetches(&self) -> usize {
        self.inner.prefetch.pending()
    }

    // == Crate Internals ==
    /// Calls the fetcher, bounded by the configured timeout.
    pub(crate) async fn fetch(&self, key: &str) -> std::result::Result<FetchedKey, FetchError> {
        let timeout = self.inner.config.fetch_timeout();
        tokio::time::timeout(timeout, self.inner.fetcher.fetch(key))
            .await
            .unwrap_or_else(|_| Err(FetchError::Timeout(timeout.as_secs())))
    }

    pub(crate) fn record_error(&self) {
        self.inner.store.lock().record_error();
    }

    pub(crate) fn downgrade(&self) -> WeakKeyCache {
        WeakKeyCache(Arc::downgrade(&self.inner))
    }
}
