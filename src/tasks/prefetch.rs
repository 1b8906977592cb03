//! Prefetch Task
//!
//! Background worker that refreshes entries nearing expiry so lookups keep
//! hitting while the origin is slow or briefly unavailable.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{KeyCache, WeakKeyCache};
use crate::config::CacheConfig;

/// One worker run. Each run owns its pending set, so a stopping worker never
/// touches the marks of the next one.
struct Running {
    queue: mpsc::Sender<String>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

// == Prefetch Scheduler ==
/// Owns the refresh queue and the single worker draining it.
///
/// The queue behaves as a set: a key already queued or being refreshed is
/// not queued again, so at most one refresh per key is pending.
pub struct PrefetchScheduler {
    queue_size: usize,
    running: Mutex<Option<Running>>,
    /// Serializes `stop` so a second caller waits for the first join.
    stopping: tokio::sync::Mutex<()>,
}

impl PrefetchScheduler {
    pub fn new(queue_size: usize) -> Self {
        Self {
            queue_size,
            running: Mutex::new(None),
            stopping: tokio::sync::Mutex::new(()),
        }
    }

    // == Start ==
    /// Spawns the worker. Returns `false` if one is already running.
    pub(crate) fn start(&self, cache: WeakKeyCache, config: &CacheConfig) -> bool {
        let mut running = self.running.lock();
        if running.is_some() {
            warn!("Prefetch worker already running; start ignored");
            return false;
        }

        let (queue_tx, queue_rx) = mpsc::channel(self.queue_size);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let handle = tokio::spawn(run_worker(
            cache,
            queue_rx,
            shutdown_rx,
            in_flight.clone(),
            config.prefetch_poll_interval(),
        ));

        *running = Some(Running {
            queue: queue_tx,
            in_flight,
            shutdown: shutdown_tx,
            handle,
        });
        true
    }

    // == Stop ==
    /// Signals the worker and waits for it to exit.
    pub async fn stop(&self) {
        let _guard = self.stopping.lock().await;

        let running = self.running.lock().take();
        let Some(Running {
            queue,
            shutdown,
            handle,
            ..
        }) = running
        else {
            debug!("Prefetch worker not running; stop is a no-op");
            return;
        };

        let _ = shutdown.send(true);
        drop(queue);

        if let Err(err) = handle.await {
            warn!(error = %err, "Prefetch worker ended abnormally");
        }
        info!("Prefetch worker stopped");
    }

    // == Enqueue ==
    /// Queues a refresh for `key` without blocking.
    ///
    /// Returns whether a request was queued. Nothing is queued when the
    /// worker is stopped, when `key` is already pending, or when the queue
    /// is full.
    pub fn enqueue(&self, key: &str) -> bool {
        let state = self.running.lock();
        let Some(running) = state.as_ref() else {
            return false;
        };

        let mut in_flight = running.in_flight.lock();
        if !in_flight.insert(key.to_string()) {
            return false;
        }

        match running.queue.try_send(key.to_string()) {
            Ok(()) => {
                debug!(key, "Queued prefetch");
                true
            }
            Err(TrySendError::Full(_)) => {
                in_flight.remove(key);
                warn!(key, "Prefetch queue full; dropping refresh");
                false
            }
            Err(TrySendError::Closed(_)) => {
                in_flight.remove(key);
                false
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.lock().is_some()
    }

    /// Number of keys queued or being refreshed by the current worker.
    pub fn pending(&self) -> usize {
        self.running
            .lock()
            .as_ref()
            .map_or(0, |running| running.in_flight.lock().len())
    }
}

// == Worker ==
async fn run_worker(
    cache: WeakKeyCache,
    mut queue: mpsc::Receiver<String>,
    mut shutdown: watch::Receiver<bool>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    poll_interval: Duration,
) {
    debug!(
        "Prefetch worker polling every {} ms",
        poll_interval.as_millis()
    );

    loop {
        let key = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            next = tokio::time::timeout(poll_interval, queue.recv()) => match next {
                Ok(Some(key)) => key,
                Ok(None) => break,
                Err(_) => continue,
            },
        };

        let Some(cache) = cache.upgrade() else {
            break;
        };

        tokio::select! {
            biased;
            _ = shutdown.changed() => {
                in_flight.lock().remove(&key);
                break;
            }
            _ = refresh(&cache, &key) => {}
        }
        in_flight.lock().remove(&key);
    }
}

/// Fetches `key` and writes it back through the public API.
///
/// A failure leaves the current entry in place until it expires.
async fn refresh(cache: &KeyCache, key: &str) {
    match cache.fetch(key).await {
        Ok(fetched) => {
            cache.put(
                key,
                fetched.value,
                fetched.ttl_seconds,
                fetched.etag,
                fetched.last_modified,
            );
            debug!(key, "Prefetch refreshed entry");
        }
        Err(err) => {
            cache.record_error();
            warn!(key, error = %err, "Prefetch failed; keeping current entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tokio::sync::Notify;

    use crate::error::FetchError;
    use crate::fetcher::{FetchedKey, KeyFetcher};

    fn prefetch_config() -> CacheConfig {
        CacheConfig::default()
            .ttl_bounds(60, 1, 3600)
            .prefetch_threshold(0.001)
            .poll_interval(Duration::from_millis(20))
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..100 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("condition not met within 2s");
    }

    #[tokio::test]
    async fn test_prefetch_refreshes_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let fetcher: Arc<dyn KeyFetcher> = Arc::new(move |key: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            async move { Ok::<_, FetchError>(FetchedKey::new(format!("fresh:{key}")).with_etag("v2")) }
        });
        let cache = KeyCache::new(prefetch_config(), fetcher).unwrap();
        cache.start();

        cache.put("issuer", "stale".to_string(), Some(60), None, None);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(cache.get("issuer"), Some("stale".to_string()));

        wait_until(|| cache.get_cache_info().entries[0].etag.is_some()).await;

        assert_eq!(cache.get("issuer"), Some("fresh:issuer".to_string()));
        assert!(calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(cache.get_stats().errors, 0);
        cache.stop().await;
    }

    #[tokio::test]
    async fn test_prefetch_failure_keeps_entry() {
        let fetcher: Arc<dyn KeyFetcher> = Arc::new(|_key: String| async move {
            Err::<FetchedKey, _>(FetchError::Upstream("503".to_string()))
        });
        let cache = KeyCache::new(prefetch_config(), fetcher).unwrap();
        cache.start();

        cache.put("issuer", "current".to_string(), Some(60), None, None);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(cache.get("issuer").is_some());

        wait_until(|| cache.get_stats().errors >= 1).await;

        assert_eq!(cache.get("issuer"), Some("current".to_string()));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_stats().evictions, 0);
        cache.stop().await;
    }

    #[tokio::test]
    async fn test_at_most_one_pending_prefetch_per_key() {
        let release = Arc::new(Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (gate, counter) = (release.clone(), calls.clone());
        let fetcher: Arc<dyn KeyFetcher> = Arc::new(move |_key: String| {
            counter.fetch_add(1, Ordering::SeqCst);
            let gate = gate.clone();
            async move {
                gate.notified().await;
                Ok::<_, FetchError>(FetchedKey::new("fresh"))
            }
        });
        let cache = KeyCache::new(prefetch_config(), fetcher).unwrap();
        cache.start();

        cache.put("issuer", "v".to_string(), Some(60), None, None);
        tokio::time::sleep(Duration::from_millis(100)).await;

        for _ in 0..50 {
            assert!(cache.get("issuer").is_some());
            assert!(cache.pending_prefetches() <= 1);
        }
        wait_until(|| calls.load(Ordering::SeqCst) == 1).await;
        for _ in 0..50 {
            cache.get("issuer");
        }

        assert_eq!(cache.pending_prefetches(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        cache.stop().await;
        assert_eq!(cache.pending_prefetches(), 0);
        release.notify_waiters();
    }

    #[tokio::test]
    async fn test_full_queue_drops_request() {
        let scheduler = PrefetchScheduler::new(1);
        let fetcher: Arc<dyn KeyFetcher> = Arc::new(|_key: String| async move {
            std::future::pending::<Result<FetchedKey, FetchError>>().await
        });
        let cache = KeyCache::new(prefetch_config(), fetcher).unwrap();

        // The current-thread test runtime does not poll the worker before the
        // first await, so the queue fills deterministically.
        assert!(scheduler.start(cache.downgrade(), cache.config()));
        assert!(scheduler.enqueue("a"));
        assert!(!scheduler.enqueue("a"), "duplicate key is not queued");
        assert!(!scheduler.enqueue("b"), "full queue drops the request");
        assert_eq!(scheduler.pending(), 1);

        scheduler.stop().await;
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_stop_waits_for_worker_exit() {
        let scheduler = PrefetchScheduler::new(4);
        let fetcher: Arc<dyn KeyFetcher> =
            Arc::new(|_key: String| async move { Ok::<_, FetchError>(FetchedKey::new("v")) });
        let cache = KeyCache::new(prefetch_config(), fetcher).unwrap();

        assert!(scheduler.start(cache.downgrade(), cache.config()));
        assert!(scheduler.is_running());

        scheduler.stop().await;
        assert!(!scheduler.is_running());
        assert!(!scheduler.enqueue("k"), "stopped scheduler accepts nothing");

        scheduler.stop().await;
    }

    #[tokio::test]
    async fn test_restart_during_stop_keeps_new_pending_marks() {
        let scheduler = PrefetchScheduler::new(4);
        let fetcher: Arc<dyn KeyFetcher> = Arc::new(|_key: String| async move {
            std::future::pending::<Result<FetchedKey, FetchError>>().await
        });
        let cache = KeyCache::new(prefetch_config(), fetcher).unwrap();

        assert!(scheduler.start(cache.downgrade(), cache.config()));
        assert!(scheduler.enqueue("a"));

        // Poll stop once: the first worker is signalled but not yet joined.
        let stop = scheduler.stop();
        tokio::pin!(stop);
        tokio::select! {
            biased;
            _ = &mut stop => panic!("worker joined before it was polled"),
            _ = std::future::ready(()) => {}
        }
        assert!(!scheduler.is_running());

        assert!(scheduler.start(cache.downgrade(), cache.config()));
        assert!(scheduler.enqueue("b"));
        stop.await;

        assert!(scheduler.is_running());
        assert_eq!(scheduler.pending(), 1);
        assert!(!scheduler.enqueue("b"), "mark from the new worker survives");

        scheduler.stop().await;
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test]
    async fn test_worker_exits_when_cache_dropped() {
        let fetcher: Arc<dyn KeyFetcher> =
            Arc::new(|_key: String| async move { Ok::<_, FetchError>(FetchedKey::new("v")) });
        let cache = KeyCache::new(prefetch_config(), fetcher).unwrap();
        let weak = cache.downgrade();
        cache.start();

        drop(cache);

        assert!(weak.upgrade().is_none());
    }
}
