//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries so idle keys do
//! not hold capacity until their next lookup.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::KeyCache;

/// Spawns a background task that periodically removes expired entries.
///
/// The task sleeps for `cleanup_interval_secs` between sweeps and exits once
/// `shutdown` flips to `true` or its sender is dropped.
///
/// # Example
/// ```ignore
/// let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
/// let handle = spawn_cleanup_task(cache.clone(), 60, shutdown_rx);
/// // Later, during shutdown:
/// shutdown_tx.send(true).ok();
/// handle.await.ok();
/// ```
pub fn spawn_cleanup_task(
    cache: KeyCache,
    cleanup_interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let removed = cache.cleanup_expired();
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }

        info!("TTL cleanup task stopped");
    })
}
