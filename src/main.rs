//! keycache - Key material cache server
//!
//! Serves cached key material over HTTP with TTL expiration, LRU eviction
//! and background prefetch.

mod upstream;

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::{signal, sync::watch};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use keycache::{api::create_router, spawn_cleanup_task, AppState, Config, KeyCache, KeyFetcher};
use upstream::{HttpFetcher, UnconfiguredFetcher};

/// Main entry point for the key cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the cache and start the prefetch worker
/// 4. Start background expiry sweep
/// 5. Serve the admin API until SIGINT/SIGTERM
/// 6. Stop the sweep and the prefetch worker
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "keycache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting key cache server");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size={}, default_ttl={}s, ttl_bounds=[{}, {}]s, prefetch_threshold={}, port={}",
        config.cache.max_size,
        config.cache.default_ttl_seconds,
        config.cache.min_ttl_seconds,
        config.cache.max_ttl_seconds,
        config.cache.prefetch_threshold,
        config.server_port
    );

    let fetcher: Arc<dyn KeyFetcher> = match &config.upstream_url {
        Some(url) => {
            info!(upstream = %url, "Using HTTP upstream");
            Arc::new(HttpFetcher::new(url)?)
        }
        None => {
            info!("No upstream configured, misses will not be fetched");
            Arc::new(UnconfiguredFetcher)
        }
    };

    let cache = KeyCache::new(config.cache.clone(), fetcher)?;
    cache.start();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup_handle = spawn_cleanup_task(cache.clone(), config.cleanup_interval, shutdown_rx);
    info!("Background cleanup task started");

    let app = create_router(AppState::new(cache.clone()));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = cleanup_handle.await {
        tracing::warn!("Cleanup task ended abnormally: {}", e);
    }
    cache.stop().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
