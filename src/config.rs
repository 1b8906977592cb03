//! Configuration Module
//!
//! Cache tuning parameters and the server settings loaded from environment
//! variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Cache Config ==
/// Cache tuning parameters. Immutable once handed to the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries the cache can hold
    pub max_size: usize,
    /// TTL applied when `put` does not request one
    pub default_ttl_seconds: u64,
    /// Lower bound for any effective TTL
    pub min_ttl_seconds: u64,
    /// Upper bound for any effective TTL
    pub max_ttl_seconds: u64,
    /// Fraction of the TTL after which a hit schedules a background refresh
    pub prefetch_threshold: f64,
    /// Capacity of the prefetch queue
    pub prefetch_queue_size: usize,
    /// Longest time the prefetch worker waits on an empty queue
    pub prefetch_poll_interval_ms: u64,
    /// Upper bound on a single fetcher call
    pub fetch_timeout_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            default_ttl_seconds: 3600,
            min_ttl_seconds: 300,
            max_ttl_seconds: 86_400,
            prefetch_threshold: 0.8,
            prefetch_queue_size: 256,
            prefetch_poll_interval_ms: 1000,
            fetch_timeout_seconds: 10,
        }
    }
}

impl CacheConfig {
    /// Sets the capacity.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Sets the default, minimum and maximum TTL in one go.
    pub fn ttl_bounds(mut self, default: u64, min: u64, max: u64) -> Self {
        self.default_ttl_seconds = default;
        self.min_ttl_seconds = min;
        self.max_ttl_seconds = max;
        self
    }

    /// Sets the prefetch threshold.
    pub fn prefetch_threshold(mut self, threshold: f64) -> Self {
        self.prefetch_threshold = threshold;
        self
    }

    /// Sets the prefetch queue capacity.
    pub fn prefetch_queue_size(mut self, size: usize) -> Self {
        self.prefetch_queue_size = size;
        self
    }

    /// Sets the worker's poll interval.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.prefetch_poll_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Sets the fetch timeout.
    pub fn fetch_timeout_seconds(mut self, seconds: u64) -> Self {
        self.fetch_timeout_seconds = seconds;
        self
    }

    // == Validate ==
    /// Rejects inconsistent bounds before any cache is built from them.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(CacheError::Configuration(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.min_ttl_seconds == 0 {
            return Err(CacheError::Configuration(
                "min_ttl_seconds must be at least 1".to_string(),
            ));
        }
        if self.min_ttl_seconds > self.max_ttl_seconds {
            return Err(CacheError::Configuration(format!(
                "min_ttl_seconds ({}) exceeds max_ttl_seconds ({})",
                self.min_ttl_seconds, self.max_ttl_seconds
            )));
        }
        if !(self.min_ttl_seconds..=self.max_ttl_seconds).contains(&self.default_ttl_seconds) {
            return Err(CacheError::Configuration(format!(
                "default_ttl_seconds ({}) outside [{}, {}]",
                self.default_ttl_seconds, self.min_ttl_seconds, self.max_ttl_seconds
            )));
        }
        if !(self.prefetch_threshold > 0.0 && self.prefetch_threshold <= 1.0) {
            return Err(CacheError::Configuration(format!(
                "prefetch_threshold ({}) must be in (0, 1]",
                self.prefetch_threshold
            )));
        }
        if self.prefetch_queue_size == 0 {
            return Err(CacheError::Configuration(
                "prefetch_queue_size must be at least 1".to_string(),
            ));
        }
        if self.prefetch_poll_interval_ms == 0 {
            return Err(CacheError::Configuration(
                "prefetch_poll_interval_ms must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_seconds == 0 {
            return Err(CacheError::Configuration(
                "fetch_timeout_seconds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    // == Effective TTL ==
    /// Clamps a requested TTL (or the default) into `[min, max]`.
    pub fn effective_ttl(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.default_ttl_seconds)
            .clamp(self.min_ttl_seconds, self.max_ttl_seconds)
    }

    /// Poll interval as a `Duration`.
    pub fn prefetch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.prefetch_poll_interval_ms)
    }

    /// Fetch timeout as a `Duration`.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }
}

// == Server Config ==
/// Process configuration for the `keycache` binary.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache tuning
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Expiry sweep interval in seconds
    pub cleanup_interval: u64,
    /// Base URL the upstream fetcher requests `{base}/{key}` from
    pub upstream_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_SIZE` - Maximum cache entries (default: 1000)
    /// - `DEFAULT_TTL` / `MIN_TTL` / `MAX_TTL` - TTL bounds in seconds
    ///   (default: 3600 / 300 / 86400)
    /// - `PREFETCH_THRESHOLD` - Fraction of TTL before refresh (default: 0.8)
    /// - `PREFETCH_QUEUE_SIZE` - Prefetch queue capacity (default: 256)
    /// - `PREFETCH_POLL_INTERVAL_MS` - Worker poll interval (default: 1000)
    /// - `FETCH_TIMEOUT` - Fetch timeout in seconds (default: 10)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 60)
    /// - `UPSTREAM_URL` - Origin base URL (default: unset)
    pub fn from_env() -> Self {
        let defaults = CacheConfig::default();
        let cache = CacheConfig {
            max_size: env_or("MAX_SIZE", defaults.max_size),
            default_ttl_seconds: env_or("DEFAULT_TTL", defaults.default_ttl_seconds),
            min_ttl_seconds: env_or("MIN_TTL", defaults.min_ttl_seconds),
            max_ttl_seconds: env_or("MAX_TTL", defaults.max_ttl_seconds),
            prefetch_threshold: env_or("PREFETCH_THRESHOLD", defaults.prefetch_threshold),
            prefetch_queue_size: env_or("PREFETCH_QUEUE_SIZE", defaults.prefetch_queue_size),
            prefetch_poll_interval_ms: env_or(
                "PREFETCH_POLL_INTERVAL_MS",
                defaults.prefetch_poll_interval_ms,
            ),
            fetch_timeout_seconds: env_or("FETCH_TIMEOUT", defaults.fetch_timeout_seconds),
        };

        Self {
            cache,
            server_port: env_or("SERVER_PORT", 3000),
            cleanup_interval: env_or("CLEANUP_INTERVAL", 60),
            upstream_url: env::var("UPSTREAM_URL").ok().filter(|v| !v.is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            cleanup_interval: 60,
            upstream_url: None,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
