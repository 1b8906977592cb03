//! Fetcher Module
//!
//! The seam through which the cache obtains fresh key material. Transport,
//! retries and TLS all live behind this trait.

use std::future::Future;

use async_trait::async_trait;

use crate::error::FetchError;

// == Fetched Key ==
/// Key material returned by a fetcher, with optional caching hints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedKey {
    /// The opaque payload to cache
    pub value: String,
    /// TTL suggested by the origin; still clamped by the cache
    pub ttl_seconds: Option<u64>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl FetchedKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    pub fn with_last_modified(mut self, last_modified: impl Into<String>) -> Self {
        self.last_modified = Some(last_modified.into());
        self
    }
}

// == Key Fetcher ==
/// Source of key material, called on a miss by
/// [`KeyCache::get_or_fetch`](crate::cache::KeyCache::get_or_fetch) and by the
/// prefetch worker.
#[async_trait]
pub trait KeyFetcher: Send + Sync {
    /// Fetches the current material for `key`.
    async fn fetch(&self, key: &str) -> Result<FetchedKey, FetchError>;
}

/// Any `Fn(String) -> impl Future<Output = Result<FetchedKey, FetchError>>`
/// is a fetcher.
#[async_trait]
impl<F, Fut> KeyFetcher for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FetchedKey, FetchError>> + Send,
{
    async fn fetch(&self, key: &str) -> Result<FetchedKey, FetchError> {
        (self)(key.to_string()).await
    }
}
