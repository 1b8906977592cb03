//! Upstream fetchers used by the server binary.
//!
//! [`HttpFetcher`] requests `{base_url}/{key}` and caches the response body,
//! keeping the `ETag` and `Last-Modified` validators alongside it. The key is
//! always a single percent-encoded path segment.

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, CACHE_CONTROL, ETAG, LAST_MODIFIED};
use reqwest::Url;
use tracing::debug;

use keycache::{FetchError, FetchedKey, KeyFetcher};

/// Fetches key material over HTTP.
pub struct HttpFetcher {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Fails if `base_url` does not parse as a hierarchical URL.
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("invalid upstream URL {base_url}"))?;
        if base_url.cannot_be_a_base() {
            bail!("upstream URL {base_url} cannot carry a path");
        }
        Ok(Self {
            base_url,
            client: reqwest::Client::new(),
        })
    }

    /// Appends `key` as one path segment; `/`, `?` and `#` inside it are
    /// escaped rather than interpreted.
    fn url_for(&self, key: &str) -> Result<Url, FetchError> {
        if key.is_empty() || key == "." || key == ".." {
            return Err(FetchError::Upstream(format!("unfetchable key {key:?}")));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| FetchError::Upstream(format!("{} cannot carry a path", self.base_url)))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }
}

#[async_trait]
impl KeyFetcher for HttpFetcher {
    async fn fetch(&self, key: &str) -> Result<FetchedKey, FetchError> {
        let url = self.url_for(key)?;
        debug!(%url, "Fetching key material");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Upstream(e.to_string()))?
            .error_for_status()
            .map_err(|e| FetchError::Upstream(e.to_string()))?;

        let headers = response.headers().clone();
        let value = response
            .text()
            .await
            .map_err(|e| FetchError::Upstream(e.to_string()))?;

        let mut fetched = FetchedKey::new(value);
        if let Some(ttl) = max_age(&headers) {
            fetched = fetched.with_ttl(ttl);
        }
        if let Some(etag) = header_str(&headers, ETAG) {
            fetched = fetched.with_etag(etag);
        }
        if let Some(last_modified) = header_str(&headers, LAST_MODIFIED) {
            fetched = fetched.with_last_modified(last_modified);
        }
        Ok(fetched)
    }
}

fn header_str(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// `max-age` from a `Cache-Control` header, if present.
fn max_age(headers: &HeaderMap) -> Option<u64> {
    header_str(headers, CACHE_CONTROL)?
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse().ok())
}

/// Fetcher used when no `UPSTREAM_URL` is set; every fetch fails.
pub struct UnconfiguredFetcher;

#[async_trait]
impl KeyFetcher for UnconfiguredFetcher {
    async fn fetch(&self, _key: &str) -> Result<FetchedKey, FetchError> {
        Err(FetchError::NotConfigured)
    }
}
