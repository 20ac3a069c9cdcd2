use std::sync::Arc;
use std::time::Duration;

use barrel_store::Store;
use chrono::TimeDelta;
use reqwest::header::{ETAG, IF_NONE_MATCH};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::{HttpCacheError, Result};

const DEFAULT_THROTTLE: usize = 4;
const MAX_REDIRECTS: usize = 20;
const DEFAULT_USER_AGENT: &str = "barrel-http/0.1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_EXPIRE_IN_DAYS: i64 = 1;

/// Per-request settings for [`HttpCache::get_cached`]
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// Whole-request timeout; a timeout surfaces as [`HttpCacheError::Http`]
    pub timeout: Duration,
    /// Lifetime of a newly cached response
    pub expire_in: TimeDelta,
    /// Skip the fresh-cache shortcut and the `If-None-Match` validator
    pub force_update: bool,
    /// Wait for a throttle slot before sending
    pub throttled: bool,
}

impl RequestOptions {
    pub fn new(timeout: Duration, expire_in: TimeDelta) -> Self {
        Self {
            timeout,
            expire_in,
            ..Self::default()
        }
    }

    pub fn with_force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    pub fn with_throttling(mut self, throttled: bool) -> Self {
        self.throttled = throttled;
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            expire_in: TimeDelta::days(DEFAULT_EXPIRE_IN_DAYS),
            force_update: false,
            throttled: true,
        }
    }
}

/// ETag-validating HTTP GET client that keeps response bodies in a [`Store`].
///
/// Clones share the HTTP connection pool and the throttle, so the concurrency
/// bound holds across every clone.
#[derive(Clone)]
pub struct HttpCache {
    client: reqwest::Client,
    /// Bounds concurrent outbound requests that opt into throttling
    throttle: Arc<Semaphore>,
}

impl HttpCache {
    /// Create a client allowing four throttled requests in flight
    pub fn new() -> Result<Self> {
        Self::with_throttle(DEFAULT_THROTTLE)
    }

    /// Create a client allowing `permits` throttled requests in flight (at least one)
    pub fn with_throttle(permits: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .gzip(true)
            .deflate(true)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;

        Ok(Self::with_client(client, permits))
    }

    /// Wrap an existing client. Redirect and decompression settings are the
    /// caller's responsibility.
    pub fn with_client(client: reqwest::Client, permits: usize) -> Self {
        Self {
            client,
            throttle: Arc::new(Semaphore::new(permits.max(1))),
        }
    }

    /// Fetch `url`, using `store` as the cache.
    ///
    /// A fresh cached body is returned without touching the network unless
    /// `force_update` is set. Otherwise the request carries the stored ETag as
    /// `If-None-Match` (again unless forced); `304` returns the cached body and
    /// `200` returns the new body, caching it when its ETag changed.
    pub async fn get_cached<S>(
        &self,
        store: &S,
        url: &str,
        options: &RequestOptions,
    ) -> Result<String>
    where
        S: Store + ?Sized,
    {
        let (cached, etag, fresh) = run_blocking(|| -> Result<_> {
            let cached = store.get_string(url)?.filter(|body| !body.is_empty());
            let etag = store.get_etag(url)?;
            let fresh = !options.force_update && cached.is_some() && !store.is_expired(url)?;
            Ok((cached, etag, fresh))
        })?;

        if fresh {
            debug!(url, "Serving fresh cached response");
            return Ok(cached.unwrap_or_default());
        }

        let permit = if options.throttled {
            Some(self.throttle.acquire().await?)
        } else {
            None
        };

        let mut request = self.client.get(url).timeout(options.timeout);
        if !options.force_update && cached.is_some() {
            if let Some(etag) = &etag {
                debug!(url, etag = %etag, "Revalidating cached response");
                request = request.header(IF_NONE_MATCH, etag.as_str());
            }
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            drop(permit);
            debug!(url, "Not modified, serving cached response");
            return cached.ok_or_else(|| HttpCacheError::CacheConsistency {
                url: url.to_string(),
            });
        }

        if status != StatusCode::OK {
            drop(permit);
            warn!(url, status = %status, "HTTP cache request failed");
            return Err(HttpCacheError::Request {
                url: url.to_string(),
                status,
            });
        }

        let new_etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.text().await?;
        drop(permit);

        // Without reqwest's `charset` feature `text()` is a plain UTF-8 decode
        // that keeps a leading byte-order mark
        let body = match body.strip_prefix('\u{FEFF}') {
            Some(stripped) => stripped.to_string(),
            None => body,
        };

        let changed = new_etag
            .as_deref()
            .filter(|tag| !tag.is_empty() && etag.as_deref() != Some(*tag));
        match changed {
            Some(new_etag) => {
                run_blocking(|| {
                    store.add(url, body.as_bytes(), options.expire_in, Some(new_etag))
                })?;
                debug!(url, etag = %new_etag, "Cached new response");
            }
            None => debug!(url, "Response not cached, ETag missing or unchanged"),
        }

        Ok(body)
    }
}

/// Run blocking store I/O on a multi-threaded runtime without stalling the
/// other tasks on this worker. A current-thread runtime has no other worker to
/// hand off to, so the call runs inline there.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if matches!(handle.runtime_flavor(), RuntimeFlavor::MultiThread) => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}
