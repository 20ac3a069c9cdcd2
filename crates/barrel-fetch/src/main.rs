//! barrel-fetch - fetch URLs through the file-backed HTTP cache
//!
//! Usage: `barrel-fetch <url>...`
//!
//! Each URL is served from the cache while fresh and revalidated with its
//! ETag otherwise. One line per URL is printed: the URL, the body size and
//! the stored ETag.

mod error;
mod types;

use crate::error::{FetchError, Result};
use crate::types::FetchConfig;
use barrel_http::HttpCache;
use barrel_store::{Barrel, Store};
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let env_filter = EnvFilter::from_default_env().add_directive("barrel_fetch=info".parse()?);

    // Use JSON format for GCP Cloud Logging when LOG_FORMAT=json
    if std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false)
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    };

    let urls: Vec<String> = std::env::args().skip(1).collect();
    if urls.is_empty() {
        return Err(FetchError::Usage("usage: barrel-fetch <url>...".to_string()));
    }

    let config = FetchConfig::from_env();
    info!("Application id: {}", config.barrel.application_id);
    info!("Request timeout: {} seconds", config.request_timeout_secs);
    info!("Cache TTL: {} seconds", config.cache_ttl_secs);

    let barrel = Barrel::from_config(&config.barrel)?;
    info!("Cache dir: {:?}", barrel.directory());

    if config.purge_expired {
        barrel.empty_expired()?;
        info!("Purged expired entries");
    }

    let cache = HttpCache::new()?;
    let options = config.request_options();

    let (barrel, cache, options) = (&barrel, &cache, &options);
    let results = futures::future::join_all(urls.iter().map(|url| async move {
        (url, cache.get_cached(barrel, url, options).await)
    }))
    .await;

    let mut failures = 0;
    for (url, result) in results {
        match result {
            Ok(body) => {
                let etag = barrel.get_etag(url)?.unwrap_or_else(|| "-".to_string());
                println!("{}\t{} bytes\tetag {}", url, body.len(), etag);
            }
            Err(e) => {
                error!(url = %url, error = %e, "Failed to fetch");
                failures += 1;
            }
        }
    }

    if failures > 0 {
        return Err(FetchError::Failed(failures));
    }
    Ok(())
}
