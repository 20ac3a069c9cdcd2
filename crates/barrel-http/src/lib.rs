//! HTTP cache on top of a barrel store
//!
//! [`HttpCache::get_cached`] serves a URL from the store while its entry is
//! fresh, otherwise revalidates it with `If-None-Match` and refreshes the
//! store when the server sends a new ETag. Outbound requests are limited by a
//! shared throttle (four at a time by default).

mod client;
mod error;

pub use client::{HttpCache, RequestOptions};
pub use error::{HttpCacheError, Result};
