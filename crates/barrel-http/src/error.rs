//! Error types for the HTTP cache

use std::fmt;

use reqwest::StatusCode;

/// Errors from the HTTP cache
#[derive(Debug)]
pub enum HttpCacheError {
    /// The backing store failed
    Store(barrel_store::BarrelError),
    /// Transport failure, including timeouts
    Http(Box<reqwest::Error>),
    /// The server answered 304 but nothing is cached for the URL
    CacheConsistency { url: String },
    /// The server answered something other than 200 or 304
    Request { url: String, status: StatusCode },
    Throttle(tokio::sync::AcquireError),
}

impl HttpCacheError {
    /// Status code of a rejected request
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::Request { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for HttpCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "Cache store error: {e}"),
            Self::Http(e) => write!(f, "HTTP error: {e}"),
            Self::CacheConsistency { url } => {
                write!(f, "Cached value missing for HTTP request: {url}")
            }
            Self::Request { url, status } => {
                write!(f, "HTTP cache request failed with status {status}: {url}")
            }
            Self::Throttle(e) => write!(f, "Request throttle unavailable: {e}"),
        }
    }
}

impl std::error::Error for HttpCacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Http(e) => Some(e.as_ref()),
            Self::Throttle(e) => Some(e),
            _ => None,
        }
    }
}

impl From<barrel_store::BarrelError> for HttpCacheError {
    fn from(err: barrel_store::BarrelError) -> Self {
        Self::Store(err)
    }
}

impl From<reqwest::Error> for HttpCacheError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

impl From<tokio::sync::AcquireError> for HttpCacheError {
    fn from(err: tokio::sync::AcquireError) -> Self {
        Self::Throttle(err)
    }
}

pub type Result<T> = std::result::Result<T, HttpCacheError>;
