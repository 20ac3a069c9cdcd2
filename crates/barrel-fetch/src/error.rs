//! Error types for barrel-fetch

use std::fmt;

#[derive(Debug)]
pub enum FetchError {
    Store(barrel_store::BarrelError),
    HttpCache(barrel_http::HttpCacheError),
    Config(String),
    Usage(String),
    /// Number of URLs that could not be fetched
    Failed(usize),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Store(err) => write!(f, "Cache store error: {}", err),
            FetchError::HttpCache(err) => write!(f, "HTTP cache error: {}", err),
            FetchError::Config(msg) => write!(f, "Configuration error: {}", msg),
            FetchError::Usage(msg) => write!(f, "{}", msg),
            FetchError::Failed(count) => write!(f, "{} URL(s) could not be fetched", count),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Store(err) => Some(err),
            FetchError::HttpCache(err) => Some(err),
            _ => None,
        }
    }
}

impl From<barrel_store::BarrelError> for FetchError {
    fn from(err: barrel_store::BarrelError) -> Self {
        FetchError::Store(err)
    }
}

impl From<barrel_http::HttpCacheError> for FetchError {
    fn from(err: barrel_http::HttpCacheError) -> Self {
        FetchError::HttpCache(err)
    }
}

impl From<tracing_subscriber::filter::ParseError> for FetchError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        FetchError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_display() {
        let err = FetchError::Failed(2);
        assert_eq!(format!("{}", err), "2 URL(s) could not be fetched");
    }

    #[test]
    fn test_store_error_display() {
        let err = FetchError::Store(barrel_store::BarrelError::AlreadyConfigured);
        assert!(format!("{}", err).starts_with("Cache store error:"));
    }

    #[test]
    fn test_config_error_display() {
        let err = FetchError::Config("bad directive".to_string());
        assert_eq!(format!("{}", err), "Configuration error: bad directive");
    }
}
