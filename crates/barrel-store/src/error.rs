//! Error types for the barrel store

use std::fmt;

#[derive(Debug)]
pub enum BarrelError {
    /// Blank key, key with characters the index cannot hold, and similar caller mistakes
    InvalidArgument(String),
    /// Unusable application id or no platform cache directory
    InvalidConfiguration(String),
    /// Base cache path was already set, or already in use
    AlreadyConfigured,
    Io(Box<std::io::Error>),
    Json(serde_json::Error),
    Utf8(std::string::FromUtf8Error),
}

impl fmt::Display for BarrelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BarrelError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            BarrelError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            BarrelError::AlreadyConfigured => write!(
                f,
                "Base cache path can only be set once, before the cache is first used"
            ),
            BarrelError::Io(err) => write!(f, "IO error: {}", err),
            BarrelError::Json(err) => write!(f, "JSON error: {}", err),
            BarrelError::Utf8(err) => write!(f, "Stored payload is not UTF-8: {}", err),
        }
    }
}

impl std::error::Error for BarrelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BarrelError::Io(err) => Some(err.as_ref()),
            BarrelError::Json(err) => Some(err),
            BarrelError::Utf8(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BarrelError {
    fn from(err: std::io::Error) -> Self {
        BarrelError::Io(Box::new(err))
    }
}

impl From<serde_json::Error> for BarrelError {
    fn from(err: serde_json::Error) -> Self {
        BarrelError::Json(err)
    }
}

impl From<std::string::FromUtf8Error> for BarrelError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        BarrelError::Utf8(err)
    }
}

pub type Result<T> = std::result::Result<T, BarrelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_argument_display() {
        let err = BarrelError::InvalidArgument("Key can not be null or empty".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid argument: Key can not be null or empty"
        );
    }

    #[test]
    fn test_io_error_has_source() {
        let err: BarrelError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(format!("{}", err).contains("denied"));
    }

    #[test]
    fn test_already_configured_is_debug() {
        let debug_str = format!("{:?}", BarrelError::AlreadyConfigured);
        assert!(debug_str.contains("AlreadyConfigured"));
    }
}
