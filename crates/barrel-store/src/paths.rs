//! Per-application cache directory resolution

use crate::error::{BarrelError, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Characters that may not appear in an application id on any supported platform
const INVALID_SEGMENT_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

static GLOBAL: PathResolver = PathResolver::new();

/// Resolves one writable directory per application id under a shared base path.
///
/// The base path is fixed the first time it is read. It can be overridden with
/// [`PathResolver::set_base_cache_path`] exactly once, and only before that
/// first read; otherwise the platform cache directory is used.
#[derive(Debug)]
pub struct PathResolver {
    base_path: OnceLock<PathBuf>,
}

impl PathResolver {
    pub const fn new() -> Self {
        Self {
            base_path: OnceLock::new(),
        }
    }

    /// The process-wide resolver used by [`crate::Barrel::for_application`]
    pub fn global() -> &'static PathResolver {
        &GLOBAL
    }

    /// Override the base path. Fails with `AlreadyConfigured` on a second
    /// call or once the base path has been used.
    pub fn set_base_cache_path(&self, path: impl Into<PathBuf>) -> Result<()> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(BarrelError::InvalidConfiguration(
                "Base cache path can not be empty".to_string(),
            ));
        }
        self.base_path
            .set(path)
            .map_err(|_| BarrelError::AlreadyConfigured)
    }

    /// The base path, falling back to the platform cache directory on first use
    pub fn base_cache_path(&self) -> Result<&Path> {
        if let Some(path) = self.base_path.get() {
            return Ok(path);
        }
        let default = dirs::cache_dir().ok_or_else(|| {
            BarrelError::InvalidConfiguration(
                "No platform cache directory available, set a base cache path".to_string(),
            )
        })?;
        Ok(self.base_path.get_or_init(|| default))
    }

    pub fn resolve(&self, application_id: &str) -> Result<PathBuf> {
        validate_application_id(application_id)?;
        Ok(self.base_cache_path()?.join(application_id))
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_application_id(application_id: &str) -> Result<()> {
    if application_id.trim().is_empty() {
        return Err(BarrelError::InvalidConfiguration(
            "An application id is required to resolve the cache directory".to_string(),
        ));
    }

    let invalid = application_id == "."
        || application_id == ".."
        || application_id
            .chars()
            .any(|c| c.is_control() || INVALID_SEGMENT_CHARS.contains(&c));
    if invalid {
        return Err(BarrelError::InvalidConfiguration(format!(
            "Application id has invalid characters: {:?}",
            application_id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_base_cache_path() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new();
        resolver.set_base_cache_path(dir.path()).unwrap();

        assert_eq!(resolver.base_cache_path().unwrap(), dir.path());
        assert_eq!(
            resolver.resolve("monkeys").unwrap(),
            dir.path().join("monkeys")
        );
    }

    #[test]
    fn test_set_base_cache_path_twice() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new();
        resolver.set_base_cache_path(dir.path()).unwrap();

        let result = resolver.set_base_cache_path(dir.path());
        assert!(matches!(result, Err(BarrelError::AlreadyConfigured)));
    }

    #[test]
    fn test_set_base_cache_path_after_use() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new();
        resolver.set_base_cache_path(dir.path()).unwrap();
        resolver.resolve("monkeys").unwrap();

        let other = tempdir().unwrap();
        let result = resolver.set_base_cache_path(other.path());
        assert!(matches!(result, Err(BarrelError::AlreadyConfigured)));
        assert_eq!(resolver.base_cache_path().unwrap(), dir.path());
    }

    #[test]
    fn test_resolve_seals_platform_default() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new();

        match resolver.resolve("monkeys") {
            Ok(_) => {
                let result = resolver.set_base_cache_path(dir.path());
                assert!(matches!(result, Err(BarrelError::AlreadyConfigured)));
            }
            // No platform cache directory: nothing was sealed
            Err(e) => {
                assert!(matches!(e, BarrelError::InvalidConfiguration(_)));
                assert!(resolver.set_base_cache_path(dir.path()).is_ok());
            }
        }
    }

    #[test]
    fn test_empty_base_cache_path_rejected() {
        let resolver = PathResolver::new();
        let result = resolver.set_base_cache_path("");
        assert!(matches!(result, Err(BarrelError::InvalidConfiguration(_))));

        // A rejected override does not consume the one allowed attempt
        let dir = tempdir().unwrap();
        assert!(resolver.set_base_cache_path(dir.path()).is_ok());
    }

    #[test]
    fn test_resolve_rejects_invalid_application_ids() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new();
        resolver.set_base_cache_path(dir.path()).unwrap();

        for id in ["", "   ", ".", "..", "a/b", "a\\b", "what?", "nul\0byte", "tab\tbed"] {
            let result = resolver.resolve(id);
            assert!(
                matches!(result, Err(BarrelError::InvalidConfiguration(_))),
                "expected {:?} to be rejected",
                id
            );
        }
    }

    #[test]
    fn test_resolve_is_stable() {
        let dir = tempdir().unwrap();
        let resolver = PathResolver::new();
        resolver.set_base_cache_path(dir.path()).unwrap();

        let first = resolver.resolve("com.example.app").unwrap();
        let second = resolver.resolve("com.example.app").unwrap();
        assert_eq!(first, second);
    }
}
