//! Cache types

use std::ops::BitOr;
use std::path::PathBuf;

/// Expiration filter for [`crate::Store::get_keys`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CacheState {
    /// Entries whose expiration has not passed
    #[default]
    Active,
    /// Entries whose expiration has passed
    Expired,
    /// Both active and expired entries
    All,
}

impl CacheState {
    pub fn includes_active(self) -> bool {
        matches!(self, CacheState::Active | CacheState::All)
    }

    pub fn includes_expired(self) -> bool {
        matches!(self, CacheState::Expired | CacheState::All)
    }
}

impl BitOr for CacheState {
    type Output = CacheState;

    fn bitor(self, rhs: Self) -> Self::Output {
        if self == rhs {
            self
        } else {
            CacheState::All
        }
    }
}

/// Configuration for opening a [`crate::Barrel`]
#[derive(Debug, Clone, Default)]
pub struct BarrelConfig {
    /// Names the cache directory under the base cache path
    pub application_id: String,
    /// Explicit cache directory, bypassing application id resolution
    pub cache_dir: Option<PathBuf>,
    /// Hide expired entries from reads
    pub auto_expire: bool,
}

impl BarrelConfig {
    /// Load configuration from `BARREL_APP_ID`, `BARREL_CACHE_DIR` and `BARREL_AUTO_EXPIRE`
    pub fn from_env() -> Self {
        let application_id = std::env::var("BARREL_APP_ID").unwrap_or_default();

        let cache_dir = std::env::var("BARREL_CACHE_DIR")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let auto_expire = std::env::var("BARREL_AUTO_EXPIRE")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            application_id,
            cache_dir,
            auto_expire,
        }
    }
}
