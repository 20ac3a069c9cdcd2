//! Configuration for barrel-fetch

use barrel_http::RequestOptions;
use barrel_store::BarrelConfig;
use chrono::TimeDelta;
use std::time::Duration;

const DEFAULT_APPLICATION_ID: &str = "barrel-fetch";

/// Configuration for a fetch run
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub barrel: BarrelConfig,
    pub request_timeout_secs: u64,
    /// Lifetime of newly cached responses; may be negative
    pub cache_ttl_secs: i64,
    pub force_update: bool,
    pub throttled: bool,
    /// Remove expired entries before fetching
    pub purge_expired: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            barrel: BarrelConfig {
                application_id: DEFAULT_APPLICATION_ID.to_string(),
                ..BarrelConfig::default()
            },
            request_timeout_secs: 30,
            cache_ttl_secs: 24 * 60 * 60, // 24 hours
            force_update: false,
            throttled: true,
            purge_expired: false,
        }
    }
}

impl FetchConfig {
    /// Load configuration from the environment, falling back to defaults for
    /// anything missing or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let mut barrel = BarrelConfig::from_env();
        if barrel.application_id.trim().is_empty() {
            barrel.application_id = defaults.barrel.application_id;
        }

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.request_timeout_secs);

        let cache_ttl_secs = std::env::var("CACHE_TTL_SECS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or(defaults.cache_ttl_secs);

        Self {
            barrel,
            request_timeout_secs,
            cache_ttl_secs,
            force_update: env_flag("FORCE_UPDATE").unwrap_or(defaults.force_update),
            throttled: env_flag("THROTTLED").unwrap_or(defaults.throttled),
            purge_expired: env_flag("PURGE_EXPIRED").unwrap_or(defaults.purge_expired),
        }
    }

    pub fn request_options(&self) -> RequestOptions {
        let saturated = if self.cache_ttl_secs < 0 {
            TimeDelta::MIN
        } else {
            TimeDelta::MAX
        };
        let expire_in = TimeDelta::try_seconds(self.cache_ttl_secs).unwrap_or(saturated);

        RequestOptions::new(Duration::from_secs(self.request_timeout_secs), expire_in)
            .with_force_update(self.force_update)
            .with_throttling(self.throttled)
    }
}

fn env_flag(name: &str) -> Option<bool> {
    parse_flag(&std::env::var(name).ok()?)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FetchConfig::default();
        assert_eq!(config.barrel.application_id, "barrel-fetch");
        assert!(config.barrel.cache_dir.is_none());
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.cache_ttl_secs, 24 * 60 * 60);
        assert!(!config.force_update);
        assert!(config.throttled);
        assert!(!config.purge_expired);
    }

    #[test]
    fn test_request_options() {
        let config = FetchConfig {
            force_update: true,
            throttled: false,
            cache_ttl_secs: -60,
            ..FetchConfig::default()
        };

        let options = config.request_options();
        assert_eq!(options.timeout, Duration::from_secs(30));
        assert_eq!(options.expire_in, TimeDelta::seconds(-60));
        assert!(options.force_update);
        assert!(!options.throttled);
    }

    #[test]
    fn test_request_options_saturates_huge_ttl() {
        let config = FetchConfig {
            cache_ttl_secs: i64::MAX,
            ..FetchConfig::default()
        };
        assert_eq!(config.request_options().expire_in, TimeDelta::MAX);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
