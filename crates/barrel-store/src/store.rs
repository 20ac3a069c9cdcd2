//! The cache contract shared by store implementations and their consumers

use crate::error::{BarrelError, Result};
use crate::types::CacheState;
use chrono::{DateTime, TimeDelta, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Persistent key/value store with expiration and ETag metadata per key.
///
/// Every key argument must be non-blank and free of tabs and line breaks;
/// anything else fails with [`BarrelError::InvalidArgument`].
pub trait Store: Send + Sync {
    /// Store `data` under `key`, replacing any previous payload, ETag and
    /// expiration. The entry expires `expire_in` from now, saturating at the
    /// minimum or maximum representable instant.
    fn add(
        &self,
        key: &str,
        data: &[u8],
        expire_in: TimeDelta,
        etag: Option<&str>,
    ) -> Result<()>;

    /// Payload for `key`, if indexed and its content file exists
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// ETag for `key`; `None` if the key is unknown or was stored without one
    fn get_etag(&self, key: &str) -> Result<Option<String>>;

    fn get_expiration(&self, key: &str) -> Result<Option<DateTime<Utc>>>;

    /// Whether `key` is indexed, expired or not
    fn exists(&self, key: &str) -> Result<bool>;

    /// True for unknown keys and for keys whose expiration has passed
    fn is_expired(&self, key: &str) -> Result<bool>;

    fn get_keys(&self, state: CacheState) -> Result<Vec<String>>;

    /// Remove the listed entries; blank keys are skipped
    fn empty(&self, keys: &[&str]) -> Result<()>;

    fn empty_all(&self) -> Result<()>;

    fn empty_expired(&self) -> Result<()>;

    /// Payload for `key` decoded as UTF-8
    fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key)? {
            Some(bytes) => Ok(Some(String::from_utf8(bytes)?)),
            None => Ok(None),
        }
    }

    /// Serialize `data` to JSON and store it. A value that serializes to
    /// `null` is rejected.
    fn add_json<T>(
        &self,
        key: &str,
        data: &T,
        expire_in: TimeDelta,
        etag: Option<&str>,
    ) -> Result<()>
    where
        T: Serialize + ?Sized,
        Self: Sized,
    {
        let json = serde_json::to_string(data)?;
        if json == "null" {
            return Err(BarrelError::InvalidArgument(
                "Data can not be null".to_string(),
            ));
        }
        self.add(key, json.as_bytes(), expire_in, etag)
    }

    fn get_json<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
        Self: Sized,
    {
        match self.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}
