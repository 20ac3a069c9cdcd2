//! File-backed cache engine: index plus content files under one lock

use crate::content::ContentStore;
use crate::error::{BarrelError, Result};
use crate::hasher::{KeyHasher, Sha256Hasher};
use crate::index::{Index, IndexEntry, INDEX_FILE_NAME};
use crate::paths::PathResolver;
use crate::store::Store;
use crate::types::{BarrelConfig, CacheState};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Index and payload files, always accessed together
struct BarrelState {
    index: Index,
    content: ContentStore,
}

/// A persistent key/value cache stored in a single directory.
///
/// Payloads live in one file per key, named by the key's hash. An index file
/// (`idx.dat`) maps each key to its ETag and expiration and is rewritten after
/// every mutation. Reads share the lock, mutations take it exclusively.
///
/// Only one `Barrel` per directory should be open at a time; nothing guards
/// against other processes writing the same directory.
pub struct Barrel {
    state: RwLock<BarrelState>,
    hasher: Box<dyn KeyHasher>,
    auto_expire: AtomicBool,
    dir: PathBuf,
}

/// Options for opening a [`Barrel`]
pub struct BarrelBuilder {
    dir: PathBuf,
    hasher: Box<dyn KeyHasher>,
    auto_expire: bool,
}

impl BarrelBuilder {
    /// Use a different key hasher. Changing hashers for an existing
    /// directory orphans all stored payloads.
    pub fn hasher(mut self, hasher: impl KeyHasher + 'static) -> Self {
        self.hasher = Box::new(hasher);
        self
    }

    pub fn auto_expire(mut self, auto_expire: bool) -> Self {
        self.auto_expire = auto_expire;
        self
    }

    pub fn open(self) -> Result<Barrel> {
        let index = Index::load(self.dir.join(INDEX_FILE_NAME))?;
        info!(cache_dir = ?self.dir, entries = index.len(), "Barrel opened");

        Ok(Barrel {
            state: RwLock::new(BarrelState {
                index,
                content: ContentStore::new(self.dir.clone()),
            }),
            hasher: self.hasher,
            auto_expire: AtomicBool::new(self.auto_expire),
            dir: self.dir,
        })
    }
}

impl Barrel {
    pub fn builder(dir: impl Into<PathBuf>) -> BarrelBuilder {
        BarrelBuilder {
            dir: dir.into(),
            hasher: Box::new(Sha256Hasher),
            auto_expire: false,
        }
    }

    /// Open a barrel in an explicit directory with default options
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(dir).open()
    }

    /// Open the barrel for `application_id` under the process-wide base cache path
    pub fn for_application(application_id: &str) -> Result<Self> {
        Self::create(PathResolver::global().resolve(application_id)?)
    }

    pub fn from_config(config: &BarrelConfig) -> Result<Self> {
        let dir = match &config.cache_dir {
            Some(dir) => dir.clone(),
            None => PathResolver::global().resolve(&config.application_id)?,
        };
        Self::builder(dir).auto_expire(config.auto_expire).open()
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    pub fn auto_expire(&self) -> bool {
        self.auto_expire.load(Ordering::Relaxed)
    }

    /// When enabled, reads return nothing for expired entries (which are kept)
    pub fn set_auto_expire(&self, auto_expire: bool) {
        self.auto_expire.store(auto_expire, Ordering::Relaxed);
    }

    /// Delete every file in the cache directory, including payloads no index
    /// entry refers to, and clear the index.
    ///
    /// The emptied index is persisted before any payload is touched, so a
    /// failed persist leaves the barrel exactly as it was.
    pub fn wipe(&self) -> Result<()> {
        let mut state = self.state.write();
        let entries = state.index.take();
        if let Err(e) = state.index.persist() {
            state.index.restore(entries);
            warn!(cache_dir = ?self.dir, error = %e, "Failed to persist cleared index, wipe aborted");
            return Err(e);
        }
        state.content.wipe()?;
        info!(cache_dir = ?self.dir, "Barrel wiped");
        Ok(())
    }

    /// Remove `keys` from disk and the index, then persist once. If a delete
    /// fails, the entries removed before it stay removed.
    fn purge<I>(&self, state: &mut BarrelState, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let mut outcome = Ok(());
        let mut removed = 0usize;

        for key in keys {
            if let Err(e) = state.content.delete(&self.hasher.hash_key(&key)) {
                outcome = Err(e);
                break;
            }
            state.index.remove(&key);
            removed += 1;
        }

        let persisted = state.index.persist();
        debug!(removed, "Purged cache entries");

        match outcome {
            Ok(()) => persisted,
            Err(e) => {
                if let Err(persist_err) = persisted {
                    warn!(error = %persist_err, "Failed to persist index after partial purge");
                }
                Err(e)
            }
        }
    }
}

impl Store for Barrel {
    fn add(
        &self,
        key: &str,
        data: &[u8],
        expire_in: TimeDelta,
        etag: Option<&str>,
    ) -> Result<()> {
        validate_key(key)?;
        let etag = etag.unwrap_or_default();
        if etag.contains(['\t', '\n', '\r']) {
            return Err(BarrelError::InvalidArgument(
                "ETag can not contain tabs or line breaks".to_string(),
            ));
        }

        let hash = self.hasher.hash_key(key);
        let expires_at = expiration_from(expire_in);

        let mut state = self.state.write();
        state.content.write(&hash, data)?;
        let previous = state.index.insert(
            key.to_string(),
            IndexEntry {
                etag: etag.to_string(),
                expires_at,
            },
        );
        if let Err(e) = state.index.persist() {
            // Keep memory in line with the index file that is still on disk
            match previous {
                Some(entry) => {
                    state.index.insert(key.to_string(), entry);
                }
                None => {
                    state.index.remove(key);
                }
            }
            warn!(key = %key, error = %e, "Failed to persist index, entry rolled back");
            return Err(e);
        }

        debug!(key = %key, size = data.len(), expires_at = %expires_at, "Cached entry");
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        let state = self.state.read_recursive();

        let Some(entry) = state.index.get(key) else {
            return Ok(None);
        };
        if self.auto_expire() && entry.is_expired_at(Utc::now()) {
            debug!(key = %key, "Entry expired, hiding it from read");
            return Ok(None);
        }

        state.content.read(&self.hasher.hash_key(key))
    }

    fn get_etag(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let state = self.state.read_recursive();
        Ok(state
            .index
            .get(key)
            .filter(|entry| !entry.etag.is_empty())
            .map(|entry| entry.etag.clone()))
    }

    fn get_expiration(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        validate_key(key)?;
        let state = self.state.read_recursive();
        Ok(state.index.get(key).map(|entry| entry.expires_at))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        Ok(self.state.read_recursive().index.contains(key))
    }

    fn is_expired(&self, key: &str) -> Result<bool> {
        validate_key(key)?;
        let state = self.state.read_recursive();
        Ok(state
            .index
            .get(key)
            .map_or(true, |entry| entry.is_expired_at(Utc::now())))
    }

    fn get_keys(&self, filter: CacheState) -> Result<Vec<String>> {
        let now = Utc::now();
        let state = self.state.read_recursive();
        let keys = state
            .index
            .keys_where(|entry| {
                let expired = entry.expires_at < now;
                (expired && filter.includes_expired()) || (!expired && filter.includes_active())
            })
            .map(str::to_string)
            .collect();
        Ok(keys)
    }

    fn empty(&self, keys: &[&str]) -> Result<()> {
        let mut state = self.state.write();
        let keys = keys
            .iter()
            .filter(|key| !key.trim().is_empty())
            .map(|key| key.to_string());
        self.purge(&mut state, keys)
    }

    fn empty_all(&self) -> Result<()> {
        let mut state = self.state.write();
        let keys: Vec<String> = state
            .index
            .keys_where(|_| true)
            .map(str::to_string)
            .collect();
        self.purge(&mut state, keys)
    }

    fn empty_expired(&self) -> Result<()> {
        let now = Utc::now();
        let mut state = self.state.write();
        let keys: Vec<String> = state
            .index
            .keys_where(|entry| entry.expires_at < now)
            .map(str::to_string)
            .collect();
        self.purge(&mut state, keys)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(BarrelError::InvalidArgument(
            "Key can not be null or empty".to_string(),
        ));
    }
    if key.contains(['\t', '\n', '\r']) {
        return Err(BarrelError::InvalidArgument(
            "Key can not contain tabs or line breaks".to_string(),
        ));
    }
    Ok(())
}

/// `now + expire_in`, saturating instead of overflowing
fn expiration_from(expire_in: TimeDelta) -> DateTime<Utc> {
    Utc::now()
        .checked_add_signed(expire_in)
        .unwrap_or(if expire_in < TimeDelta::zero() {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}
