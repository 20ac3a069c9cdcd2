//! Durable key metadata index
//!
//! The index is a flat text file with one `key\tetag\texpires_epoch_secs`
//! line per entry. It is rewritten in full after every mutation.

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

pub(crate) const INDEX_FILE_NAME: &str = "idx.dat";

/// Metadata tracked for each cached key
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IndexEntry {
    /// Empty when no ETag was supplied
    pub etag: String,
    pub expires_at: DateTime<Utc>,
}

impl IndexEntry {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

pub(crate) struct Index {
    path: PathBuf,
    entries: BTreeMap<String, IndexEntry>,
}

impl Index {
    /// Load the index file, or start empty if it does not exist yet.
    ///
    /// Malformed lines are skipped; for duplicate keys the first line wins.
    pub fn load(path: PathBuf) -> Result<Self> {
        let entries = match fs::read(&path) {
            Ok(bytes) => parse_entries(&String::from_utf8_lossy(&bytes), &path),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self { path, entries })
    }

    /// Overwrite the index file with the current entries
    pub fn persist(&self) -> Result<()> {
        let mut contents = String::with_capacity(self.entries.len() * 96);
        for (key, entry) in &self.entries {
            contents.push_str(&format!(
                "{}\t{}\t{}\n",
                key,
                entry.etag,
                entry.expires_at.timestamp()
            ));
        }

        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("dat.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&IndexEntry> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert or replace an entry, returning the one it displaced
    pub fn insert(&mut self, key: String, entry: IndexEntry) -> Option<IndexEntry> {
        self.entries.insert(key, entry)
    }

    pub fn remove(&mut self, key: &str) -> Option<IndexEntry> {
        self.entries.remove(key)
    }

    /// Remove every entry, handing them back so a failed persist can undo it
    pub fn take(&mut self) -> BTreeMap<String, IndexEntry> {
        std::mem::take(&mut self.entries)
    }

    pub fn restore(&mut self, entries: BTreeMap<String, IndexEntry>) {
        self.entries = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn keys_where<'a, P>(&'a self, predicate: P) -> impl Iterator<Item = &'a str> + 'a
    where
        P: Fn(&IndexEntry) -> bool + 'a,
    {
        self.entries
            .iter()
            .filter(move |&(_, entry)| predicate(entry))
            .map(|(key, _)| key.as_str())
    }
}

fn parse_entries(text: &str, path: &Path) -> BTreeMap<String, IndexEntry> {
    let mut entries = BTreeMap::new();

    for (number, line) in text.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        match parse_line(line) {
            Ok((key, entry)) => {
                if entries.contains_key(&key) {
                    warn!(path = ?path, line = number + 1, key = %key, "Skipping duplicate index entry");
                    continue;
                }
                entries.insert(key, entry);
            }
            Err(reason) => {
                warn!(path = ?path, line = number + 1, reason, "Skipping malformed index line");
            }
        }
    }

    entries
}

fn parse_line(line: &str) -> std::result::Result<(String, IndexEntry), &'static str> {
    let mut fields = line.split('\t');
    let (Some(key), Some(etag), Some(expires), None) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err("expected three tab-separated fields");
    };

    if key.trim().is_empty() {
        return Err("blank key");
    }

    let secs: i64 = expires
        .trim()
        .parse()
        .map_err(|_| "expiration is not an integer")?;
    let expires_at = DateTime::from_timestamp(secs, 0).ok_or("expiration out of range")?;

    Ok((
        key.to_string(),
        IndexEntry {
            etag: etag.to_string(),
            expires_at,
        },
    ))
}
