//! On-disk payload storage, one file per hashed key

use crate::error::{BarrelError, Result};
use crate::index::INDEX_FILE_NAME;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

pub(crate) struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Write a payload, creating the directory on first use
    pub fn write(&self, hash: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(hash)?;
        fs::create_dir_all(&self.dir)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn read(&self, hash: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path_for(hash)?) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a payload; a missing file is not an error
    pub fn delete(&self, hash: &str) -> Result<()> {
        match fs::remove_file(self.path_for(hash)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove everything in the directory, referenced or not
    pub fn wipe(&self) -> Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                fs::remove_dir_all(entry.path())?;
            } else {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn path_for(&self, hash: &str) -> Result<PathBuf> {
        let unsafe_name = hash.is_empty()
            || hash == "."
            || hash == ".."
            || hash.starts_with(INDEX_FILE_NAME)
            || hash.contains(['/', '\\', '\0']);
        if unsafe_name {
            return Err(BarrelError::InvalidArgument(format!(
                "Key hasher produced an unusable file name: {:?}",
                hash
            )));
        }
        Ok(self.dir.join(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_directory() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("lazy"));
        assert!(!store.dir.exists());

        store.write("AB-CD", b"payload").unwrap();
        assert_eq!(store.read("AB-CD").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());

        store.write("AB", b"first").unwrap();
        store.write("AB", b"second").unwrap();
        assert_eq!(store.read("AB").unwrap(), Some(b"second".to_vec()));
    }

    #[test]
    fn test_read_missing_is_none() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        assert_eq!(store.read("missing").unwrap(), None);
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());

        store.write("AB", b"data").unwrap();
        store.delete("AB").unwrap();
        store.delete("AB").unwrap();
        assert_eq!(store.read("AB").unwrap(), None);
    }

    #[test]
    fn test_unusable_file_names_rejected() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());

        for name in ["", ".", "..", "idx.dat", "a/b", "a\\b"] {
            assert!(
                matches!(store.write(name, b"x"), Err(BarrelError::InvalidArgument(_))),
                "expected {:?} to be rejected",
                name
            );
        }
    }

    #[test]
    fn test_wipe_removes_everything() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("cache"));
        store.write("AA", b"1").unwrap();
        store.write("BB", b"2").unwrap();
        fs::create_dir_all(store.dir.join("stray")).unwrap();

        store.wipe().unwrap();
        assert_eq!(fs::read_dir(store.dir).unwrap().count(), 0);
    }

    #[test]
    fn test_wipe_missing_directory_is_ok() {
        let dir = tempdir().unwrap();
        let store = ContentStore::new(dir.path().join("never-created"));
        assert!(store.wipe().is_ok());
    }
}
