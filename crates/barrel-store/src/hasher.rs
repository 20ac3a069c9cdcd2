//! Key to content file name hashing

use sha2::{Digest, Sha256};

/// Maps a cache key to a stable, filesystem-safe content file name.
///
/// The returned token is the persistent file name of the key's payload, so an
/// implementation must be deterministic across runs. Swapping the hasher for a
/// directory that already holds entries orphans every existing payload.
pub trait KeyHasher: Send + Sync {
    fn hash_key(&self, key: &str) -> String;
}

/// SHA-256 over the UTF-8 bytes of the key, rendered as uppercase hex pairs
/// joined by hyphens (`"0A-1B-..."`)
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl KeyHasher for Sha256Hasher {
    fn hash_key(&self, key: &str) -> String {
        let digest = Sha256::digest(key.as_bytes());
        digest
            .iter()
            .map(|byte| hex::encode_upper([*byte]))
            .collect::<Vec<_>>()
            .join("-")
    }
}

impl<F> KeyHasher for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn hash_key(&self, key: &str) -> String {
        self(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_hasher_is_deterministic() {
        let first = Sha256Hasher.hash_key("http://montemagno.com/monkeys.json");
        let second = Sha256Hasher.hash_key("http://montemagno.com/monkeys.json");
        let other = Sha256Hasher.hash_key("http://montemagno.com/monkeys.xml");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_sha256_hasher_format() {
        let hash = Sha256Hasher.hash_key("abc");

        // 32 bytes, two hex digits each, 31 separators
        assert_eq!(hash.len(), 32 * 2 + 31);
        assert!(hash.starts_with("BA-78-16-BF"));
        assert!(hash
            .chars()
            .all(|c| c == '-' || c.is_ascii_digit() || c.is_ascii_uppercase()));
    }

    #[test]
    fn test_closure_hasher() {
        let hasher = |key: &str| key.len().to_string();
        assert_eq!(hasher.hash_key("four"), "4");
    }
}
