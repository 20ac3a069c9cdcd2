//! File-backed key/value cache with TTL expiration and ETag tracking
//!
//! A [`Barrel`] keeps one payload file per key, named by a hash of the key,
//! and a small index file recording each key's ETag and expiration. The
//! [`Store`] trait is the contract consumers such as the HTTP cache use.

mod barrel;
mod content;
mod error;
mod hasher;
mod index;
mod paths;
mod store;
mod types;

pub use barrel::{Barrel, BarrelBuilder};
pub use error::{BarrelError, Result};
pub use hasher::{KeyHasher, Sha256Hasher};
pub use paths::PathResolver;
pub use store::Store;
pub use types::{BarrelConfig, CacheState};
