//! Bounded cache of rendered share images.
//!
//! Keys are SHA-256 hex digests of the output format and the share
//! parameter, so arbitrarily long payloads cost a fixed 64 bytes each.

#[cfg(test)]
#[path = "cache_test.rs"]
mod cache_test;

use std::num::NonZeroUsize;
use std::sync::Mutex;

use axum::body::Bytes;
use lru::LruCache;
use sha2::{Digest, Sha256};

pub struct RenderCache {
    entries: Mutex<LruCache<String, Bytes>>,
}

impl RenderCache {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self { entries: Mutex::new(LruCache::new(capacity)) }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.get(key).cloned()
    }

    pub fn put(&self, key: String, value: Bytes) {
        let mut entries = self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.put(key, value);
    }

    /// Number of images currently held.
    #[must_use]
    pub fn entries(&self) -> usize {
        self.entries.lock().unwrap_or_else(std::sync::PoisonError::into_inner).len()
    }
}

/// Cache key for one rendering of one share parameter.
#[must_use]
pub fn cache_key(format: &str, param: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format.as_bytes());
    hasher.update([0]);
    hasher.update(param.as_bytes());
    hasher.update([0]);
    hasher.update(value.as_bytes());
    hasher.finalize().iter().map(|b| format!("{b:02x}")).collect::<String>()
}
