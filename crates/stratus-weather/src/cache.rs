//! Cache store abstraction and an in-process test store.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use stratus_core::CacheError;

/// Key-value store with per-entry TTL.
///
/// Expiry is the store's job; callers never delete.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// False once the store has been found unreachable.
    fn is_enabled(&self) -> bool;

    /// Stored bytes, or `None` on miss, expiry, or store failure.
    async fn get(&self, key: &str) -> Option<Vec<u8>>;

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError>;
}

#[derive(Debug)]
struct CacheEntry {
    data: Vec<u8>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// In-process TTL store used as the test double for Redis.
///
/// The binary never selects it; `expire` lets tests force a miss.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a key to expire now. Returns whether it was present.
    pub fn expire(&self, key: &str) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| !entry.is_expired());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    fn is_enabled(&self) -> bool {
        true
    }

    async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.data.clone()),
            None => None,
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), CacheError> {
        self.entries.lock().insert(
            key.to_string(),
            CacheEntry {
                data: value.to_vec(),
                stored_at: Instant::now(),
                ttl,
            },
        );
        Ok(())
    }
}
