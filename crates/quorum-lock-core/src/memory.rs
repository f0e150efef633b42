//! In-process lock store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::LockResult;
use crate::keys::ResourceKeys;
use crate::store::LockStore;
use crate::token::LockToken;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// A TTL-aware key/value map implementing [`LockStore`] in memory.
///
/// Every operation runs under one mutex, which makes it atomic across all
/// keys of a request. Useful for tests, benchmarks and single-process use.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryLockStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live value stored under `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.entries()
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Returns the remaining TTL of `key`, if it is live.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries()
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.expires_at - now)
    }

    /// Stores `value` under `key` unconditionally.
    pub fn set(&self, key: &str, value: &str, ttl: Duration) {
        self.entries().insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Returns the number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries().values().filter(|e| e.is_live(now)).count()
    }

    /// Returns true if no live key is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the map and drops expired entries first.
    fn live_entries(&self, now: Instant) -> MutexGuard<'_, HashMap<String, Entry>> {
        let mut entries = self.entries();
        entries.retain(|_, entry| entry.is_live(now));
        entries
    }
}

impl LockStore for MemoryLockStore {
    async fn acquire(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> LockResult<bool> {
        let now = Instant::now();
        let mut entries = self.live_entries(now);

        if keys.iter().any(|key| entries.contains_key(key)) {
            return Ok(false);
        }

        for key in keys.iter() {
            entries.insert(
                key.to_string(),
                Entry {
                    value: token.as_str().to_string(),
                    expires_at: now + ttl,
                },
            );
        }
        Ok(true)
    }

    async fn release(&self, keys: &ResourceKeys, token: &LockToken) -> LockResult<u64> {
        let now = Instant::now();
        let mut entries = self.live_entries(now);

        let mut deleted = 0;
        for key in keys.iter() {
            if entries.get(key).is_some_and(|e| e.value == token.as_str()) {
                entries.remove(key);
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn extend(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> LockResult<bool> {
        let now = Instant::now();
        let mut entries = self.live_entries(now);

        let owns_all = keys
            .iter()
            .all(|key| entries.get(key).is_some_and(|e| e.value == token.as_str()));
        if !owns_all {
            return Ok(false);
        }

        for key in keys.iter() {
            if let Some(entry) = entries.get_mut(key) {
                entry.expires_at = now + ttl;
            }
        }
        Ok(true)
    }
}
