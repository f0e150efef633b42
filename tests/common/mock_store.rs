//! Instrumented in-memory store for coordinator tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use quorum_lock_core::error::{LockError, LockResult};
use quorum_lock_core::keys::ResourceKeys;
use quorum_lock_core::memory::MemoryLockStore;
use quorum_lock_core::store::LockStore;
use quorum_lock_core::token::LockToken;
use quorum_lock_redlock::QuorumLock;

/// Mock store that can simulate outages, slow responses and count calls.
#[derive(Default)]
pub struct MockStore {
    pub memory: MemoryLockStore,
    failing: AtomicBool,
    failing_extend: AtomicBool,
    delay_ms: AtomicU64,
    acquire_calls: AtomicUsize,
    release_calls: AtomicUsize,
    extend_calls: AtomicUsize,
}

impl MockStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Every operation fails while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Only `extend` fails while set.
    pub fn set_failing_extend(&self, failing: bool) {
        self.failing_extend.store(failing, Ordering::SeqCst);
    }

    /// Every operation sleeps this long before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn acquire_calls(&self) -> usize {
        self.acquire_calls.load(Ordering::SeqCst)
    }

    pub fn release_calls(&self) -> usize {
        self.release_calls.load(Ordering::SeqCst)
    }

    pub fn extend_calls(&self) -> usize {
        self.extend_calls.load(Ordering::SeqCst)
    }

    async fn simulate(&self) -> LockResult<()> {
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(LockError::backend("simulated store outage"));
        }
        Ok(())
    }
}

impl LockStore for MockStore {
    async fn acquire(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> LockResult<bool> {
        self.acquire_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        self.memory.acquire(keys, token, ttl).await
    }

    async fn release(&self, keys: &ResourceKeys, token: &LockToken) -> LockResult<u64> {
        self.release_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        self.memory.release(keys, token).await
    }

    async fn extend(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> LockResult<bool> {
        self.extend_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;
        if self.failing_extend.load(Ordering::SeqCst) {
            return Err(LockError::backend("simulated extend failure"));
        }
        self.memory.extend(keys, token, ttl).await
    }
}

/// Creates `count` mock stores.
pub fn stores(count: usize) -> Vec<Arc<MockStore>> {
    (0..count).map(|_| MockStore::new()).collect()
}

/// Builds a coordinator over the given stores with a fixed 200ms retry delay.
pub fn coordinator(
    stores: &[Arc<MockStore>],
    max_retry_attempts: u32,
) -> QuorumLock<Arc<MockStore>> {
    QuorumLock::builder()
        .stores(stores.iter().cloned())
        .retry_delay(Duration::from_millis(200))
        .retry_jitter(Duration::ZERO)
        .max_retry_attempts(max_retry_attempts)
        .build()
        .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_store_counts_calls() {
        let store = MockStore::new();
        let keys = ResourceKeys::normalize("k").unwrap();
        let token = LockToken::generate();

        assert!(store.acquire(&keys, &token, Duration::from_secs(1)).await.unwrap());
        assert_eq!(store.acquire_calls(), 1);
        assert_eq!(store.memory.get("k").as_deref(), Some(token.as_str()));
    }

    #[tokio::test]
    async fn test_mock_store_outage() {
        let store = MockStore::new();
        store.set_failing(true);
        let keys = ResourceKeys::normalize("k").unwrap();

        let token = LockToken::generate();
        assert!(store.acquire(&keys, &token, Duration::from_secs(1)).await.is_err());
        assert!(store.memory.is_empty());
    }
}
