//! Quorum lock coordinator.

use std::sync::Arc;
use std::time::Duration;

use quorum_lock_core::error::{LockError, LockResult};
use quorum_lock_core::keys::{IntoResourceKeys, ResourceKeys};
use quorum_lock_core::store::LockStore;
use quorum_lock_core::token::LockToken;
use tracing::field::{Empty, display};
use tracing::{Instrument, Span, instrument, warn};

use crate::builder::QuorumLockBuilder;
use crate::handle::QuorumLockHandle;
use crate::options::RedLockOptions;
use crate::redlock::acquire::acquire_redlock;
use crate::redlock::extend::extend_redlock;
use crate::redlock::helper::RedLockHelper;
use crate::redlock::release::release_redlock;

/// State shared between a coordinator and the handles it hands out.
pub(crate) struct LockInner<S> {
    pub(crate) stores: Vec<Arc<S>>,
    pub(crate) options: RedLockOptions,
}

/// Coordinates locks across N independent stores using the RedLock algorithm.
///
/// An acquisition succeeds when a majority of stores (`floor(N/2) + 1`)
/// accepted it and enough of the TTL remains once clock drift and the time
/// spent coordinating are subtracted. Cloning is cheap; clones share stores.
///
/// # Example
///
/// ```rust,ignore
/// let lock = QuorumLock::builder()
///     .stores(vec![MemoryLockStore::new(), MemoryLockStore::new(), MemoryLockStore::new()])
///     .build()?;
///
/// if let Some(handle) = lock.acquire("invoice:42", Duration::from_secs(10)).await? {
///     issue_invoice().await;
///     handle.release().await;
/// }
/// ```
pub struct QuorumLock<S: LockStore> {
    inner: Arc<LockInner<S>>,
}

impl<S: LockStore> Clone for QuorumLock<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: LockStore> QuorumLock<S> {
    /// Returns a new builder for configuring the coordinator.
    pub fn builder() -> QuorumLockBuilder<S> {
        QuorumLockBuilder::new()
    }

    /// Creates a coordinator over `stores` with default options.
    pub fn new(stores: Vec<S>) -> LockResult<Self> {
        Self::with_options(stores, RedLockOptions::default())
    }

    /// Creates a coordinator over `stores` with the given options.
    pub fn with_options(stores: Vec<S>, options: RedLockOptions) -> LockResult<Self> {
        if stores.is_empty() {
            return Err(LockError::invalid("at least one lock store is required"));
        }
        options.validate()?;

        Ok(Self {
            inner: Arc::new(LockInner {
                stores: stores.into_iter().map(Arc::new).collect(),
                options,
            }),
        })
    }

    /// Returns the number of configured stores.
    pub fn store_count(&self) -> usize {
        self.inner.stores.len()
    }

    /// Returns how many stores must agree for an acquisition or extension.
    pub fn quorum(&self) -> usize {
        RedLockHelper::quorum(self.store_count())
    }

    /// Returns the coordinator options.
    pub fn options(&self) -> &RedLockOptions {
        &self.inner.options
    }

    /// Acquires a lock on one or more keys, retrying with jitter.
    ///
    /// Makes one attempt plus up to `max_retry_attempts` retries, pausing
    /// `retry_delay + random(0..=retry_jitter)` between them.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(handle))` - Lock acquired on a quorum of stores
    /// * `Ok(None)` - Every attempt was rejected; try again later
    /// * `Err(LockError::InvalidParameter)` - Malformed keys or TTL
    #[instrument(
        skip(self, keys),
        fields(
            lock.keys = Empty,
            ttl_ms = ttl.as_millis() as u64,
            stores = self.store_count(),
            successes = Empty,
            acquired = Empty,
            attempts = Empty,
        )
    )]
    pub async fn acquire(
        &self,
        keys: impl IntoResourceKeys,
        ttl: Duration,
    ) -> LockResult<Option<QuorumLockHandle<S>>> {
        let keys = ResourceKeys::normalize(keys)?;
        let ttl = RedLockHelper::positive_millis(ttl, "ttl")?;
        Span::current().record("lock.keys", display(&keys));

        let total_attempts = self.inner.options.total_attempts();
        for attempt in 0..total_attempts {
            if let Some(handle) = self.attempt(&keys, ttl).await {
                Span::current().record("acquired", true);
                Span::current().record("attempts", attempt + 1);
                return Ok(Some(handle));
            }

            if attempt + 1 < total_attempts {
                let delay = RedLockHelper::retry_delay(
                    self.inner.options.retry_delay(),
                    self.inner.options.retry_jitter(),
                );
                tokio::time::sleep(delay).await;
            }
        }

        Span::current().record("acquired", false);
        Span::current().record("attempts", total_attempts);
        Ok(None)
    }

    /// Makes a single acquisition attempt without retrying.
    #[instrument(
        skip(self, keys),
        fields(
            lock.keys = Empty,
            ttl_ms = ttl.as_millis() as u64,
            stores = self.store_count(),
            successes = Empty,
            acquired = Empty,
        )
    )]
    pub async fn try_acquire(
        &self,
        keys: impl IntoResourceKeys,
        ttl: Duration,
    ) -> LockResult<Option<QuorumLockHandle<S>>> {
        let keys = ResourceKeys::normalize(keys)?;
        let ttl = RedLockHelper::positive_millis(ttl, "ttl")?;
        Span::current().record("lock.keys", display(&keys));

        let handle = self.attempt(&keys, ttl).await;
        Span::current().record("acquired", handle.is_some());
        Ok(handle)
    }

    /// Runs one attempt on its own task.
    ///
    /// The attempt settles even if the caller's future is dropped. A rejected
    /// attempt cleans up after itself and an unclaimed handle releases on drop.
    async fn attempt(&self, keys: &ResourceKeys, ttl: Duration) -> Option<QuorumLockHandle<S>> {
        let inner = self.inner.clone();
        let keys = keys.clone();
        let attempt = tokio::spawn(
            async move {
                let result =
                    acquire_redlock(&inner.stores, &keys, ttl, inner.options.drift_factor).await?;
                Some(QuorumLockHandle::new(
                    keys,
                    result.token,
                    ttl,
                    result.expires_at,
                    LockAuthority { inner },
                ))
            }
            .instrument(Span::current()),
        );

        match attempt.await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "acquire attempt did not complete");
                None
            }
        }
    }
}

/// The privileged release/extend surface a handle gets from its coordinator.
///
/// Handles never touch stores directly; everything they may do to them goes
/// through this capability.
pub(crate) struct LockAuthority<S> {
    inner: Arc<LockInner<S>>,
}

impl<S: LockStore> LockAuthority<S> {
    /// Best-effort release; true when at least one store deleted a key.
    pub(crate) async fn release(&self, keys: &ResourceKeys, token: &LockToken) -> bool {
        release_redlock(&self.inner.stores, keys, token).await
    }

    /// Quorum extension; true only when a majority reset the TTL.
    pub(crate) async fn extend(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> bool {
        extend_redlock(&self.inner.stores, keys, token, ttl).await
    }
}
