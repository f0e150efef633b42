//! Scoped locking helpers.

use std::future::Future;
use std::time::Duration;

use quorum_lock_core::error::LockError;
use quorum_lock_core::keys::{IntoResourceKeys, ResourceKeys};
use quorum_lock_core::store::LockStore;
use tracing::{instrument, warn};

use crate::lock::QuorumLock;

/// Options for [`QuorumLock::with_lock`].
#[derive(Debug, Clone, Default)]
pub struct WithLockOptions {
    /// Enables auto-extension with this lead time before expiry.
    pub extension_threshold: Option<Duration>,
}

impl WithLockOptions {
    /// Options that keep the lock alive for as long as the closure runs.
    pub fn auto_extend(threshold: Duration) -> Self {
        Self {
            extension_threshold: Some(threshold),
        }
    }
}

impl<S: LockStore> QuorumLock<S> {
    /// Runs `f` while holding a lock on `keys`.
    ///
    /// Acquires (with retries), optionally starts auto-extension, awaits `f`
    /// and then stops auto-extension and releases the lock whether `f`
    /// succeeded or failed. `f`'s output is returned unchanged; lock errors
    /// convert into `E`, contention becoming [`LockError::Unavailable`].
    ///
    /// If `f` panics, dropping the handle during unwinding releases the lock
    /// on a background task.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let total = lock
    ///     .with_lock("ledger", Duration::from_secs(5), WithLockOptions::default(), || async {
    ///         ledger.recompute().await
    ///     })
    ///     .await?;
    /// ```
    #[instrument(skip_all, fields(ttl_ms = ttl.as_millis() as u64))]
    pub async fn with_lock<K, F, Fut, T, E>(
        &self,
        keys: K,
        ttl: Duration,
        options: WithLockOptions,
        f: F,
    ) -> Result<T, E>
    where
        K: IntoResourceKeys,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let keys = ResourceKeys::normalize(keys)?;
        let handle = match self.acquire(&keys, ttl).await? {
            Some(handle) => handle,
            None => {
                return Err(LockError::Unavailable {
                    resource: keys.to_string(),
                }
                .into());
            }
        };

        if let Some(threshold) = options.extension_threshold
            && let Err(e) = handle.start_auto_extension(threshold)
        {
            handle.release().await;
            return Err(e.into());
        }

        let result = f().await;

        handle.stop_auto_extension();
        if !handle.release().await {
            warn!(lock.keys = %keys, "lock was not confirmed released after critical section");
        }
        result
    }
}

/// Wraps an async function so every call runs under a lock.
///
/// Explicit replacement for decorator-style locking: the coordinator is
/// passed in, and `key_fn` derives the resource key(s) from each argument.
///
/// ```rust,ignore
/// let ship = Locked::new(lock.clone(), Duration::from_secs(30), |order: &Order| {
///     format!("order:{}", order.id)
/// }, |order: Order| async move { shipping.ship(order).await });
///
/// ship.call(order).await?;
/// ```
pub struct Locked<S: LockStore, K, F> {
    lock: QuorumLock<S>,
    ttl: Duration,
    options: WithLockOptions,
    key_fn: K,
    f: F,
}

impl<S: LockStore, K, F> Locked<S, K, F> {
    /// Creates a wrapper locking `key_fn(&arg)` for `ttl` around `f(arg)`.
    pub fn new(lock: QuorumLock<S>, ttl: Duration, key_fn: K, f: F) -> Self {
        Self {
            lock,
            ttl,
            options: WithLockOptions::default(),
            key_fn,
            f,
        }
    }

    /// Keeps the lock alive with auto-extension during each call.
    pub fn extension_threshold(mut self, threshold: Duration) -> Self {
        self.options.extension_threshold = Some(threshold);
        self
    }

    /// Calls the wrapped function under the lock.
    pub async fn call<A, R, Fut, T, E>(&self, arg: A) -> Result<T, E>
    where
        K: Fn(&A) -> R,
        R: IntoResourceKeys,
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<LockError>,
    {
        let keys = (self.key_fn)(&arg);
        self.lock
            .with_lock(keys, self.ttl, self.options.clone(), || (self.f)(arg))
            .await
    }
}
