//! The contract every backing store must satisfy.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::LockResult;
use crate::keys::ResourceKeys;
use crate::token::LockToken;

// ============================================================================
// Lock Store Trait
// ============================================================================

/// One independent backing store taking part in a lock quorum.
///
/// Each operation receives the full normalized key set and must act on all of
/// the keys as a single atomic unit within this store: a server-side script,
/// a transaction, or a compare-and-swap loop all qualify. Stores must support
/// TTL-bounded keys so that abandoned locks expire on their own.
///
/// Errors returned from these methods are never surfaced to lock callers; the
/// coordinator counts them as failures for the store that produced them.
///
/// # Example
///
/// ```rust,ignore
/// let keys = ResourceKeys::normalize(["a", "b"])?;
/// let token = LockToken::generate();
///
/// if store.acquire(&keys, &token, Duration::from_secs(10)).await? {
///     // both keys now hold `token` on this store
///     store.release(&keys, &token).await?;
/// }
/// ```
pub trait LockStore: Send + Sync + 'static {
    /// Sets every key to `token` with the given TTL iff none of the keys exist.
    ///
    /// Returns `false` without mutating anything when any key is present.
    fn acquire(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<bool>> + Send;

    /// Deletes every key whose current value equals `token`.
    ///
    /// Keys held by a different token are left untouched. Returns the number
    /// of keys deleted.
    fn release(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
    ) -> impl Future<Output = LockResult<u64>> + Send;

    /// Resets every key to `token` with the new TTL iff all keys hold `token`.
    ///
    /// If any key is missing or owned by someone else nothing is mutated and
    /// `false` is returned.
    fn extend(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<bool>> + Send;
}

impl<S: LockStore> LockStore for Arc<S> {
    fn acquire(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<bool>> + Send {
        (**self).acquire(keys, token, ttl)
    }

    fn release(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
    ) -> impl Future<Output = LockResult<u64>> + Send {
        (**self).release(keys, token)
    }

    fn extend(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> impl Future<Output = LockResult<bool>> + Send {
        (**self).extend(keys, token, ttl)
    }
}
