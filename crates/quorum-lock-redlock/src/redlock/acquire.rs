//! RedLock acquire algorithm implementation.

use std::sync::Arc;
use std::time::Duration;

use quorum_lock_core::keys::ResourceKeys;
use quorum_lock_core::store::LockStore;
use quorum_lock_core::token::LockToken;
use tokio::time::Instant;
use tracing::{Span, debug};

use super::fanout::settle_all;
use super::helper::RedLockHelper;
use super::release::release_redlock;

/// Result of one accepted RedLock acquire attempt.
#[derive(Debug)]
pub struct RedLockAcquireResult {
    /// Token written to the accepting stores.
    pub token: LockToken,
    /// Monotonic instant at which the lock must be assumed lost.
    pub expires_at: Instant,
}

/// Runs a single acquire attempt across every store.
///
/// A fresh token is generated, `Acquire` is fanned out to all stores and the
/// attempt is accepted when a quorum succeeded and
/// `ttl - elapsed - drift` leaves more than 1ms. A rejected attempt releases
/// its token on every store before returning `None`; stores that never set
/// the token treat that as a no-op.
///
/// The store success count is recorded as `successes` on the current span.
pub async fn acquire_redlock<S: LockStore>(
    stores: &[Arc<S>],
    keys: &ResourceKeys,
    ttl: Duration,
    drift_factor: f64,
) -> Option<RedLockAcquireResult> {
    let token = LockToken::generate();
    let start = Instant::now();

    let store_results = {
        let keys = keys.clone();
        let token = token.clone();
        settle_all(
            "acquire",
            stores,
            move |store| {
                let keys = keys.clone();
                let token = token.clone();
                async move { store.acquire(&keys, &token, ttl).await }
            },
            |acquired: &bool| *acquired,
        )
        .await
    };

    let elapsed = start.elapsed();
    let success_count = store_results.success_count();
    Span::current().record("successes", success_count);
    let validity_millis = RedLockHelper::effective_validity_millis(ttl, elapsed, drift_factor);

    if RedLockHelper::is_acquisition_valid(success_count, stores.len(), validity_millis) {
        let validity = Duration::from_millis(validity_millis.unsigned_abs());
        return Some(RedLockAcquireResult {
            token,
            expires_at: Instant::now() + validity,
        });
    }

    debug!(
        successes = success_count,
        quorum = RedLockHelper::quorum(stores.len()),
        elapsed_ms = elapsed.as_millis() as u64,
        validity_ms = validity_millis,
        "acquire attempt rejected, cleaning up"
    );
    release_redlock(stores, keys, &token).await;
    None
}
