//! RedLock release algorithm implementation.

use std::sync::Arc;

use quorum_lock_core::keys::ResourceKeys;
use quorum_lock_core::store::LockStore;
use quorum_lock_core::token::LockToken;

use super::fanout::settle_all;

/// Releases `token`'s keys on every store.
///
/// Best effort: succeeds when at least one store deleted a key. Stores that
/// keep a stale copy let it expire through its TTL, and any later acquirer
/// simply fails on them until then.
pub async fn release_redlock<S: LockStore>(
    stores: &[Arc<S>],
    keys: &ResourceKeys,
    token: &LockToken,
) -> bool {
    let keys = keys.clone();
    let token = token.clone();
    let outcome = settle_all(
        "release",
        stores,
        move |store| {
            let keys = keys.clone();
            let token = token.clone();
            async move { store.release(&keys, &token).await }
        },
        |deleted: &u64| *deleted > 0,
    )
    .await;

    outcome.success_count() > 0
}
