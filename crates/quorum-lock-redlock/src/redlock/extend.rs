//! RedLock extend algorithm implementation.

use std::sync::Arc;
use std::time::Duration;

use quorum_lock_core::keys::ResourceKeys;
use quorum_lock_core::store::LockStore;
use quorum_lock_core::token::LockToken;

use super::fanout::settle_all;
use super::helper::RedLockHelper;

/// Extends `token`'s keys on every store.
///
/// Requires majority consensus: an extension that only reached a minority of
/// stores does not prolong mutual exclusion.
pub async fn extend_redlock<S: LockStore>(
    stores: &[Arc<S>],
    keys: &ResourceKeys,
    token: &LockToken,
    ttl: Duration,
) -> bool {
    let keys = keys.clone();
    let token = token.clone();
    let outcome = settle_all(
        "extend",
        stores,
        move |store| {
            let keys = keys.clone();
            let token = token.clone();
            async move { store.extend(&keys, &token, ttl).await }
        },
        |extended: &bool| *extended,
    )
    .await;

    RedLockHelper::has_sufficient_successes(outcome.success_count(), stores.len())
}
