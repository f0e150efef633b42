//! Tests for lock handle release, extension and auto-extension.

use std::time::{Duration, SystemTime};

use quorum_lock_core::error::LockError;

mod common;
use common::mock_store::{coordinator, stores};

#[tokio::test]
async fn test_release_is_idempotent() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("report", Duration::from_secs(5)).await.unwrap().unwrap();

    assert!(handle.release().await);
    assert!(handle.is_released());
    assert!(!handle.is_valid());
    assert!(handle.release().await);

    for store in &stores {
        assert_eq!(store.release_calls(), 1);
        assert!(store.memory.is_empty());
    }
}

#[tokio::test]
async fn test_release_tolerates_store_failures() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("report", Duration::from_secs(5)).await.unwrap().unwrap();

    stores[0].set_failing(true);
    stores[1].set_failing(true);
    // One store freeing the keys is enough.
    assert!(handle.release().await);
    assert_eq!(stores[2].memory.get("report"), None);
}

#[tokio::test]
async fn test_release_reports_false_when_nothing_released() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("report", Duration::from_secs(5)).await.unwrap().unwrap();

    for store in &stores {
        store.set_failing(true);
    }
    assert!(!handle.release().await);
    assert!(handle.is_released());
    // Later calls are no-ops.
    assert!(handle.release().await);
}

#[tokio::test(start_paused = true)]
async fn test_extend_reuses_original_ttl() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("batch", Duration::from_millis(1_000)).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(500)).await;
    handle.extend(None).await.unwrap();

    assert_eq!(handle.ttl(), Duration::from_millis(1_000));
    assert_eq!(handle.remaining(), Duration::from_millis(1_000));
    for store in &stores {
        assert_eq!(store.memory.ttl("batch"), Some(Duration::from_millis(1_000)));
    }
}

#[tokio::test(start_paused = true)]
async fn test_extend_with_explicit_ttl() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("batch", Duration::from_millis(1_000)).await.unwrap().unwrap();

    handle.extend(Some(Duration::from_millis(5_000))).await.unwrap();
    assert_eq!(handle.remaining(), Duration::from_millis(5_000));
    assert_eq!(handle.ttl(), Duration::from_millis(1_000));

    let invalid = handle.extend(Some(Duration::ZERO)).await;
    assert!(matches!(invalid, Err(LockError::InvalidParameter(_))));
}

#[tokio::test]
async fn test_extend_after_release_fails() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("batch", Duration::from_secs(5)).await.unwrap().unwrap();
    handle.release().await;

    let result = handle.extend(None).await;
    assert!(matches!(result, Err(LockError::Released)));
    for store in &stores {
        assert_eq!(store.extend_calls(), 0);
    }
}

#[tokio::test]
async fn test_extend_requires_quorum() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("batch", Duration::from_secs(5)).await.unwrap().unwrap();
    let expires_at = handle.expires_at();

    stores[0].set_failing_extend(true);
    let minority_failure = handle.extend(None).await;
    assert!(minority_failure.is_ok());

    stores[1].set_failing_extend(true);
    let majority_failure = handle.extend(None).await;
    match majority_failure {
        Err(LockError::ExtensionFailed { resource }) => assert_eq!(resource, "batch"),
        other => panic!("expected ExtensionFailed, got {:?}", other),
    }
    assert!(handle.expires_at() >= expires_at);
}

#[tokio::test(start_paused = true)]
async fn test_expired_handle_cannot_touch_new_holder() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let stale = lock.acquire("slot", Duration::from_millis(100)).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(stale.is_expired());
    assert!(!stale.is_valid());

    let current = lock.acquire("slot", Duration::from_secs(5)).await.unwrap().unwrap();

    assert!(matches!(stale.extend(None).await, Err(LockError::ExtensionFailed { .. })));
    assert!(!stale.release().await);
    for store in &stores {
        assert_eq!(store.memory.get("slot").as_deref(), Some(current.token().as_str()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_expiration_time_tracks_expiry() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("clock", Duration::from_secs(10)).await.unwrap().unwrap();

    let wall_remaining = handle
        .expiration_time()
        .duration_since(SystemTime::now())
        .unwrap();
    assert!(wall_remaining <= Duration::from_millis(9_900));
    assert!(wall_remaining >= Duration::from_millis(9_800));
}

#[tokio::test(start_paused = true)]
async fn test_auto_extension_renews_before_expiry_and_stops_on_failure() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("renewed", Duration::from_millis(3_000)).await.unwrap().unwrap();

    handle.start_auto_extension(Duration::from_millis(1_000)).unwrap();
    assert!(handle.auto_extension_enabled());
    assert_eq!(handle.auto_extension_threshold(), Some(Duration::from_millis(1_000)));

    // Validity is 2970ms, so the first renewal fires at ~1970ms.
    tokio::time::sleep(Duration::from_millis(1_900)).await;
    assert_eq!(stores[0].extend_calls(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(stores[0].extend_calls(), 1);
    assert!(handle.remaining() > Duration::from_millis(2_800));
    assert!(handle.auto_extension_enabled());

    // The next renewal, ~2000ms later, fails on every store.
    for store in &stores {
        store.set_failing(true);
    }
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(stores[0].extend_calls(), 2);
    assert!(!handle.auto_extension_enabled());

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert_eq!(stores[0].extend_calls(), 2);
    assert!(handle.is_expired());
}

#[tokio::test(start_paused = true)]
async fn test_auto_extension_keeps_lock_alive() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("long-job", Duration::from_millis(1_000)).await.unwrap().unwrap();
    handle.start_auto_extension(Duration::from_millis(200)).unwrap();

    tokio::time::sleep(Duration::from_millis(5_000)).await;
    assert!(handle.is_valid());
    assert!(stores[0].extend_calls() >= 5);
    for store in &stores {
        assert_eq!(store.memory.get("long-job").as_deref(), Some(handle.token().as_str()));
    }
}

#[tokio::test(start_paused = true)]
async fn test_stop_auto_extension_cancels_pending_renewal() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("stopped", Duration::from_millis(1_000)).await.unwrap().unwrap();

    handle.start_auto_extension(Duration::from_millis(200)).unwrap();
    handle.stop_auto_extension();
    handle.stop_auto_extension();
    assert!(!handle.auto_extension_enabled());

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(stores[0].extend_calls(), 0);
    assert!(handle.is_expired());
}

#[tokio::test(start_paused = true)]
async fn test_release_stops_auto_extension() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("released", Duration::from_millis(1_000)).await.unwrap().unwrap();

    handle.start_auto_extension(Duration::from_millis(200)).unwrap();
    assert!(handle.release().await);
    assert!(!handle.auto_extension_enabled());

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(stores[0].extend_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_auto_extension() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("dropped", Duration::from_millis(1_000)).await.unwrap().unwrap();
    handle.start_auto_extension(Duration::from_millis(200)).unwrap();
    drop(handle);

    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(stores[0].extend_calls(), 0);
    assert!(stores[0].memory.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_lets_in_flight_extension_complete() {
    let stores = stores(3);
    for store in &stores {
        store.set_delay(Duration::from_millis(100));
    }
    let lock = coordinator(&stores, 0);

    // Acquired at ~100ms with 890ms of validity, so renewal starts at ~790ms
    // and takes 100ms to settle.
    let handle = lock.acquire("in-flight", Duration::from_millis(1_000)).await.unwrap().unwrap();
    handle.start_auto_extension(Duration::from_millis(200)).unwrap();

    tokio::time::sleep(Duration::from_millis(740)).await;
    assert_eq!(stores[0].extend_calls(), 1);
    let before = handle.expires_at();
    handle.stop_auto_extension();
    assert!(!handle.auto_extension_enabled());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.expires_at() > before);
    assert!(handle.remaining() > Duration::from_millis(900));

    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(stores[0].extend_calls(), 1);
    assert!(handle.is_expired());
}

#[tokio::test(start_paused = true)]
async fn test_drop_releases_unreleased_lock() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("abandoned", Duration::from_secs(30)).await.unwrap().unwrap();
    drop(handle);

    tokio::time::sleep(Duration::from_millis(10)).await;
    for store in &stores {
        assert_eq!(store.release_calls(), 1);
        assert_eq!(store.memory.get("abandoned"), None);
    }
}

#[tokio::test(start_paused = true)]
async fn test_drop_after_release_does_not_release_again() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("released-once", Duration::from_secs(30)).await.unwrap().unwrap();
    assert!(handle.release().await);
    drop(handle);

    tokio::time::sleep(Duration::from_millis(10)).await;
    for store in &stores {
        assert_eq!(store.release_calls(), 1);
    }
}

#[tokio::test]
async fn test_start_auto_extension_validation() {
    let stores = stores(3);
    let lock = coordinator(&stores, 0);
    let handle = lock.acquire("validated", Duration::from_secs(5)).await.unwrap().unwrap();

    let zero = handle.start_auto_extension(Duration::ZERO);
    assert!(matches!(zero, Err(LockError::InvalidParameter(_))));
    assert!(!handle.auto_extension_enabled());

    handle.release().await;
    let released = handle.start_auto_extension(Duration::from_millis(500));
    assert!(matches!(released, Err(LockError::Released)));
}
