//! Example: Quorum locks over in-memory stores
//!
//! Run with: `cargo run --example memory_lock`
//!
//! Set RUST_LOG=quorum_lock_redlock=debug to watch the coordinator.

use quorum_lock::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Five independent stores; any three form a quorum
    let stores: Vec<Arc<MemoryLockStore>> =
        (0..5).map(|_| Arc::new(MemoryLockStore::new())).collect();
    let lock = QuorumLock::builder()
        .stores(stores.iter().cloned())
        .max_retry_attempts(2)
        .build()?;
    println!("Coordinating {} stores (quorum {})", lock.store_count(), lock.quorum());

    // Acquire a lock spanning two keys
    let handle = lock
        .acquire(["account:1", "account:2"], Duration::from_secs(5))
        .await?
        .ok_or("accounts are busy")?;
    println!(
        "Lock acquired on {} ({}ms of validity left)",
        handle.resource_keys(),
        handle.remaining().as_millis()
    );

    // A second caller only gets `None`
    let contender = lock.try_acquire("account:2", Duration::from_secs(5)).await?;
    println!("Contender acquired account:2? {}", contender.is_some());

    // Keep the lock alive while doing work
    handle.extend(Some(Duration::from_secs(10))).await?;
    println!("Extended; {}ms left", handle.remaining().as_millis());

    handle.release().await;
    println!("Lock released");

    // Scoped locking: acquire, auto-extend, run and release
    let total = lock
        .with_lock(
            "report",
            Duration::from_secs(2),
            WithLockOptions::auto_extend(Duration::from_millis(500)),
            || async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Ok::<_, LockError>(42)
            },
        )
        .await?;
    println!("Report computed under lock: {}", total);

    Ok(())
}
