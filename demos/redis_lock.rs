//! Example: Using Redis quorum locks
//!
//! Run with: `cargo run --example redis_lock`
//!
//! Requires Redis servers. Set REDIS_URLS to a comma-separated list of
//! independent servers, or REDIS_URL for a single one.

use quorum_lock::RedisLockProvider;
use quorum_lock::{LockError, WithLockOptions};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let urls: Vec<String> = std::env::var("REDIS_URLS")
        .or_else(|_| std::env::var("REDIS_URL"))
        .unwrap_or_else(|_| "redis://localhost:6379".to_string())
        .split(',')
        .map(|url| url.trim().to_string())
        .collect();

    println!("Connecting to {} Redis server(s)...", urls.len());
    let lock = RedisLockProvider::builder()
        .urls(&urls)
        .key_prefix("example:")
        .build()
        .await?;
    println!("Created quorum lock (quorum {})", lock.quorum());

    // Acquire the lock and keep it alive in the background
    println!("Acquiring lock...");
    let handle = lock
        .acquire("example-resource", Duration::from_secs(10))
        .await?
        .ok_or("resource is busy")?;
    handle.start_auto_extension(Duration::from_secs(2))?;
    println!("Lock acquired! (will be automatically extended)");

    println!("Doing long-running work...");
    tokio::time::sleep(Duration::from_secs(15)).await;
    println!("Work completed");

    handle.release().await;
    println!("Lock released");

    // Scoped locking
    let result = lock
        .with_lock(
            ["invoice:17", "customer:3"],
            Duration::from_secs(5),
            WithLockOptions::default(),
            || async { Ok::<_, LockError>("invoice settled") },
        )
        .await?;
    println!("{}", result);

    Ok(())
}
