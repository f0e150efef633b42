//! Quorum-based distributed locks for Rust.
//!
//! This crate coordinates named resource locks across N independent,
//! failure-prone backing stores using a RedLock-style algorithm: a lock is
//! held only when a majority of stores accepted it and enough of its TTL
//! remains after coordination time and clock drift are accounted for.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use quorum_lock::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Three independent stores (example: in-memory)
//!     let lock = QuorumLock::builder()
//!         .stores((0..3).map(|_| MemoryLockStore::new()))
//!         .build()?;
//!
//!     // Acquire one or more keys; `None` means "busy, try later"
//!     if let Some(handle) = lock.acquire("my-resource", Duration::from_secs(10)).await? {
//!         // Critical section - we hold the lock on a quorum of stores
//!         println!("Doing critical work...");
//!
//!         handle.release().await;
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Scoped locking
//!
//! [`QuorumLock::with_lock`] acquires, optionally keeps the lock alive with
//! auto-extension, runs a closure and always releases afterwards:
//!
//! ```rust,no_run
//! # use quorum_lock::*;
//! # use std::time::Duration;
//! # async fn run(lock: QuorumLock<MemoryLockStore>) -> Result<(), LockError> {
//! let report = lock
//!     .with_lock(
//!         ["account:1", "account:2"],
//!         Duration::from_secs(5),
//!         WithLockOptions::auto_extend(Duration::from_secs(1)),
//!         || async { Ok::<_, LockError>("transferred") },
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Backends
//!
//! ## Redis Backend
//!
//! Each server runs the lock operations as Lua scripts.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), quorum_lock::LockError> {
//! use quorum_lock::RedisLockProvider;
//!
//! let lock = RedisLockProvider::builder()
//!     .urls(&["redis://a:6379", "redis://b:6379", "redis://c:6379"])
//!     .build()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Backends
//!
//! Implement [`LockStore`] for anything offering an atomic multi-key
//! compare-and-mutate primitive with TTLs.
//!
//! # Crate Organization
//!
//! This is a meta-crate that re-exports types from:
//! - `quorum-lock-core`: errors, tokens, key sets and the store contract
//! - `quorum-lock-redlock`: the coordinator, handles and scoped helpers
//! - `quorum-lock-redis`: Redis backend

// Re-export core types and traits
pub use quorum_lock_core::*;

// Re-export the coordinator
#[allow(ambiguous_glob_reexports)]
pub use quorum_lock_redlock::*;

// Re-export redis backend
#[allow(ambiguous_glob_reexports)]
pub use quorum_lock_redis::*;
