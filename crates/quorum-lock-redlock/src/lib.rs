//! RedLock coordinator over any set of [`LockStore`]s.
//!
//! [`QuorumLock`] fans every operation out to all configured stores and
//! trusts an acquisition only when a majority accepted it within the lock's
//! drift-adjusted validity window. Acquisitions return a [`QuorumLockHandle`]
//! that can be extended, auto-extended in the background and released.
//!
//! [`LockStore`]: quorum_lock_core::LockStore

pub mod builder;
pub mod handle;
pub mod lock;
pub mod options;
pub mod redlock;
pub mod with_lock;

pub use builder::QuorumLockBuilder;
pub use handle::{DEFAULT_EXTENSION_THRESHOLD, QuorumLockHandle};
pub use lock::QuorumLock;
pub use options::{MAX_DRIFT_FACTOR, RedLockOptions};
pub use redlock::{RedLockHelper, StoreResults};
pub use with_lock::{Locked, WithLockOptions};
