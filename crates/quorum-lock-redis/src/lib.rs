//! Redis backend for quorum-based distributed locks.

pub mod provider;
pub mod scripts;
pub mod store;

pub use provider::{RedisLockProvider, RedisLockProviderBuilder};
pub use store::RedisLockStore;
