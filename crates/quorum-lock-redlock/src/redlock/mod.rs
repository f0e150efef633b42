//! RedLock algorithm implementation for locking across independent stores.
//!
//! See https://redis.io/topics/distlock for a description of the algorithm.

pub mod acquire;
pub mod extend;
pub mod fanout;
pub mod helper;
pub mod release;

pub use fanout::StoreResults;
pub use helper::RedLockHelper;
