//! Core types for quorum-based distributed locks.
//!
//! This crate holds what every other crate in the workspace shares: the
//! [`LockError`] taxonomy, ownership [`LockToken`]s, normalized
//! [`ResourceKeys`] and the [`LockStore`] contract a backing store must meet.

pub mod error;
pub mod keys;
pub mod memory;
pub mod prelude;
pub mod store;
pub mod token;

pub use error::{LockError, LockResult};
pub use prelude::*;
