//! Convenience prelude for quorum lock types.

pub use crate::error::{LockError, LockResult};
pub use crate::keys::{IntoResourceKeys, ResourceKeys};
pub use crate::memory::MemoryLockStore;
pub use crate::store::LockStore;
pub use crate::token::{DEFAULT_TOKEN_LENGTH, LockToken};
