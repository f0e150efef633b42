//! Error types for quorum lock operations.

use thiserror::Error;

/// Errors that can occur during lock operations.
///
/// Contention is not an error: an acquisition that cannot reach quorum
/// yields `Ok(None)`. Only `with_lock` turns it into [`LockError::Unavailable`].
#[derive(Error, Debug)]
pub enum LockError {
    /// Malformed keys, non-positive TTL, token length or extension threshold.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The resource could not be locked after exhausting all retries.
    #[error("resource is locked: {resource}")]
    Unavailable { resource: String },

    /// An extension did not reach quorum; the lock may no longer be held.
    #[error("failed to extend lock on {resource}")]
    ExtensionFailed { resource: String },

    /// The handle was already released.
    #[error("lock has already been released")]
    Released,

    /// Store connection could not be established.
    #[error("connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A single store failed to execute an operation.
    #[error("backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LockError {
    /// Builds an [`LockError::InvalidParameter`] from any message.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }

    /// Wraps a store-level failure message as [`LockError::Backend`].
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(Box::new(std::io::Error::other(message.into())))
    }
}

/// Result type for lock operations.
pub type LockResult<T> = Result<T, LockError>;
