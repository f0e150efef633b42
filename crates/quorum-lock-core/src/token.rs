//! Ownership token generation.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;

use crate::error::{LockError, LockResult};

/// Default token length in characters.
pub const DEFAULT_TOKEN_LENGTH: usize = 22;

/// Opaque random value proving ownership of one acquisition.
///
/// A fresh token is drawn for every acquisition attempt, so a retry never
/// reuses the value of a rejected attempt.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    /// Generates a token of [`DEFAULT_TOKEN_LENGTH`] characters.
    pub fn generate() -> Self {
        Self(random_string(DEFAULT_TOKEN_LENGTH))
    }

    /// Generates a token of exactly `length` base64 characters.
    ///
    /// Draws `ceil(length * 3 / 4)` bytes from the operating system RNG,
    /// encodes them and truncates the encoding to `length`.
    pub fn with_length(length: usize) -> LockResult<Self> {
        if length == 0 {
            return Err(LockError::invalid("token length must be positive"));
        }
        Ok(Self(random_string(length)))
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn random_string(length: usize) -> String {
    let mut bytes = vec![0u8; (length * 3).div_ceil(4)];
    OsRng.fill_bytes(&mut bytes);
    let mut encoded = STANDARD.encode(&bytes);
    encoded.truncate(length);
    encoded
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Tokens prove ownership; keep them out of debug logs.
impl fmt::Debug for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("LockToken").field(&"<redacted>").finish()
    }
}

impl AsRef<str> for LockToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
