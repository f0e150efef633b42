//! Resource key normalization.

use std::fmt;
use std::sync::Arc;

use tracing::warn;

use crate::error::{LockError, LockResult};

/// Validated, deduplicated and lexicographically sorted set of resource keys.
///
/// Every acquisition works on a `ResourceKeys`. Sorting gives independent
/// callers requesting overlapping key sets the same ordering.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ResourceKeys(Arc<[String]>);

impl ResourceKeys {
    /// Normalizes a single key or a collection of keys.
    ///
    /// Fails with [`LockError::InvalidParameter`] when no key is given or any
    /// key is empty. Duplicates are removed with a warning.
    pub fn normalize(input: impl IntoResourceKeys) -> LockResult<Self> {
        let mut keys = input.into_key_list();
        if keys.is_empty() {
            return Err(LockError::invalid("at least one resource key is required"));
        }
        if keys.iter().any(|key| key.is_empty()) {
            return Err(LockError::invalid("resource keys must be non-empty strings"));
        }

        let requested = keys.len();
        keys.sort();
        keys.dedup();
        if keys.len() != requested {
            warn!(
                requested,
                unique = keys.len(),
                "duplicate resource keys removed from lock request"
            );
        }

        Ok(Self(keys.into()))
    }

    /// Returns the keys in sorted order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no keys. Never the case once normalized.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the keys in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl fmt::Display for ResourceKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

impl fmt::Debug for ResourceKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

/// Anything that can name one or more lockable resources.
pub trait IntoResourceKeys {
    /// Converts into the raw, not yet validated key list.
    fn into_key_list(self) -> Vec<String>;
}

impl IntoResourceKeys for ResourceKeys {
    fn into_key_list(self) -> Vec<String> {
        self.0.to_vec()
    }
}

impl IntoResourceKeys for &ResourceKeys {
    fn into_key_list(self) -> Vec<String> {
        self.0.to_vec()
    }
}

impl IntoResourceKeys for &str {
    fn into_key_list(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoResourceKeys for String {
    fn into_key_list(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoResourceKeys for &String {
    fn into_key_list(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<T: AsRef<str>> IntoResourceKeys for Vec<T> {
    fn into_key_list(self) -> Vec<String> {
        self.iter().map(|k| k.as_ref().to_string()).collect()
    }
}

impl<T: AsRef<str>> IntoResourceKeys for &[T] {
    fn into_key_list(self) -> Vec<String> {
        self.iter().map(|k| k.as_ref().to_string()).collect()
    }
}

impl<T: AsRef<str>, const N: usize> IntoResourceKeys for [T; N] {
    fn into_key_list(self) -> Vec<String> {
        self.iter().map(|k| k.as_ref().to_string()).collect()
    }
}
