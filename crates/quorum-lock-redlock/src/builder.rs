//! Builder for quorum lock coordinators.

use std::time::Duration;

use quorum_lock_core::error::LockResult;
use quorum_lock_core::store::LockStore;

use crate::lock::QuorumLock;
use crate::options::RedLockOptions;

/// Builder for [`QuorumLock`] configuration.
pub struct QuorumLockBuilder<S> {
    stores: Vec<S>,
    options: RedLockOptions,
}

impl<S: LockStore> QuorumLockBuilder<S> {
    /// Creates a new builder with default settings and no stores.
    pub fn new() -> Self {
        Self {
            stores: Vec::new(),
            options: RedLockOptions::default(),
        }
    }

    /// Adds one store.
    ///
    /// For fault tolerance use an odd number of independent stores (3 or 5).
    pub fn store(mut self, store: S) -> Self {
        self.stores.push(store);
        self
    }

    /// Adds several stores.
    pub fn stores(mut self, stores: impl IntoIterator<Item = S>) -> Self {
        self.stores.extend(stores);
        self
    }

    /// Replaces all options at once, e.g. with values read from a config file.
    pub fn options(mut self, options: RedLockOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the clock drift factor.
    pub fn drift_factor(mut self, drift_factor: f64) -> Self {
        self.options.drift_factor = drift_factor;
        self
    }

    /// Sets the base delay between attempts.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.options.retry_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Sets the maximum random jitter added to the retry delay.
    pub fn retry_jitter(mut self, jitter: Duration) -> Self {
        self.options.retry_jitter_ms = jitter.as_millis() as u64;
        self
    }

    /// Sets how many times a rejected acquisition is retried.
    pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.options.max_retry_attempts = attempts;
        self
    }

    /// Builds the coordinator.
    ///
    /// Fails when no store was added or the options are out of range.
    pub fn build(self) -> LockResult<QuorumLock<S>> {
        QuorumLock::with_options(self.stores, self.options)
    }
}

impl<S: LockStore> Default for QuorumLockBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}
