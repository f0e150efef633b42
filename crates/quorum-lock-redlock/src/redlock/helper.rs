//! RedLock helper functions.

use std::time::Duration;

use quorum_lock_core::error::{LockError, LockResult};
use rand::Rng;

/// Helper functions for the RedLock algorithm.
pub struct RedLockHelper;

impl RedLockHelper {
    /// Minimum number of stores that must agree: `floor(N/2) + 1`.
    pub fn quorum(store_count: usize) -> usize {
        (store_count / 2) + 1
    }

    /// Checks if we have sufficient successes for majority consensus.
    pub fn has_sufficient_successes(success_count: usize, store_count: usize) -> bool {
        success_count >= Self::quorum(store_count)
    }

    /// Clock drift allowance for a TTL, `round(drift_factor * ttl)` in ms.
    pub fn drift_millis(ttl: Duration, drift_factor: f64) -> i64 {
        // Float-to-int casts saturate.
        (Self::millis(ttl) as f64 * drift_factor).round() as i64
    }

    /// Time the caller may still assume exclusivity after acquiring.
    ///
    /// `ttl - elapsed - drift`, in milliseconds. Negative when the acquisition
    /// took longer than the lock lives.
    pub fn effective_validity_millis(ttl: Duration, elapsed: Duration, drift_factor: f64) -> i64 {
        Self::millis(ttl)
            .saturating_sub(Self::millis(elapsed))
            .saturating_sub(Self::drift_millis(ttl, drift_factor))
    }

    /// Acquisition is accepted only with quorum and more than 1ms of validity.
    pub fn is_acquisition_valid(
        success_count: usize,
        store_count: usize,
        effective_validity_millis: i64,
    ) -> bool {
        Self::has_sufficient_successes(success_count, store_count) && effective_validity_millis > 1
    }

    /// Delay before the next attempt: `delay + uniform(0..=jitter)`.
    pub fn retry_delay(delay: Duration, jitter: Duration) -> Duration {
        let jitter_millis = u64::try_from(jitter.as_millis()).unwrap_or(u64::MAX);
        let extra = if jitter_millis == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_millis)
        };
        delay + Duration::from_millis(extra)
    }

    /// Validates a millisecond duration is at least 1ms, truncating sub-ms parts.
    ///
    /// Durations beyond `i64::MAX` milliseconds are rejected so the validity
    /// arithmetic never overflows.
    pub fn positive_millis(value: Duration, what: &str) -> LockResult<Duration> {
        let millis = i64::try_from(value.as_millis())
            .map_err(|_| LockError::invalid(format!("{} is too large", what)))?;
        if millis == 0 {
            return Err(LockError::invalid(format!(
                "{} must be a positive number of milliseconds",
                what
            )));
        }
        Ok(Duration::from_millis(millis.unsigned_abs()))
    }

    /// Whole milliseconds of `value`, saturating at `i64::MAX`.
    fn millis(value: Duration) -> i64 {
        i64::try_from(value.as_millis()).unwrap_or(i64::MAX)
    }
}
