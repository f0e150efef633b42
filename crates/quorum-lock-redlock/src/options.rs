//! Coordinator configuration.

use std::time::Duration;

use quorum_lock_core::error::{LockError, LockResult};
use serde::{Deserialize, Serialize};

/// Largest accepted clock drift factor.
pub const MAX_DRIFT_FACTOR: f64 = 0.1;

/// Tuning knobs of a [`QuorumLock`](crate::QuorumLock).
///
/// Fixed once the coordinator is built. Quorum is not configurable; it is
/// always derived from the number of stores.
///
/// Deserializes with defaults for missing fields:
///
/// ```rust,ignore
/// let options: RedLockOptions = serde_json::from_str(r#"{ "max_retry_attempts": 10 }"#)?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedLockOptions {
    /// Fraction of the TTL subtracted to compensate clock drift, in [0, 0.1].
    pub drift_factor: f64,
    /// Base pause between attempts.
    pub retry_delay_ms: u64,
    /// Upper bound of the random extra pause added to `retry_delay_ms`.
    pub retry_jitter_ms: u64,
    /// Retries after the first attempt; 0 means a single attempt.
    pub max_retry_attempts: u32,
}

impl Default for RedLockOptions {
    fn default() -> Self {
        Self {
            drift_factor: 0.01,
            retry_delay_ms: 200,
            retry_jitter_ms: 100,
            max_retry_attempts: 3,
        }
    }
}

impl RedLockOptions {
    /// Checks the options are within their documented ranges.
    pub fn validate(&self) -> LockResult<()> {
        if !self.drift_factor.is_finite()
            || !(0.0..=MAX_DRIFT_FACTOR).contains(&self.drift_factor)
        {
            return Err(LockError::invalid(format!(
                "drift_factor must be within [0, {}], got {}",
                MAX_DRIFT_FACTOR, self.drift_factor
            )));
        }
        Ok(())
    }

    /// Base pause between attempts.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Upper bound of the random extra pause.
    pub fn retry_jitter(&self) -> Duration {
        Duration::from_millis(self.retry_jitter_ms)
    }

    /// Total number of attempts an acquisition may make.
    pub fn total_attempts(&self) -> u32 {
        self.max_retry_attempts.saturating_add(1)
    }
}
