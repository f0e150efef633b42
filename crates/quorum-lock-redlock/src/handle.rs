//! Quorum lock handle implementation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime};

use quorum_lock_core::error::{LockError, LockResult};
use quorum_lock_core::keys::ResourceKeys;
use quorum_lock_core::store::LockStore;
use quorum_lock_core::token::LockToken;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use crate::lock::LockAuthority;
use crate::redlock::helper::RedLockHelper;

/// Default lead time before expiry at which auto-extension renews.
pub const DEFAULT_EXTENSION_THRESHOLD: Duration = Duration::from_millis(1000);

/// Handle for a lock held on a quorum of stores.
///
/// The handle is either active, released (terminal) or expired. Expiry is
/// passive: it is only observed through [`is_expired`](Self::is_expired).
///
/// Dropping an unreleased handle stops auto-extension and releases the lock
/// on a background task when a tokio runtime is available; otherwise the
/// lock expires through its TTL. Call [`release`](Self::release) to learn
/// whether the release was confirmed.
pub struct QuorumLockHandle<S: LockStore> {
    shared: Arc<HandleShared<S>>,
}

struct HandleShared<S: LockStore> {
    keys: ResourceKeys,
    token: LockToken,
    ttl: Duration,
    authority: LockAuthority<S>,
    state: Mutex<HandleState>,
}

struct HandleState {
    expires_at: Instant,
    released: bool,
    auto_extension: Option<AutoExtension>,
}

struct AutoExtension {
    threshold: Duration,
    /// Signals the renewal task to stop; only interrupts a pending wait.
    stop: watch::Sender<bool>,
}

impl HandleState {
    fn stop_auto_extension(&mut self) {
        if let Some(auto_extension) = self.auto_extension.take() {
            let _ = auto_extension.stop.send(true);
        }
    }
}

impl<S: LockStore> QuorumLockHandle<S> {
    pub(crate) fn new(
        keys: ResourceKeys,
        token: LockToken,
        ttl: Duration,
        expires_at: Instant,
        authority: LockAuthority<S>,
    ) -> Self {
        Self {
            shared: Arc::new(HandleShared {
                keys,
                token,
                ttl,
                authority,
                state: Mutex::new(HandleState {
                    expires_at,
                    released: false,
                    auto_extension: None,
                }),
            }),
        }
    }

    /// Returns the locked resource keys.
    pub fn resource_keys(&self) -> &ResourceKeys {
        &self.shared.keys
    }

    /// Returns the ownership token of this acquisition.
    pub fn token(&self) -> &LockToken {
        &self.shared.token
    }

    /// Returns the TTL the lock was acquired with.
    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    /// Returns true once [`release`](Self::release) has been called.
    pub fn is_released(&self) -> bool {
        self.shared.state().released
    }

    /// Returns true when the computed expiry has passed.
    pub fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at()
    }

    /// Returns true while the lock is neither released nor expired.
    pub fn is_valid(&self) -> bool {
        !self.is_released() && !self.is_expired()
    }

    /// Monotonic instant after which exclusivity can no longer be assumed.
    pub fn expires_at(&self) -> Instant {
        self.shared.state().expires_at
    }

    /// Wall-clock time corresponding to [`expires_at`](Self::expires_at).
    pub fn expiration_time(&self) -> SystemTime {
        let expires_at = self.expires_at();
        let now = Instant::now();
        let wall_now = SystemTime::now();
        if expires_at >= now {
            wall_now + (expires_at - now)
        } else {
            wall_now
                .checked_sub(now - expires_at)
                .unwrap_or(SystemTime::UNIX_EPOCH)
        }
    }

    /// Time left until expiry, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.expires_at().saturating_duration_since(Instant::now())
    }

    /// Returns true while a renewal task is scheduled.
    pub fn auto_extension_enabled(&self) -> bool {
        self.shared.state().auto_extension.is_some()
    }

    /// Lead time of the active auto-extension, if any.
    pub fn auto_extension_threshold(&self) -> Option<Duration> {
        self.shared
            .state()
            .auto_extension
            .as_ref()
            .map(|auto_extension| auto_extension.threshold)
    }

    /// Releases the lock on every store.
    ///
    /// Never fails: returns `false` when no store confirmed the release.
    /// Repeated calls return `true` without touching the stores again.
    #[instrument(skip(self), fields(lock.keys = %self.shared.keys))]
    pub async fn release(&self) -> bool {
        {
            let mut state = self.shared.state();
            if state.released {
                return true;
            }
            state.released = true;
            state.stop_auto_extension();
        }

        let released = self
            .shared
            .authority
            .release(&self.shared.keys, &self.shared.token)
            .await;
        if !released {
            warn!(lock.keys = %self.shared.keys, "lock release was not confirmed by any store");
        }
        released
    }

    /// Extends the lock to `ttl` from now, or to the original TTL when `None`.
    ///
    /// # Errors
    ///
    /// * `LockError::Released` - The handle was released
    /// * `LockError::InvalidParameter` - `ttl` is under 1ms
    /// * `LockError::ExtensionFailed` - A quorum did not confirm; the lock may
    ///   no longer be held
    pub async fn extend(&self, ttl: Option<Duration>) -> LockResult<()> {
        self.shared.extend(ttl).await
    }

    /// Starts renewing the lock `threshold` before each expiry.
    ///
    /// Each renewal extends by the original TTL and reschedules itself. The
    /// first failed renewal disables auto-extension and logs a warning; it is
    /// never reported to the holder, who can detect the loss through
    /// [`is_valid`](Self::is_valid). Restarting replaces a running schedule.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_auto_extension(&self, threshold: Duration) -> LockResult<()> {
        let threshold = RedLockHelper::positive_millis(threshold, "extension threshold")?;

        let stop_receiver = {
            let mut state = self.shared.state();
            if state.released {
                return Err(LockError::Released);
            }
            state.stop_auto_extension();
            let (stop, stop_receiver) = watch::channel(false);
            state.auto_extension = Some(AutoExtension { threshold, stop });
            stop_receiver
        };

        tokio::spawn(run_auto_extension(self.shared.clone(), threshold, stop_receiver));
        Ok(())
    }

    /// Cancels a pending renewal. An extension already in flight completes.
    pub fn stop_auto_extension(&self) {
        self.shared.state().stop_auto_extension();
    }
}

impl<S: LockStore> HandleShared<S> {
    fn state(&self) -> MutexGuard<'_, HandleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[instrument(skip(self), fields(lock.keys = %self.keys))]
    async fn extend(&self, ttl: Option<Duration>) -> LockResult<()> {
        if self.state().released {
            return Err(LockError::Released);
        }
        let ttl = match ttl {
            Some(ttl) => RedLockHelper::positive_millis(ttl, "ttl")?,
            None => self.ttl,
        };

        if !self.authority.extend(&self.keys, &self.token, ttl).await {
            return Err(LockError::ExtensionFailed {
                resource: self.keys.to_string(),
            });
        }

        self.state().expires_at = Instant::now() + ttl;
        Ok(())
    }
}

async fn run_auto_extension<S: LockStore>(
    shared: Arc<HandleShared<S>>,
    threshold: Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let expires_at = shared.state().expires_at;
        let renew_at = expires_at.checked_sub(threshold).unwrap_or_else(Instant::now);

        tokio::select! {
            _ = tokio::time::sleep_until(renew_at) => {}
            // A stop signal or a dropped sender both end the schedule.
            _ = stop.changed() => break,
        }
        if *stop.borrow() {
            break;
        }

        match shared.extend(None).await {
            Ok(()) => {
                debug!(lock.keys = %shared.keys, "lock auto-extended");
            }
            Err(e) => {
                if !*stop.borrow() {
                    warn!(
                        lock.keys = %shared.keys,
                        error = %e,
                        "lock auto-extension failed, disabling"
                    );
                    shared.state().auto_extension = None;
                }
                break;
            }
        }
    }
}

impl<S: LockStore> Drop for QuorumLockHandle<S> {
    fn drop(&mut self) {
        {
            let mut state = self.shared.state();
            state.stop_auto_extension();
            if state.released {
                return;
            }
            state.released = true;
        }

        // Drop is synchronous, so release on a background task. Without a
        // runtime the lock expires through its TTL.
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let shared = self.shared.clone();
            runtime.spawn(async move {
                let released = shared.authority.release(&shared.keys, &shared.token).await;
                debug!(lock.keys = %shared.keys, released, "dropped lock handle released");
            });
        }
    }
}
