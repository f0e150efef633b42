//! Redis lock provider implementation.

use std::time::Duration;

use fred::prelude::*;
use quorum_lock_core::error::{LockError, LockResult};
use quorum_lock_redlock::{QuorumLock, RedLockOptions};
use tracing::{info, instrument};

use crate::store::RedisLockStore;

/// Builder for a quorum lock backed by independent Redis servers.
pub struct RedisLockProviderBuilder {
    urls: Vec<String>,
    clients: Vec<RedisClient>,
    key_prefix: String,
    options: RedLockOptions,
}

impl RedisLockProviderBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            urls: vec![],
            clients: vec![],
            key_prefix: String::new(),
            options: RedLockOptions::default(),
        }
    }

    /// Adds a Redis server URL.
    ///
    /// For RedLock, add multiple independent servers (ideally 3 or 5).
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.urls.push(url.into());
        self
    }

    /// Adds multiple Redis server URLs.
    pub fn urls(mut self, urls: &[impl AsRef<str>]) -> Self {
        for url in urls {
            self.urls.push(url.as_ref().to_string());
        }
        self
    }

    /// Uses an existing, already connected Redis client.
    pub fn client(mut self, client: RedisClient) -> Self {
        self.clients.push(client);
        self
    }

    /// Prefixes every lock key, e.g. `"locks:"`.
    pub fn key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Sets all coordinator options.
    pub fn options(mut self, options: RedLockOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the clock drift factor.
    pub fn drift_factor(mut self, drift_factor: f64) -> Self {
        self.options.drift_factor = drift_factor;
        self
    }

    /// Sets the base delay between acquisition attempts.
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

    /// Connects to every URL and builds the coordinator.
    #[instrument(
        skip(self),
        fields(backend = "redis", servers = self.urls.len() + self.clients.len())
    )]
    pub async fn build(self) -> LockResult<QuorumLock<RedisLockStore>> {
        self.options.validate()?;
        let mut clients = self.clients;

        for url in self.urls {
            let config = RedisConfig::from_url(&url).map_err(|e| {
                LockError::Connection(Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("invalid Redis URL: {}", e),
                )))
            })?;

            let client = RedisClient::new(config, None, None, None);
            client.connect();
            client.wait_for_connect().await.map_err(|e| {
                LockError::Connection(Box::new(std::io::Error::other(format!(
                    "failed to connect to Redis: {}",
                    e
                ))))
            })?;

            clients.push(client);
        }

        if clients.is_empty() {
            return Err(LockError::invalid("no Redis clients or URLs provided"));
        }

        info!(servers = clients.len(), "connected quorum lock to Redis");
        let stores = clients
            .into_iter()
            .map(|client| RedisLockStore::new(client).with_key_prefix(self.key_prefix.clone()))
            .collect();
        QuorumLock::with_options(stores, self.options)
    }
}

impl Default for RedisLockProviderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Entry point for Redis-backed quorum locks.
pub struct RedisLockProvider;

impl RedisLockProvider {
    /// Returns a new builder for configuring the provider.
    pub fn builder() -> RedisLockProviderBuilder {
        RedisLockProviderBuilder::new()
    }

    /// Creates a single-server lock using the specified Redis URL.
    pub async fn new(url: impl Into<String>) -> LockResult<QuorumLock<RedisLockStore>> {
        Self::builder().url(url).build().await
    }
}
