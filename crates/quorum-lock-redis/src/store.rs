//! Redis implementation of the lock store contract.

use std::time::Duration;

use fred::prelude::*;
use fred::types::CustomCommand;
use quorum_lock_core::error::{LockError, LockResult};
use quorum_lock_core::keys::ResourceKeys;
use quorum_lock_core::store::LockStore;
use quorum_lock_core::token::LockToken;
use tracing::instrument;

use crate::scripts::{ACQUIRE_SCRIPT, EXTEND_SCRIPT, RELEASE_SCRIPT};

/// One Redis server taking part in a lock quorum.
///
/// Runs each lock operation as a single `EVAL`, so all keys of a request are
/// checked and mutated atomically on this server.
#[derive(Clone)]
pub struct RedisLockStore {
    client: RedisClient,
    key_prefix: String,
}

impl RedisLockStore {
    /// Wraps a connected client; keys are used verbatim.
    pub fn new(client: RedisClient) -> Self {
        Self {
            client,
            key_prefix: String::new(),
        }
    }

    /// Prepends `prefix` to every key this store touches.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &RedisClient {
        &self.client
    }

    /// Returns the key as stored on the server.
    pub fn redis_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn eval(
        &self,
        operation: &str,
        script: &'static str,
        keys: &ResourceKeys,
        args: Vec<RedisValue>,
    ) -> LockResult<i64> {
        let mut command_args: Vec<RedisValue> = Vec::with_capacity(2 + keys.len() + args.len());
        command_args.push(script.into());
        command_args.push((keys.len() as i64).into());
        command_args.extend(keys.iter().map(|key| RedisValue::from(self.redis_key(key))));
        command_args.extend(args);

        let cmd = CustomCommand::new_static("EVAL", None, false);
        self.client.custom(cmd, command_args).await.map_err(|e| {
            LockError::backend(format!("Redis EVAL ({}) failed: {}", operation, e))
        })
    }
}

impl LockStore for RedisLockStore {
    #[instrument(skip_all, fields(backend = "redis", lock.keys = %keys))]
    async fn acquire(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> LockResult<bool> {
        let args = vec![
            token.as_str().into(),
            (ttl.as_millis() as i64).into(),
        ];
        Ok(self.eval("acquire", ACQUIRE_SCRIPT, keys, args).await? == 1)
    }

    #[instrument(skip_all, fields(backend = "redis", lock.keys = %keys))]
    async fn release(&self, keys: &ResourceKeys, token: &LockToken) -> LockResult<u64> {
        let args = vec![token.as_str().into()];
        let deleted = self.eval("release", RELEASE_SCRIPT, keys, args).await?;
        Ok(deleted.max(0) as u64)
    }

    #[instrument(skip_all, fields(backend = "redis", lock.keys = %keys))]
    async fn extend(
        &self,
        keys: &ResourceKeys,
        token: &LockToken,
        ttl: Duration,
    ) -> LockResult<bool> {
        let args = vec![
            token.as_str().into(),
            (ttl.as_millis() as i64).into(),
        ];
        Ok(self.eval("extend", EXTEND_SCRIPT, keys, args).await? == 1)
    }
}
