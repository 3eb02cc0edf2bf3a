//! Networked cache backend on Redis.
//!
//! Values are stored as JSON text with `SETEX`, so expiry is enforced by the
//! server. Pattern invalidation runs in two phases, `KEYS pattern` and then `DEL`
//! on the result. Keys written between the two phases survive; they expire on
//! their own TTL. This window is accepted: cache entries are never authoritative.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;
use tracing::debug;

use super::backend::{BackendKind, CacheBackend};
use crate::error::CacheError;

#[derive(Clone)]
pub struct RedisBackend {
    connection: ConnectionManager,
}

impl RedisBackend {
    /// Opens a managed connection to `url`, giving up after `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let connection = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| {
                CacheError::Unavailable(format!("connection timed out after {}ms", timeout.as_millis()))
            })??;

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Redis
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut conn = self.connection.clone();
        let data: Option<String> = conn.get(key).await?;

        match data {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), CacheError> {
        let payload = serde_json::to_string(value)?;
        let ttl_secs = ttl.as_secs().max(1);

        let mut conn = self.connection.clone();
        let _: () = conn.set_ex(key, payload, ttl_secs).await?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;

        if keys.is_empty() {
            return Ok(0);
        }

        debug!(pattern = %pattern, count = keys.len(), "Deleting keys matched by pattern");
        let _: () = conn.del(&keys).await?;
        Ok(keys.len())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        let mut conn = self.connection.clone();
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
