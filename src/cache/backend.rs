//! Storage backends behind [`crate::cache::CacheStore`].
//!
//! Two implementations ship with the crate:
//! - [`crate::cache::MemoryBackend`], a process-local map used when no networked
//!   cache is configured or reachable.
//! - [`crate::cache::RedisBackend`], a shared cache visible to every process.
//!
//! Backends report failures as [`CacheError`]; deciding what a failure means for a
//! caller is the store's job.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::CacheError;

/// Which backend a store is running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Redis,
    Memory,
}

impl BackendKind {
    /// Networked backends can drop their connection after startup.
    pub fn is_networked(self) -> bool {
        matches!(self, BackendKind::Redis)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Redis => f.write_str("redis"),
            BackendKind::Memory => f.write_str("memory"),
        }
    }
}

#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    fn kind(&self) -> BackendKind;

    /// Returns the live value for `key`; expired entries read as `None`.
    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value and expiry.
    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), CacheError>;

    /// Removes `key` if present.
    async fn del(&self, key: &str) -> Result<(), CacheError>;

    /// Removes every key matching `pattern` and returns how many were removed.
    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError>;

    /// Checks that the backend answers.
    async fn ping(&self) -> Result<(), CacheError>;

    /// Drops expired entries the backend does not expire on its own.
    async fn purge_expired(&self) -> Result<usize, CacheError> {
        Ok(0)
    }

    /// Number of stored keys, if the backend can tell cheaply.
    async fn len(&self) -> Option<usize> {
        None
    }
}
