//! In-process cache backend.
//!
//! Entries live in a map guarded by an async mutex. Expired entries are removed
//! when read and by the maintenance sweep. When the store is full the least
//! recently used entry is evicted.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::backend::{BackendKind, CacheBackend};
use super::entry::{current_timestamp_ms, CacheEntry};
use super::pattern::KeyPattern;
use crate::error::CacheError;

// == Recency Tracker ==
/// Access-order bookkeeping for LRU eviction.
///
/// Each access takes a fresh tick; the smallest tick is the least recently used key.
#[derive(Debug, Default)]
struct Recency {
    tick: u64,
    by_tick: BTreeMap<u64, String>,
    by_key: HashMap<String, u64>,
}

impl Recency {
    fn touch(&mut self, key: &str) {
        self.remove(key);
        self.tick += 1;
        self.by_tick.insert(self.tick, key.to_string());
        self.by_key.insert(key.to_string(), self.tick);
    }

    fn remove(&mut self, key: &str) {
        if let Some(tick) = self.by_key.remove(key) {
            self.by_tick.remove(&tick);
        }
    }

    fn pop_oldest(&mut self) -> Option<String> {
        let (_, key) = self.by_tick.pop_first()?;
        self.by_key.remove(&key);
        Some(key)
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, CacheEntry>,
    recency: Recency,
}

impl Inner {
    fn remove(&mut self, key: &str) -> bool {
        self.recency.remove(key);
        self.entries.remove(key).is_some()
    }

    fn purge_expired(&mut self, now_ms: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }
        expired.len()
    }
}

// == Memory Backend ==
#[derive(Debug)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    max_entries: usize,
}

impl MemoryBackend {
    /// Creates an empty backend holding at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_entries: max_entries.max(1),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut inner = self.inner.lock().await;

        let expired = match inner.entries.get(key) {
            None => return Ok(None),
            Some(entry) => entry.is_expired(),
        };

        if expired {
            inner.remove(key);
            debug!(key = %key, "Dropped expired entry on read");
            return Ok(None);
        }

        inner.recency.touch(key);
        Ok(inner.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().await;

        // Expired entries make room before any live entry is evicted
        if !inner.entries.contains_key(key) && inner.entries.len() >= self.max_entries {
            let purged = inner.purge_expired(current_timestamp_ms());
            if purged > 0 {
                debug!(purged, "Dropped expired entries to make room");
            } else if let Some(evicted) = inner.recency.pop_oldest() {
                inner.entries.remove(&evicted);
                debug!(key = %evicted, "Evicted least recently used entry");
            }
        }

        inner
            .entries
            .insert(key.to_string(), CacheEntry::new(value.clone(), ttl));
        inner.recency.touch(key);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<(), CacheError> {
        self.inner.lock().await.remove(key);
        Ok(())
    }

    async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        let pattern = KeyPattern::new(pattern);
        let mut inner = self.inner.lock().await;

        if pattern.matches_all() {
            let cleared = inner.entries.len();
            *inner = Inner::default();
            return Ok(cleared);
        }

        let doomed: Vec<String> = inner
            .entries
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect();

        for key in &doomed {
            inner.remove(key);
        }
        Ok(doomed.len())
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = current_timestamp_ms();
        Ok(self.inner.lock().await.purge_expired(now))
    }

    async fn len(&self) -> Option<usize> {
        Some(self.inner.lock().await.entries.len())
    }
}
