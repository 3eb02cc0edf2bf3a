//! Cache Store Module
//!
//! The fail-soft facade every caller talks to. It owns one backend, decides at
//! startup whether that is the networked cache or the in-process fallback, and
//! absorbs every backend failure: reads degrade to misses, writes to `false`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::backend::{BackendKind, CacheBackend};
use super::memory::MemoryBackend;
use super::redis::RedisBackend;
use super::stats::CacheStats;
use crate::config::Config;
use crate::error::CacheError;

/// Snapshot of store health and counters.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStatus {
    pub backend: BackendKind,
    pub connected: bool,
    pub entries: Option<usize>,
    #[serde(flatten)]
    pub stats: CacheStats,
    pub hit_rate: f64,
}

// == Cache Store ==
/// Cache-aside store shared by the middlewares and the search service.
pub struct CacheStore {
    backend: Arc<dyn CacheBackend>,
    connected: AtomicBool,
    default_ttl: Duration,
    stats: Mutex<CacheStats>,
}

impl CacheStore {
    // == Constructors ==
    /// Builds the store described by `config`.
    ///
    /// With a `REDIS_URL` the networked backend is tried first; if it cannot be
    /// reached the store falls back to the in-process backend and logs why.
    pub async fn connect(config: &Config) -> Self {
        let default_ttl = Duration::from_secs(config.default_ttl);

        let Some(url) = config.redis_url.as_deref() else {
            warn!("REDIS_URL not provided, using in-memory cache");
            return Self::in_memory(config.max_entries, default_ttl);
        };

        let timeout = Duration::from_millis(config.redis_connect_timeout_ms);
        match RedisBackend::connect(url, timeout).await {
            Ok(backend) => {
                info!("Redis cache connected");
                Self::with_backend(Arc::new(backend), default_ttl)
            }
            Err(err) => {
                warn!(error = %err, "Redis connection failed, falling back to in-memory cache");
                Self::in_memory(config.max_entries, default_ttl)
            }
        }
    }

    /// Builds an in-process store.
    pub fn in_memory(max_entries: usize, default_ttl: Duration) -> Self {
        Self::with_backend(Arc::new(MemoryBackend::new(max_entries)), default_ttl)
    }

    /// Builds a store over an arbitrary backend.
    pub fn with_backend(backend: Arc<dyn CacheBackend>, default_ttl: Duration) -> Self {
        Self {
            backend,
            connected: AtomicBool::new(true),
            default_ttl,
            stats: Mutex::new(CacheStats::new()),
        }
    }

    // == Connectivity ==
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// False after the networked backend dropped and before a probe succeeded.
    /// The in-process backend is always connected.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Marks a networked backend as unreachable. Later operations fail soft
    /// without touching it until [`CacheStore::probe`] sees it answer again.
    pub fn mark_disconnected(&self) {
        if self.backend.kind().is_networked() && self.connected.swap(false, Ordering::AcqRel) {
            warn!(backend = %self.backend.kind(), "Cache backend disconnected");
        }
    }

    /// Pings a disconnected backend and restores it when it answers.
    pub async fn probe(&self) -> bool {
        if self.is_connected() {
            return true;
        }

        match self.backend.ping().await {
            Ok(()) => {
                self.connected.store(true, Ordering::Release);
                info!(backend = %self.backend.kind(), "Cache backend reconnected");
                true
            }
            Err(err) => {
                debug!(error = %err, "Cache backend still unavailable");
                false
            }
        }
    }

    // == Get ==
    /// Returns the cached value for `key`, or `None` on a miss, an expired entry,
    /// or any backend failure.
    pub async fn get(&self, key: &str) -> Option<Value> {
        if !self.is_connected() {
            self.stats().record_miss();
            return None;
        }

        match self.backend.get(key).await {
            Ok(Some(value)) => {
                self.stats().record_hit();
                debug!(key = %key, "Cache hit");
                Some(value)
            }
            Ok(None) => {
                self.stats().record_miss();
                debug!(key = %key, "Cache miss");
                None
            }
            Err(err) => {
                self.absorb("get", key, &err);
                self.stats().record_miss();
                None
            }
        }
    }

    /// Like [`CacheStore::get`], decoding the value into `T`. A value that no
    /// longer decodes is treated as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key).await?;
        match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(err) => {
                warn!(key = %key, error = %err, "Cached value has unexpected shape, ignoring");
                None
            }
        }
    }

    // == Set ==
    /// Stores `value` for `ttl_secs` seconds (store default when `None`).
    pub async fn set(&self, key: &str, value: &Value, ttl_secs: Option<u64>) -> bool {
        if !self.is_connected() {
            return false;
        }

        let ttl = ttl_secs.map(Duration::from_secs).unwrap_or(self.default_ttl);
        match self.backend.set(key, value, ttl).await {
            Ok(()) => {
                self.stats().record_set();
                true
            }
            Err(err) => {
                self.absorb("set", key, &err);
                false
            }
        }
    }

    /// Serializes `value` and stores it; serialization failures return `false`.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_secs: Option<u64>) -> bool {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, &value, ttl_secs).await,
            Err(err) => {
                self.absorb("set", key, &CacheError::from(err));
                false
            }
        }
    }

    // == Delete ==
    /// Removes `key`; succeeds whether or not it was present.
    pub async fn del(&self, key: &str) -> bool {
        if !self.is_connected() {
            return false;
        }

        match self.backend.del(key).await {
            Ok(()) => {
                self.stats().record_delete();
                true
            }
            Err(err) => {
                self.absorb("del", key, &err);
                false
            }
        }
    }

    // == Invalidate Pattern ==
    /// Removes every key matching `pattern` (`*` is a wildcard). Zero matches is
    /// a success.
    pub async fn invalidate_pattern(&self, pattern: &str) -> bool {
        if !self.is_connected() {
            return false;
        }

        match self.backend.invalidate_pattern(pattern).await {
            Ok(count) => {
                self.stats().record_invalidated(count);
                debug!(pattern = %pattern, count, "Cache entries invalidated by pattern");
                true
            }
            Err(err) => {
                self.absorb("invalidate_pattern", pattern, &err);
                false
            }
        }
    }

    // == Maintenance ==
    /// Drops expired entries the backend keeps around; returns how many.
    pub async fn purge_expired(&self) -> usize {
        if !self.is_connected() {
            return 0;
        }

        match self.backend.purge_expired().await {
            Ok(count) => {
                self.stats().record_purged(count);
                count
            }
            Err(err) => {
                self.absorb("purge_expired", "*", &err);
                0
            }
        }
    }

    // == Stats ==
    pub async fn status(&self) -> StoreStatus {
        let entries = self.backend.len().await;
        let stats = self.stats().clone();
        StoreStatus {
            backend: self.backend.kind(),
            connected: self.is_connected(),
            entries,
            hit_rate: stats.hit_rate(),
            stats,
        }
    }

    fn stats(&self) -> MutexGuard<'_, CacheStats> {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn absorb(&self, op: &str, key: &str, err: &CacheError) {
        self.stats().record_error();
        warn!(op, key = %key, error = %err, "Cache operation failed");
        if matches!(err, CacheError::Unavailable(_)) {
            self.mark_disconnected();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    fn store() -> CacheStore {
        CacheStore::in_memory(100, Duration::from_secs(3600))
    }

    /// A networked backend whose connection can be cut and restored.
    struct FlakyBackend {
        up: AtomicBool,
        memory: MemoryBackend,
    }

    impl FlakyBackend {
        fn new() -> Self {
            Self {
                up: AtomicBool::new(true),
                memory: MemoryBackend::new(100),
            }
        }

        fn check(&self) -> Result<(), CacheError> {
            if self.up.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(CacheError::Unavailable("connection refused".into()))
            }
        }
    }

    #[async_trait]
    impl CacheBackend for FlakyBackend {
        fn kind(&self) -> BackendKind {
            BackendKind::Redis
        }

        async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
            self.check()?;
            self.memory.get(key).await
        }

        async fn set(&self, key: &str, value: &Value, ttl: Duration) -> Result<(), CacheError> {
            self.check()?;
            self.memory.set(key, value, ttl).await
        }

        async fn del(&self, key: &str) -> Result<(), CacheError> {
            self.check()?;
            self.memory.del(key).await
        }

        async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
            self.check()?;
            self.memory.invalidate_pattern(pattern).await
        }

        async fn ping(&self) -> Result<(), CacheError> {
            self.check()
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let store = store();
        assert!(store.set("k", &json!({"v": 1}), None).await);
        assert_eq!(store.get("k").await, Some(json!({"v": 1})));
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = store();
        assert!(store.set("k", &json!("value"), Some(1)).await);
        assert_eq!(store.get("k").await, Some(json!("value")));

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn test_del_and_idempotence() {
        let store = store();
        store.set("k", &json!(1), None).await;

        assert!(store.del("k").await);
        assert!(store.del("k").await);
        assert_eq!(store.get("k").await, None);
    }

    #[tokio::test]
    async fn test_invalidate_pattern_effectiveness() {
        let store = store();
        store.set("alumni:list:1:{}", &json!("V"), None).await;

        assert!(store.invalidate_pattern("alumni:list:*").await);
        assert_eq!(store.get("alumni:list:1:{}").await, None);
        assert!(store.invalidate_pattern("alumni:list:*").await, "zero matches is still a success");
    }

    #[tokio::test]
    async fn test_typed_helpers() {
        #[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
        struct Profile {
            name: String,
        }

        let store = store();
        let profile = Profile { name: "Ada".into() };
        assert!(store.set_json("p", &profile, Some(60)).await);
        assert_eq!(store.get_json::<Profile>("p").await, Some(profile));
        assert_eq!(store.get_json::<Vec<u8>>("p").await, None, "shape mismatch reads as miss");
    }

    #[tokio::test]
    async fn test_memory_store_never_disconnects() {
        let store = store();
        store.mark_disconnected();

        assert!(store.is_connected());
        assert!(store.set("k", &json!(1), None).await);
    }

    #[tokio::test]
    async fn test_fail_soft_when_backend_errors() {
        let backend = Arc::new(FlakyBackend::new());
        let store = CacheStore::with_backend(backend.clone(), Duration::from_secs(60));
        backend.up.store(false, Ordering::SeqCst);

        assert_eq!(store.get("k").await, None);
        assert!(!store.is_connected(), "unavailable backend flips the connected flag");
        assert!(!store.set("k", &json!(1), None).await);
        assert!(!store.del("k").await);
        assert!(!store.invalidate_pattern("k*").await);

        let status = store.status().await;
        assert!(!status.connected);
        assert_eq!(status.stats.errors, 1);
    }

    #[tokio::test]
    async fn test_probe_restores_connection() {
        let backend = Arc::new(FlakyBackend::new());
        let store = CacheStore::with_backend(backend.clone(), Duration::from_secs(60));

        backend.up.store(false, Ordering::SeqCst);
        assert!(!store.set("k", &json!(1), None).await);
        assert!(!store.probe().await);

        backend.up.store(true, Ordering::SeqCst);
        assert!(store.probe().await);
        assert!(store.set("k", &json!(1), None).await);
        assert_eq!(store.get("k").await, Some(json!(1)));
    }

    #[tokio::test]
    async fn test_status_counts() {
        let store = store();
        store.set("a", &json!(1), None).await;
        store.get("a").await;
        store.get("missing").await;

        let status = store.status().await;
        assert_eq!(status.backend, BackendKind::Memory);
        assert_eq!(status.entries, Some(1));
        assert_eq!(status.stats.hits, 1);
        assert_eq!(status.stats.misses, 1);
        assert_eq!(status.stats.sets, 1);
    }

    #[tokio::test]
    async fn test_connect_without_url_uses_memory() {
        let store = CacheStore::connect(&Config::default()).await;
        assert_eq!(store.backend_kind(), BackendKind::Memory);
    }

    #[tokio::test]
    async fn test_connect_falls_back_when_unreachable() {
        let config = Config {
            redis_url: Some("redis://127.0.0.1:1/".into()),
            redis_connect_timeout_ms: 500,
            ..Config::default()
        };

        let store = CacheStore::connect(&config).await;
        assert_eq!(store.backend_kind(), BackendKind::Memory);
        assert!(store.set("k", &json!(1), None).await);
    }
}
