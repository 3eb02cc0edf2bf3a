//! Cache Module
//!
//! Cache-aside storage with TTL expiry, pattern invalidation and a fail-soft
//! facade over a networked or in-process backend.

mod backend;
mod entry;
pub mod keys;
mod memory;
mod pattern;
mod redis;
mod stats;
mod store;


// Re-export public types
pub use backend::{BackendKind, CacheBackend};
pub use entry::CacheEntry;
pub use keys::SearchKind;
pub use memory::MemoryBackend;
pub use pattern::KeyPattern;
pub use self::redis::RedisBackend;
pub use stats::CacheStats;
pub use store::{CacheStore, StoreStatus};
