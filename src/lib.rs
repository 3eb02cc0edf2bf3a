//! Alumni Cache - cache-aside layer and search aggregation for an alumni network
//!
//! A fail-soft cache store (Redis with an in-process fallback), a deterministic
//! key registry, response caching and invalidation middleware for axum routes,
//! and a search service that caches per-type results and fans global searches
//! out concurrently.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod realtime;
pub mod search;
pub mod seed;
pub mod tasks;

pub use api::{create_router, AppState};
pub use cache::CacheStore;
pub use config::Config;
pub use tasks::spawn_maintenance_task;
