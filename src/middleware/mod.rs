//! HTTP middleware
//!
//! Route-level decorators: identity from gateway headers, response caching and
//! pattern invalidation after successful mutations.

pub mod auth;
mod context;
mod invalidation;
mod response_cache;

pub use auth::{optional_auth, require_auth};
pub use context::{Principal, RequestContext, ADMIN_ROLE};
pub use invalidation::{with_invalidation, Invalidation, InvalidationLayer, PatternSource};
pub use response_cache::{
    with_response_cache, KeySource, ResponseCache, ResponseCacheLayer, DEFAULT_RESPONSE_TTL_SECS, X_CACHE,
};
