//! Search module
//!
//! Data-access interface, its in-process implementation, per-resource filters and
//! the cache-aside aggregation service built on top of them.

mod filters;
mod memory;
mod repository;
mod service;

pub use filters::{EventFilters, ForumFilters, ProfileFilters, SearchFilters};
pub use memory::InMemoryRepository;
pub(crate) use memory::parse_instant;
pub use repository::{Condition, PageWindow, Predicate, Repository, Resource, Row, SortOrder};
pub use service::{SearchService, GLOBAL_SEARCH_LIMIT, GLOBAL_SEARCH_TTL_SECS, SEARCH_TTL_SECS};
