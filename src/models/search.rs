//! Search response shapes.
//!
//! These are cached as-is, so they round-trip through serde: a cache hit is
//! decoded back into the same type the service built on the miss.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::search::Row;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let limit = limit.max(1);
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(u64::from(limit)),
        }
    }
}

/// One page of a per-type search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult<F> {
    pub results: Vec<Row>,
    pub pagination: Pagination,
    pub query: String,
    pub filters: F,
}

/// Combined result of the three per-type searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSearchResult {
    pub alumni: Vec<Row>,
    pub events: Vec<Row>,
    pub forum_posts: Vec<Row>,
    pub query: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionScope {
    #[default]
    All,
    Alumni,
    Events,
}

impl SuggestionScope {
    pub fn includes_alumni(self) -> bool {
        matches!(self, SuggestionScope::All | SuggestionScope::Alumni)
    }

    pub fn includes_events(self) -> bool {
        matches!(self, SuggestionScope::All | SuggestionScope::Events)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: String,
}
