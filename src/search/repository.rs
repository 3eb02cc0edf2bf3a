//! Data-access interface consumed by the search service and route handlers.
//!
//! The relational store is the single source of truth. Callers describe what they
//! want with a [`Predicate`] (an AND of [`Condition`]s), a [`SortOrder`] and a
//! [`PageWindow`]; the repository decides how to run it.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::RepositoryError;

/// A result row: column name to JSON value.
pub type Row = Map<String, Value>;

// == Resource ==
/// Tables (or joined views) the service reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    /// Alumni profiles joined with their user record
    Alumni,
    Events,
    ForumPosts,
    /// Event sign-ups, one row per user and event
    Registrations,
}

impl Resource {
    pub const ALL: [Resource; 4] = [
        Resource::Alumni,
        Resource::Events,
        Resource::ForumPosts,
        Resource::Registrations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Resource::Alumni => "alumni_profiles",
            Resource::Events => "events",
            Resource::ForumPosts => "forum_posts",
            Resource::Registrations => "event_registrations",
        }
    }

    /// Column identifying a row.
    pub fn id_column(self) -> &'static str {
        match self {
            Resource::Alumni => "user_id",
            Resource::Events | Resource::ForumPosts | Resource::Registrations => "id",
        }
    }

    /// Columns searched by free text, OR-combined.
    pub fn text_columns(self) -> &'static [&'static str] {
        match self {
            Resource::Alumni => &["full_name", "company", "position", "industry", "location", "skills"],
            Resource::Events => &["title", "description", "location"],
            Resource::ForumPosts => &["title", "content"],
            Resource::Registrations => &["dietary_requirements", "additional_info"],
        }
    }

    /// Ordering applied to paginated listings.
    pub fn default_order(self) -> SortOrder {
        match self {
            Resource::Alumni => SortOrder::asc("full_name"),
            Resource::Events => SortOrder::asc("start_date"),
            Resource::ForumPosts => SortOrder::desc("created_at"),
            Resource::Registrations => SortOrder::desc("registered_at"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Predicate ==
/// One filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive substring match on any of the columns
    AnyContains { columns: Vec<String>, needle: String },
    /// Exact match
    Equals { column: String, value: Value },
    /// Case-insensitive substring match on one column
    Contains { column: String, needle: String },
    /// Column value greater than or equal to `value`
    AtLeast { column: String, value: Value },
    /// Column value less than or equal to `value`
    AtMost { column: String, value: Value },
}

impl Condition {
    pub fn any_contains(columns: &[&str], needle: &str) -> Self {
        Condition::AnyContains {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            needle: needle.to_lowercase(),
        }
    }

    pub fn equals(column: &str, value: impl Into<Value>) -> Self {
        Condition::Equals {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn contains(column: &str, needle: &str) -> Self {
        Condition::Contains {
            column: column.to_string(),
            needle: needle.to_lowercase(),
        }
    }

    pub fn at_least(column: &str, value: impl Into<Value>) -> Self {
        Condition::AtLeast {
            column: column.to_string(),
            value: value.into(),
        }
    }

    pub fn at_most(column: &str, value: impl Into<Value>) -> Self {
        Condition::AtMost {
            column: column.to_string(),
            value: value.into(),
        }
    }
}

/// Conjunction of conditions; empty matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn extend(mut self, conditions: impl IntoIterator<Item = Condition>) -> Self {
        self.conditions.extend(conditions);
        self
    }
}

// == Ordering & Paging ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub column: &'static str,
    pub descending: bool,
}

impl SortOrder {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

/// `LIMIT`/`OFFSET` pair derived from a 1-based page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u64,
}

impl PageWindow {
    pub fn for_page(page: u32, limit: u32) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            limit,
            offset: u64::from(page - 1) * u64::from(limit),
        }
    }
}

// == Repository Trait ==
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Number of rows matching `predicate`.
    async fn count(&self, resource: Resource, predicate: &Predicate) -> Result<u64, RepositoryError>;

    /// Rows matching `predicate`, sorted by `order`, restricted to `window`.
    async fn query(
        &self,
        resource: Resource,
        predicate: &Predicate,
        order: &SortOrder,
        window: PageWindow,
    ) -> Result<Vec<Row>, RepositoryError>;

    /// Distinct non-empty values of `column` containing `needle`
    /// (case-insensitive), most frequent first.
    async fn top_values(
        &self,
        resource: Resource,
        column: &str,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError>;

    /// Rows per value of `column`, for the given `values` only. Values without
    /// rows are absent from the map.
    async fn count_by(
        &self,
        resource: Resource,
        column: &str,
        values: &[String],
    ) -> Result<HashMap<String, u64>, RepositoryError>;

    async fn find(&self, resource: Resource, id: &str) -> Result<Option<Row>, RepositoryError>;

    /// Stores a new row, assigning an id and `created_at` when missing.
    async fn insert(&self, resource: Resource, row: Row) -> Result<Row, RepositoryError>;

    /// Merges `patch` into the row with `id`; `None` when there is no such row.
    async fn update(&self, resource: Resource, id: &str, patch: Row) -> Result<Option<Row>, RepositoryError>;
}
