//! In-process [`Repository`] over JSON rows.
//!
//! Backs the service when no database is wired in and doubles as the data-access
//! fixture in tests. Every read (`count`, `query`, `top_values`, `find`) bumps an
//! access counter so callers can see whether the cache spared a round trip.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use tokio::sync::RwLock;

use super::repository::{Condition, PageWindow, Predicate, Repository, Resource, Row, SortOrder};
use crate::error::RepositoryError;

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    tables: RwLock<HashMap<Resource, Vec<Row>>>,
    next_id: AtomicU64,
    reads: AtomicU64,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository pre-filled with `rows` per resource.
    pub fn with_rows(rows: impl IntoIterator<Item = (Resource, Vec<Row>)>) -> Self {
        Self {
            tables: RwLock::new(rows.into_iter().collect()),
            next_id: AtomicU64::new(0),
            reads: AtomicU64::new(0),
        }
    }

    /// Number of read operations served so far.
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn count(&self, resource: Resource, predicate: &Predicate) -> Result<u64, RepositoryError> {
        self.record_read();
        let tables = self.tables.read().await;
        let count = rows(&tables, resource)
            .iter()
            .filter(|row| row_matches(row, predicate))
            .count();
        Ok(count as u64)
    }

    async fn query(
        &self,
        resource: Resource,
        predicate: &Predicate,
        order: &SortOrder,
        window: PageWindow,
    ) -> Result<Vec<Row>, RepositoryError> {
        self.record_read();
        let tables = self.tables.read().await;

        let mut matched: Vec<&Row> = rows(&tables, resource)
            .iter()
            .filter(|row| row_matches(row, predicate))
            .collect();
        matched.sort_by(|a, b| compare_rows(a, b, order));

        Ok(matched
            .into_iter()
            .skip(usize::try_from(window.offset).unwrap_or(usize::MAX))
            .take(window.limit as usize)
            .cloned()
            .collect())
    }

    async fn top_values(
        &self,
        resource: Resource,
        column: &str,
        needle: &str,
        limit: usize,
    ) -> Result<Vec<String>, RepositoryError> {
        self.record_read();
        let needle = needle.to_lowercase();
        let tables = self.tables.read().await;

        // (count, first seen) per distinct value
        let mut tally: HashMap<String, (usize, usize)> = HashMap::new();
        for (position, row) in rows(&tables, resource).iter().enumerate() {
            let Some(Value::String(text)) = row.get(column) else {
                continue;
            };
            if text.is_empty() || !text.to_lowercase().contains(&needle) {
                continue;
            }
            tally.entry(text.clone()).or_insert((0, position)).0 += 1;
        }

        let mut ranked: Vec<(String, (usize, usize))> = tally.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        Ok(ranked.into_iter().take(limit).map(|(value, _)| value).collect())
    }

    async fn count_by(
        &self,
        resource: Resource,
        column: &str,
        values: &[String],
    ) -> Result<HashMap<String, u64>, RepositoryError> {
        self.record_read();
        let tables = self.tables.read().await;

        let mut counts: HashMap<String, u64> = HashMap::new();
        for row in rows(&tables, resource) {
            let Some(value) = row.get(column).and_then(text_of) else {
                continue;
            };
            if values.contains(&value) {
                *counts.entry(value).or_default() += 1;
            }
        }
        Ok(counts)
    }

    async fn find(&self, resource: Resource, id: &str) -> Result<Option<Row>, RepositoryError> {
        self.record_read();
        let tables = self.tables.read().await;
        Ok(rows(&tables, resource)
            .iter()
            .find(|row| has_id(row, resource, id))
            .cloned())
    }

    async fn insert(&self, resource: Resource, mut row: Row) -> Result<Row, RepositoryError> {
        let id_column = resource.id_column();
        if !row.contains_key(id_column) {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            row.insert(id_column.to_string(), Value::String(format!("{}-{}", resource.as_str(), id)));
        }
        row.entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));

        let mut tables = self.tables.write().await;
        tables.entry(resource).or_default().push(row.clone());
        Ok(row)
    }

    async fn update(&self, resource: Resource, id: &str, patch: Row) -> Result<Option<Row>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let Some(row) = tables
            .get_mut(&resource)
            .and_then(|rows| rows.iter_mut().find(|row| has_id(row, resource, id)))
        else {
            return Ok(None);
        };

        let id_column = resource.id_column();
        for (column, value) in patch {
            if column != id_column {
                row.insert(column, value);
            }
        }
        row.insert("updated_at".to_string(), Value::String(Utc::now().to_rfc3339()));
        Ok(Some(row.clone()))
    }
}

// == Predicate Evaluation ==
fn rows(tables: &HashMap<Resource, Vec<Row>>, resource: Resource) -> &[Row] {
    tables.get(&resource).map(Vec::as_slice).unwrap_or(&[])
}

fn has_id(row: &Row, resource: Resource, id: &str) -> bool {
    row.get(resource.id_column())
        .and_then(text_of)
        .is_some_and(|value| value == id)
}

fn row_matches(row: &Row, predicate: &Predicate) -> bool {
    predicate
        .conditions
        .iter()
        .all(|condition| condition_matches(row, condition))
}

fn condition_matches(row: &Row, condition: &Condition) -> bool {
    match condition {
        Condition::AnyContains { columns, needle } => columns
            .iter()
            .any(|column| column_contains(row, column, needle)),
        Condition::Contains { column, needle } => column_contains(row, column, needle),
        Condition::Equals { column, value } => row
            .get(column)
            .is_some_and(|actual| loosely_equal(actual, value)),
        Condition::AtLeast { column, value } => row
            .get(column)
            .and_then(|actual| compare_values(actual, value))
            .is_some_and(|ord| ord != CmpOrdering::Less),
        Condition::AtMost { column, value } => row
            .get(column)
            .and_then(|actual| compare_values(actual, value))
            .is_some_and(|ord| ord != CmpOrdering::Greater),
    }
}

fn column_contains(row: &Row, column: &str, needle: &str) -> bool {
    row.get(column)
        .and_then(text_of)
        .is_some_and(|text| text.to_lowercase().contains(needle))
}

/// Text form used for matching; arrays and objects match on their JSON text.
fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Equality that tolerates a number stored as text (`"2019"` vs `2019`).
fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (actual, expected) {
        (Value::String(_), Value::Number(_)) | (Value::Number(_), Value::String(_)) => {
            text_of(actual) == text_of(expected)
        }
        _ => false,
    }
}

fn compare_values(a: &Value, b: &Value) -> Option<CmpOrdering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::String(x), Value::String(y)) => match (parse_instant(x), parse_instant(y)) {
            (Some(x), Some(y)) => Some(x.cmp(&y)),
            _ => Some(x.cmp(y)),
        },
        _ => None,
    }
}

/// Reads RFC 3339 timestamps and bare `YYYY-MM-DD` dates (midnight UTC).
pub(crate) fn parse_instant(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Nulls and missing values sort last in either direction.
fn compare_rows(a: &Row, b: &Row, order: &SortOrder) -> CmpOrdering {
    let left = a.get(order.column).filter(|v| !v.is_null());
    let right = b.get(order.column).filter(|v| !v.is_null());

    match (left, right) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Greater,
        (Some(_), None) => CmpOrdering::Less,
        (Some(x), Some(y)) => {
            let ord = compare_values(x, y).unwrap_or(CmpOrdering::Equal);
            if order.descending {
                ord.reverse()
            } else {
                ord
            }
        }
    }
}
