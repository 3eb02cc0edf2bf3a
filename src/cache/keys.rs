//! Cache key registry.
//!
//! Every cached resource gets its key from a builder in this module. Segments are
//! joined with `:` and structured parameters are written as canonical JSON (object
//! members sorted by name at every depth), so two logically equal requests always
//! produce the same key no matter how their filters were assembled.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Segment delimiter shared by every key.
pub const DELIMITER: &str = ":";

// == Search Kind ==
/// Result-type tag used in search keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Alumni,
    Events,
    Forum,
    Global,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchKind::Alumni => "alumni",
            SearchKind::Events => "events",
            SearchKind::Forum => "forum",
            SearchKind::Global => "global",
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Key Builders ==
fn join(segments: &[&str]) -> String {
    segments.join(DELIMITER)
}

/// `user:profile:{user_id}`
pub fn user_profile(user_id: &str) -> String {
    join(&["user", "profile", user_id])
}

/// `alumni:list:{page}:{filters}`
pub fn alumni_list<F: Serialize>(page: u32, filters: &F) -> Result<String, serde_json::Error> {
    Ok(join(&["alumni", "list", &page.to_string(), &canonical_json(filters)?]))
}

/// `events:list:{page}:{filters}`
pub fn events_list<F: Serialize>(page: u32, filters: &F) -> Result<String, serde_json::Error> {
    Ok(join(&["events", "list", &page.to_string(), &canonical_json(filters)?]))
}

/// `events:registrations:{event_id}:{viewer_id}`
///
/// Keyed per viewer: only the organizer or an admin may read the list, and a
/// cached page must never answer for someone else.
pub fn event_registrations(event_id: &str, viewer_id: &str) -> String {
    join(&["events", "registrations", event_id, viewer_id])
}

/// Pattern covering every viewer's copy of one event's registrations.
pub fn event_registrations_pattern(event_id: &str) -> String {
    format!("{}{DELIMITER}*", join(&["events", "registrations", event_id]))
}

/// `mentorship:matches:{user_id}`
pub fn mentorship_matches(user_id: &str) -> String {
    join(&["mentorship", "matches", user_id])
}

/// `forum:posts:{category}:{page}`; an absent category is written as `all`.
pub fn forum_posts(category_id: Option<&str>, page: u32) -> String {
    join(&["forum", "posts", category_id.unwrap_or("all"), &page.to_string()])
}

/// `search:{kind}:{query}:{page}`
pub fn search_results(query: &str, kind: SearchKind, page: u32) -> String {
    join(&["search", kind.as_str(), query, &page.to_string()])
}

/// `search:{kind}:{query}:{page}:{limit}:{filters}` for filtered per-type searches.
pub fn filtered_search_results<F: Serialize>(
    query: &str,
    kind: SearchKind,
    page: u32,
    limit: u32,
    filters: &F,
) -> Result<String, serde_json::Error> {
    Ok(join(&[
        &search_results(query, kind, page),
        &limit.to_string(),
        &canonical_json(filters)?,
    ]))
}

/// Pattern covering every key of a search kind, e.g. `search:alumni:*`.
pub fn search_pattern(kind: SearchKind) -> String {
    format!("search{DELIMITER}{kind}{DELIMITER}*")
}

// == Canonical JSON ==
/// Serializes `value` with object members sorted by name at every depth.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    let mut out = String::new();
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut String) -> Result<(), serde_json::Error> {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> = map.iter().collect();
            members.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (name, member)) in members.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(name)?);
                out.push(':');
                write_canonical(member, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}
