//! API Handlers
//!
//! HTTP request handlers, grouped by resource. Handlers never see the response
//! cache; it is layered around them in [`super::routes`].

mod alumni;
mod events;
mod forum;
mod mentorship;
mod search;

use std::fmt::Display;
use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::Value;
use tracing::error;

use crate::cache::{CacheStore, StoreStatus};
use crate::config::Config;
use crate::error::{ApiError, RepositoryError};
use crate::models::{HealthResponse, Pagination};
use crate::realtime::EventPublisher;
use crate::search::{PageWindow, Predicate, Repository, Resource, Row, SearchService};

pub use alumni::{get_alumni, list_alumni, update_profile};
pub use events::{
    cancel_registration, create_event, list_events, list_registrations, register_for_event, update_event,
};
pub use forum::{create_forum_post, list_forum_posts};
pub use mentorship::mentorship_matches;
pub use search::{global_search, search_alumni, search_events, search_forum, search_suggestions};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<CacheStore>,
    pub search: Arc<SearchService>,
    pub repository: Arc<dyn Repository>,
    pub publisher: Arc<dyn EventPublisher>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires the search service over the shared store and repository.
    pub fn new(
        cache: Arc<CacheStore>,
        repository: Arc<dyn Repository>,
        publisher: Arc<dyn EventPublisher>,
        config: Config,
    ) -> Self {
        let search = Arc::new(SearchService::new(repository.clone(), cache.clone()));
        Self {
            cache,
            search,
            repository,
            publisher,
            config: Arc::new(config),
        }
    }
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::new(
        state.cache.backend_kind(),
        state.cache.is_connected(),
    ))
}

/// Handler for GET /api/v1/cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<StoreStatus> {
    Json(state.cache.status().await)
}

// == Shared Helpers ==
/// Maps a failure to a generic 500, logging the cause.
pub(crate) fn internal<E: Display>(message: &'static str) -> impl FnOnce(E) -> ApiError {
    move |err| {
        error!(error = %err, "{}", message);
        ApiError::Internal(message.to_string())
    }
}

/// Counts and fetches one page of `resource` in its default order.
pub(crate) async fn fetch_page(
    repository: &dyn Repository,
    resource: Resource,
    predicate: &Predicate,
    page: u32,
    limit: u32,
) -> Result<(Vec<Row>, Pagination), RepositoryError> {
    let total = repository.count(resource, predicate).await?;
    let rows = repository
        .query(
            resource,
            predicate,
            &resource.default_order(),
            PageWindow::for_page(page, limit),
        )
        .await?;
    Ok((rows, Pagination::new(page, limit, total)))
}

/// Drops client-supplied columns the server owns.
pub(crate) fn strip_columns(mut body: Row, columns: &[&str]) -> Row {
    for column in columns {
        body.remove(*column);
    }
    body
}

/// Non-empty string value of `column`.
pub(crate) fn required_text<'a>(body: &'a Row, column: &str) -> Option<&'a str> {
    body.get(column)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|text| !text.is_empty())
}
