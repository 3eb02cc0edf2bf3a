//! Search endpoints. Caching happens inside [`crate::search::SearchService`].

use axum::{
    extract::{Query, State},
    Json,
};

use super::{internal, AppState};
use crate::error::{ApiError, Result};
use crate::models::{GlobalSearchResult, SearchParams, SearchResult, Suggestion, SuggestionParams};
use crate::search::{EventFilters, ForumFilters, ProfileFilters};

const MIN_GLOBAL_QUERY_CHARS: usize = 2;

/// Handler for GET /api/v1/search/global
pub async fn global_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<GlobalSearchResult>> {
    let query = params.query();
    if query.chars().count() < MIN_GLOBAL_QUERY_CHARS {
        return Err(ApiError::BadRequest(
            "Query must be at least 2 characters long".into(),
        ));
    }

    let results = state
        .search
        .global_search(query, params.paging().page())
        .await
        .map_err(internal("Search failed"))?;
    Ok(Json(results))
}

/// Handler for GET /api/v1/search/alumni
pub async fn search_alumni(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Query(filters): Query<ProfileFilters>,
) -> Result<Json<SearchResult<ProfileFilters>>> {
    let paging = params.paging();
    let results = state
        .search
        .search_profiles(params.query(), &filters, paging.page(), paging.limit())
        .await
        .map_err(internal("Alumni search failed"))?;
    Ok(Json(results))
}

/// Handler for GET /api/v1/search/events
pub async fn search_events(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Query(filters): Query<EventFilters>,
) -> Result<Json<SearchResult<EventFilters>>> {
    let paging = params.paging();
    let results = state
        .search
        .search_events(params.query(), &filters, paging.page(), paging.limit())
        .await
        .map_err(internal("Events search failed"))?;
    Ok(Json(results))
}

/// Handler for GET /api/v1/search/forum
pub async fn search_forum(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
    Query(filters): Query<ForumFilters>,
) -> Result<Json<SearchResult<ForumFilters>>> {
    let paging = params.paging();
    let results = state
        .search
        .search_forum_posts(params.query(), &filters, paging.page(), paging.limit())
        .await
        .map_err(internal("Forum search failed"))?;
    Ok(Json(results))
}

/// Handler for GET /api/v1/search/suggestions
pub async fn search_suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionParams>,
) -> Result<Json<Vec<Suggestion>>> {
    let partial = params.q.as_deref().unwrap_or_default();
    let suggestions = state
        .search
        .suggestions(partial, params.scope)
        .await
        .map_err(internal("Failed to get suggestions"))?;
    Ok(Json(suggestions))
}
