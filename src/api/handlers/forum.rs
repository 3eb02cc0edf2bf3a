//! Forum endpoints.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use super::{fetch_page, internal, required_text, strip_columns, AppState};
use crate::error::{ApiError, Result};
use crate::middleware::Principal;
use crate::models::requests::DEFAULT_LIMIT;
use crate::models::{ForumListParams, ForumPostsResponse};
use crate::search::{Condition, Predicate, Resource, Row};

/// Handler for GET /api/v1/forum/posts
pub async fn list_forum_posts(
    State(state): State<AppState>,
    Query(params): Query<ForumListParams>,
) -> Result<Json<ForumPostsResponse>> {
    let mut predicate = Predicate::new();
    if let Some(category) = params.category() {
        predicate = predicate.and(Condition::equals("category_id", category));
    }

    let (posts, pagination) = fetch_page(
        state.repository.as_ref(),
        Resource::ForumPosts,
        &predicate,
        params.page(),
        DEFAULT_LIMIT,
    )
    .await
    .map_err(internal("Failed to fetch forum posts"))?;

    Ok(Json(ForumPostsResponse { posts, pagination }))
}

/// Handler for POST /api/v1/forum/posts
pub async fn create_forum_post(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<Row>,
) -> Result<(StatusCode, Json<Row>)> {
    if required_text(&body, "title").is_none() || required_text(&body, "content").is_none() {
        return Err(ApiError::BadRequest("Title and content are required".into()));
    }

    let mut post = strip_columns(body, &[Resource::ForumPosts.id_column(), "created_at"]);
    post.insert("author_id".into(), Value::String(principal.user_id));

    let post = state
        .repository
        .insert(Resource::ForumPosts, post)
        .await
        .map_err(internal("Failed to create forum post"))?;

    Ok((StatusCode::CREATED, Json(post)))
}
