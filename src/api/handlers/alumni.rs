//! Alumni directory endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use super::{fetch_page, internal, strip_columns, AppState};
use crate::error::{ApiError, Result};
use crate::middleware::Principal;
use crate::models::requests::DEFAULT_LIMIT;
use crate::models::{AlumniListResponse, ListParams};
use crate::realtime::{PROFILE_UPDATED, ROOM_ALUMNI};
use crate::search::{Predicate, ProfileFilters, Resource, Row, SearchFilters};

/// Handler for GET /api/v1/alumni
pub async fn list_alumni(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filters): Query<ProfileFilters>,
) -> Result<Json<AlumniListResponse>> {
    let predicate = Predicate::new().extend(filters.conditions());
    let (alumni, pagination) = fetch_page(
        state.repository.as_ref(),
        Resource::Alumni,
        &predicate,
        params.page(),
        DEFAULT_LIMIT,
    )
    .await
    .map_err(internal("Failed to fetch alumni"))?;

    Ok(Json(AlumniListResponse { alumni, pagination }))
}

/// Handler for GET /api/v1/alumni/:id
pub async fn get_alumni(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Row>> {
    state
        .repository
        .find(Resource::Alumni, &id)
        .await
        .map_err(internal("Failed to fetch alumni profile"))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Alumni not found".into()))
}

/// Handler for PUT /api/v1/alumni/:id/profile
///
/// Users may only edit their own profile; admins may edit any.
pub async fn update_profile(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(body): Json<Row>,
) -> Result<Json<Row>> {
    if !principal.may_manage(Some(&id)) {
        return Err(ApiError::Forbidden(
            "Not authorized to update this profile".into(),
        ));
    }

    let patch = strip_columns(body, &[Resource::Alumni.id_column(), "created_at"]);
    let profile = state
        .repository
        .update(Resource::Alumni, &id, patch)
        .await
        .map_err(internal("Failed to update profile"))?
        .ok_or_else(|| ApiError::NotFound("Profile not found".into()))?;

    state
        .publisher
        .publish(ROOM_ALUMNI, PROFILE_UPDATED, Value::Object(profile.clone()));

    Ok(Json(profile))
}
