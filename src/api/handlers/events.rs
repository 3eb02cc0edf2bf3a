//! Event endpoints.
//!
//! Organizers (or admins) manage their events and see who signed up; any
//! authenticated user may register for an upcoming, published event.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::Value;

use super::{fetch_page, internal, required_text, strip_columns, AppState};
use crate::error::{ApiError, Result};
use crate::middleware::Principal;
use crate::models::requests::DEFAULT_LIMIT;
use crate::models::{
    EventListResponse, ListParams, MessageResponse, RegistrationRequest, RegistrationsResponse,
};
use crate::realtime::{EVENT_UPDATED, ROOM_EVENTS};
use crate::search::{
    parse_instant, Condition, EventFilters, PageWindow, Predicate, Resource, Row, SearchFilters,
};

const PUBLISHED: &str = "published";
const REGISTERED: &str = "registered";
const CANCELLED: &str = "cancelled";

/// Handler for GET /api/v1/events
pub async fn list_events(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
    Query(filters): Query<EventFilters>,
) -> Result<Json<EventListResponse>> {
    let predicate = Predicate::new().extend(filters.conditions());
    let (events, pagination) = fetch_page(
        state.repository.as_ref(),
        Resource::Events,
        &predicate,
        params.page(),
        DEFAULT_LIMIT,
    )
    .await
    .map_err(internal("Failed to fetch events"))?;

    Ok(Json(EventListResponse { events, pagination }))
}

/// Handler for POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    principal: Principal,
    Json(body): Json<Row>,
) -> Result<(StatusCode, Json<Row>)> {
    if required_text(&body, "title").is_none() {
        return Err(ApiError::BadRequest("Event title is required".into()));
    }

    let mut event = strip_columns(body, &[Resource::Events.id_column(), "created_at", "current_attendees"]);
    event.insert("organizer_id".into(), Value::String(principal.user_id));
    event
        .entry("status")
        .or_insert_with(|| Value::String(PUBLISHED.into()));
    event.insert("current_attendees".into(), Value::from(0));

    let event = state
        .repository
        .insert(Resource::Events, event)
        .await
        .map_err(internal("Failed to create event"))?;

    state
        .publisher
        .publish(ROOM_EVENTS, EVENT_UPDATED, Value::Object(event.clone()));

    Ok((StatusCode::CREATED, Json(event)))
}

/// Handler for PUT /api/v1/events/:id
///
/// Only the organizer or an admin may change an event.
pub async fn update_event(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    Json(body): Json<Row>,
) -> Result<Json<Row>> {
    let existing = find_event(&state, &id).await?;
    if !principal.may_manage(organizer_of(&existing)) {
        return Err(ApiError::Forbidden("Not authorized to update this event".into()));
    }

    let patch = strip_columns(
        body,
        &[Resource::Events.id_column(), "created_at", "organizer_id", "current_attendees"],
    );
    let event = state
        .repository
        .update(Resource::Events, &id, patch)
        .await
        .map_err(internal("Failed to update event"))?
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))?;

    state
        .publisher
        .publish(ROOM_EVENTS, EVENT_UPDATED, Value::Object(event.clone()));

    Ok(Json(event))
}

/// Handler for POST /api/v1/events/:id/register
pub async fn register_for_event(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    body: Option<Json<RegistrationRequest>>,
) -> Result<(StatusCode, Json<Row>)> {
    let closed = || ApiError::NotFound("Event not found or registration closed".into());
    let event = state
        .repository
        .find(Resource::Events, &id)
        .await
        .map_err(internal("Failed to register for event"))?
        .ok_or_else(closed)?;
    if !registration_open(&event) {
        return Err(closed());
    }

    let mine = Predicate::new()
        .and(Condition::equals("event_id", id.as_str()))
        .and(Condition::equals("user_id", principal.user_id.as_str()));
    let existing = state
        .repository
        .count(Resource::Registrations, &mine)
        .await
        .map_err(internal("Failed to register for event"))?;
    if existing > 0 {
        return Err(ApiError::BadRequest(
            "You are already registered for this event".into(),
        ));
    }

    if let Some(capacity) = event.get("max_attendees").and_then(Value::as_u64) {
        let registered = state
            .repository
            .count(Resource::Registrations, &active_registrations(&id))
            .await
            .map_err(internal("Failed to register for event"))?;
        if registered >= capacity {
            return Err(ApiError::BadRequest("Event is full".into()));
        }
    }

    let request = body.map(|Json(request)| request).unwrap_or_default();
    let mut registration = Row::new();
    registration.insert("event_id".into(), Value::String(id.clone()));
    registration.insert("user_id".into(), Value::String(principal.user_id));
    registration.insert("status".into(), Value::String(REGISTERED.into()));
    registration.insert("registered_at".into(), Value::String(Utc::now().to_rfc3339()));
    if let Some(dietary) = request.dietary_requirements {
        registration.insert("dietary_requirements".into(), Value::String(dietary));
    }
    if let Some(info) = request.additional_info {
        registration.insert("additional_info".into(), Value::String(info));
    }

    let registration = state
        .repository
        .insert(Resource::Registrations, registration)
        .await
        .map_err(internal("Failed to register for event"))?;
    adjust_attendees(&state, &id, &event, 1).await?;

    Ok((StatusCode::CREATED, Json(registration)))
}

/// Handler for DELETE /api/v1/events/:id/register
pub async fn cancel_registration(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let mine = active_registrations(&id).and(Condition::equals("user_id", principal.user_id.as_str()));
    let registration = state
        .repository
        .query(
            Resource::Registrations,
            &mine,
            &Resource::Registrations.default_order(),
            PageWindow::for_page(1, 1),
        )
        .await
        .map_err(internal("Failed to cancel registration"))?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::NotFound("Registration not found".into()))?;

    let registration_id = registration
        .get(Resource::Registrations.id_column())
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::Internal("Failed to cancel registration".into()))?;

    let mut patch = Row::new();
    patch.insert("status".into(), Value::String(CANCELLED.into()));
    state
        .repository
        .update(Resource::Registrations, registration_id, patch)
        .await
        .map_err(internal("Failed to cancel registration"))?;

    if let Some(event) = state
        .repository
        .find(Resource::Events, &id)
        .await
        .map_err(internal("Failed to cancel registration"))?
    {
        adjust_attendees(&state, &id, &event, -1).await?;
    }

    Ok(Json(MessageResponse {
        message: "Event registration cancelled successfully".into(),
    }))
}

/// Handler for GET /api/v1/events/:id/registrations
///
/// Visible to the organizer and admins only.
pub async fn list_registrations(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Json<RegistrationsResponse>> {
    let event = find_event(&state, &id).await?;
    if !principal.may_manage(organizer_of(&event)) {
        return Err(ApiError::Forbidden("Not authorized to view registrations".into()));
    }

    let registrations = state
        .repository
        .query(
            Resource::Registrations,
            &Predicate::new().and(Condition::equals("event_id", id.as_str())),
            &Resource::Registrations.default_order(),
            PageWindow {
                limit: u32::MAX,
                offset: 0,
            },
        )
        .await
        .map_err(internal("Failed to fetch registrations"))?;

    Ok(Json(RegistrationsResponse { registrations }))
}

async fn find_event(state: &AppState, id: &str) -> Result<Row> {
    state
        .repository
        .find(Resource::Events, id)
        .await
        .map_err(internal("Failed to fetch event"))?
        .ok_or_else(|| ApiError::NotFound("Event not found".into()))
}

fn organizer_of(event: &Row) -> Option<&str> {
    event.get("organizer_id").and_then(Value::as_str)
}

fn active_registrations(event_id: &str) -> Predicate {
    Predicate::new()
        .and(Condition::equals("event_id", event_id))
        .and(Condition::equals("status", REGISTERED))
}

/// Published (or unmarked) events whose start lies ahead accept sign-ups.
fn registration_open(event: &Row) -> bool {
    let published = event
        .get("status")
        .and_then(Value::as_str)
        .map_or(true, |status| status == PUBLISHED);
    let upcoming = event
        .get("start_date")
        .and_then(Value::as_str)
        .and_then(parse_instant)
        .map_or(true, |start| start > Utc::now());
    published && upcoming
}

async fn adjust_attendees(state: &AppState, id: &str, event: &Row, delta: i64) -> Result<()> {
    let current = event
        .get("current_attendees")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let mut patch = Row::new();
    patch.insert("current_attendees".into(), Value::from((current + delta).max(0)));

    state
        .repository
        .update(Resource::Events, id, patch)
        .await
        .map_err(internal("Failed to update attendee count"))?;
    Ok(())
}
