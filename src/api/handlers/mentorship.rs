//! Mentorship matching.

use axum::{extract::State, Json};
use serde_json::Value;

use super::{internal, AppState};
use crate::error::Result;
use crate::middleware::Principal;
use crate::models::MentorshipMatchesResponse;
use crate::search::{Condition, PageWindow, Predicate, Resource};

const MAX_MATCHES: u32 = 10;

/// Handler for GET /api/v1/mentorship/matches
///
/// Alumni open to mentoring, narrowed to the caller's industry when their own
/// profile names one. The caller is never matched with themselves.
pub async fn mentorship_matches(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<MentorshipMatchesResponse>> {
    let own_profile = state
        .repository
        .find(Resource::Alumni, &principal.user_id)
        .await
        .map_err(internal("Failed to fetch mentorship matches"))?;

    let mut predicate = Predicate::new().and(Condition::equals("mentorship_available", true));
    if let Some(industry) = own_profile
        .as_ref()
        .and_then(|profile| profile.get("industry"))
        .and_then(Value::as_str)
    {
        predicate = predicate.and(Condition::equals("industry", industry));
    }

    // One extra row covers the caller showing up in their own results
    let mut matches = state
        .repository
        .query(
            Resource::Alumni,
            &predicate,
            &Resource::Alumni.default_order(),
            PageWindow::for_page(1, MAX_MATCHES + 1),
        )
        .await
        .map_err(internal("Failed to fetch mentorship matches"))?;

    let id_column = Resource::Alumni.id_column();
    matches.retain(|row| row.get(id_column).and_then(Value::as_str) != Some(principal.user_id.as_str()));
    matches.truncate(MAX_MATCHES as usize);

    Ok(Json(MentorshipMatchesResponse { matches }))
}
