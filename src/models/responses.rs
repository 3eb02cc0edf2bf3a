//! Response DTOs for the alumni API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use super::search::Pagination;
use crate::cache::BackendKind;
use crate::search::Row;

/// Paginated alumni directory page (GET /api/v1/alumni)
#[derive(Debug, Clone, Serialize)]
pub struct AlumniListResponse {
    pub alumni: Vec<Row>,
    pub pagination: Pagination,
}

/// Paginated events page (GET /api/v1/events)
#[derive(Debug, Clone, Serialize)]
pub struct EventListResponse {
    pub events: Vec<Row>,
    pub pagination: Pagination,
}

/// Forum posts page (GET /api/v1/forum/posts)
#[derive(Debug, Clone, Serialize)]
pub struct ForumPostsResponse {
    pub posts: Vec<Row>,
    pub pagination: Pagination,
}

/// Mentor candidates for the current user (GET /api/v1/mentorship/matches)
#[derive(Debug, Clone, Serialize)]
pub struct MentorshipMatchesResponse {
    pub matches: Vec<Row>,
}

/// Sign-ups for one event (GET /api/v1/events/:id/registrations)
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationsResponse {
    pub registrations: Vec<Row>,
}

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status; "healthy", or "degraded" while the cache backend is down
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
    /// Backend serving the cache
    pub cache: BackendKind,
}

impl HealthResponse {
    /// Creates a HealthResponse with the current timestamp.
    pub fn new(cache: BackendKind, cache_connected: bool) -> Self {
        let status = if cache_connected { "healthy" } else { "degraded" };
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            cache,
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
