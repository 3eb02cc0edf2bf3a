//! Error types for the alumni cache service
//!
//! Provides unified error handling using thiserror. Cache errors stay inside the
//! cache layer; repository and search errors travel up to the HTTP layer where
//! [`ApiError`] turns them into responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Errors raised by cache backends.
///
/// These never reach a caller of [`crate::cache::CacheStore`]; the store logs them
/// and degrades to a miss or a `false` result.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The backend could not be reached (refused, dropped, timed out)
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with an error
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// A value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            CacheError::Unavailable(err.to_string())
        } else {
            CacheError::Backend(err.to_string())
        }
    }
}

// == Key Error Enum ==
/// Errors raised while resolving a cache key or invalidation pattern from a
/// request. The middlewares log these and carry on uncached.
#[derive(Error, Debug)]
pub enum KeyError {
    /// The request lacks a parameter the key is built from
    #[error("Cannot resolve cache key: {0}")]
    Params(String),

    /// Key parameters could not be serialized
    #[error("Cannot serialize cache key parameters: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Repository Error Enum ==
/// Errors raised by the data-access layer.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The underlying store failed to answer
    #[error("Data access failed: {0}")]
    Unavailable(String),
}

// == Search Error Enum ==
/// Errors raised by the search aggregation service.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

// == Api Error Enum ==
/// HTTP-facing error type for route handlers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Invalid request data
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed
    #[error("{0}")]
    Forbidden(String),

    /// Internal server error; the message is what the client sees
    #[error("{0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for route handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
