//! Authentication middleware.
//!
//! Identity is asserted by the gateway in front of the service through the
//! `x-user-id` and `x-user-role` headers. The middleware turns them into a
//! [`Principal`] request extension; handlers extract it directly.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::context::Principal;
use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn principal_from_headers(headers: &HeaderMap) -> Option<Principal> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    };

    header(USER_ID_HEADER).map(|user_id| Principal {
        user_id,
        role: header(USER_ROLE_HEADER),
    })
}

/// Rejects requests without an identity with 401.
pub async fn require_auth(mut request: Request, next: Next) -> Result<Response, ApiError> {
    let principal = principal_from_headers(request.headers())
        .ok_or_else(|| ApiError::Unauthorized("Not authorized, no token".into()))?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Attaches an identity when one is present; never rejects.
pub async fn optional_auth(mut request: Request, next: Next) -> Response {
    if let Some(principal) = principal_from_headers(request.headers()) {
        request.extensions_mut().insert(principal);
    }
    next.run(request).await
}

#[axum::async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| ApiError::Unauthorized("Not authorized".into()))
    }
}
