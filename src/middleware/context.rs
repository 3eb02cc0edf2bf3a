//! Framework-neutral view of a request, handed to cache key and invalidation
//! pattern closures.

use std::collections::BTreeMap;

use axum::extract::{FromRequestParts, Query, RawPathParams};
use axum::http::request::Parts;
use axum::http::Uri;
use serde::de::DeserializeOwned;

use crate::error::KeyError;

/// Role allowed to manage any user's resources.
pub const ADMIN_ROLE: &str = "admin";

/// Identity attached by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub role: Option<String>,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some(ADMIN_ROLE)
    }

    /// Whether this principal may change a resource owned by `owner_id`.
    /// Admins may change anything; a resource without an owner is admin-only.
    pub fn may_manage(&self, owner_id: Option<&str>) -> bool {
        self.is_admin() || owner_id == Some(self.user_id.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RequestContext {
    uri: Uri,
    query: BTreeMap<String, String>,
    params: BTreeMap<String, String>,
    principal: Option<Principal>,
}

impl RequestContext {
    /// Captures URI, query, matched path parameters and principal.
    ///
    /// Path parameters are only visible to middleware that runs after routing,
    /// i.e. layers applied to a route rather than to the whole router.
    pub async fn from_parts(parts: &mut Parts) -> Self {
        let params = RawPathParams::from_request_parts(parts, &())
            .await
            .map(|raw| {
                raw.iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let query = Query::<BTreeMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(query)| query)
            .unwrap_or_default();

        Self {
            uri: parts.uri.clone(),
            query,
            params,
            principal: parts.extensions.get::<Principal>().cloned(),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// A matched path parameter, e.g. `id` in `/alumni/:id`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Like [`RequestContext::param`], failing when absent.
    pub fn require_param(&self, name: &str) -> Result<&str, KeyError> {
        self.param(name)
            .ok_or_else(|| KeyError::Params(format!("missing path parameter `{name}`")))
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Decodes the query string into `T`.
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T, KeyError> {
        Query::<T>::try_from_uri(&self.uri)
            .map(|Query(value)| value)
            .map_err(|rejection| KeyError::Params(rejection.body_text()))
    }

    /// `page` query parameter, 1 when absent or invalid.
    pub fn page(&self) -> u32 {
        self.query("page")
            .and_then(|page| page.parse().ok())
            .filter(|page: &u32| *page >= 1)
            .unwrap_or(1)
    }

    /// The authenticated user's id, failing for anonymous requests.
    pub fn require_user(&self) -> Result<&str, KeyError> {
        self.principal
            .as_ref()
            .map(|principal| principal.user_id.as_str())
            .ok_or_else(|| KeyError::Params("no authenticated user".into()))
    }
}
