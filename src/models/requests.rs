//! Request DTOs for the alumni API
//!
//! Query-string parameters shared by the search and listing routes. Filter
//! parameters are decoded separately into the per-resource filter types.

use serde::Deserialize;

use super::search::SuggestionScope;

/// Default page size when the client gives none.
pub const DEFAULT_LIMIT: u32 = 20;
/// Largest page size a client may request.
pub const MAX_LIMIT: u32 = 100;

/// Page and page size, 1-based.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Page of a cached listing. Listings use a fixed page size so the cache key
/// only depends on the page and the filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<u32>,
}

impl ListParams {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}

/// Body of an event registration (POST /api/v1/events/:id/register).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub dietary_requirements: Option<String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

/// `q`, `page` and `limit` of a search route.
// Not flattened over `PageParams`: flattening loses numeric parsing of
// query-string values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl SearchParams {
    /// Trimmed query text, empty when absent.
    pub fn query(&self) -> &str {
        self.q.as_deref().map(str::trim).unwrap_or_default()
    }

    pub fn paging(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, rename = "type")]
    pub scope: SuggestionScope,
}

/// Forum listing parameters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForumListParams {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
}

impl ForumListParams {
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }
}
