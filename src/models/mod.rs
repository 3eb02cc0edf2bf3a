//! Request and Response models for the alumni API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies, and the search
//! result shapes that are also stored in the cache.

pub mod requests;
pub mod responses;
pub mod search;

// Re-export commonly used types
pub use requests::{
    ForumListParams, ListParams, PageParams, RegistrationRequest, SearchParams, SuggestionParams,
};
pub use responses::{
    AlumniListResponse, ErrorResponse, EventListResponse, ForumPostsResponse, HealthResponse,
    MentorshipMatchesResponse, MessageResponse, RegistrationsResponse,
};
pub use search::{GlobalSearchResult, Pagination, SearchResult, Suggestion, SuggestionScope};
