//! API Module
//!
//! HTTP handlers and routing for the alumni REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check
//! - `GET /api/v1/cache/stats` - Cache store status and counters
//! - `GET /api/v1/search/{global,alumni,events,forum,suggestions}` - Search
//! - `GET /api/v1/alumni`, `GET /api/v1/alumni/:id` - Directory (cached)
//! - `PUT /api/v1/alumni/:id/profile` - Profile update (invalidates)
//! - `GET|POST /api/v1/events`, `PUT /api/v1/events/:id` - Events
//! - `POST|DELETE /api/v1/events/:id/register` - Sign up or cancel (invalidates)
//! - `GET /api/v1/events/:id/registrations` - Sign-ups, organizer only (cached per viewer)
//! - `GET|POST /api/v1/forum/posts` - Forum
//! - `GET /api/v1/mentorship/matches` - Mentor candidates (cached)

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
