//! API Routes
//!
//! Configures the Axum router. Cacheable reads get a response cache layer keyed
//! from the registry; mutations get an invalidation layer naming every key family
//! they make stale. Auth runs outside both, so key closures can see the caller.

use axum::{
    middleware::from_fn,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, cancel_registration, create_event, create_forum_post, get_alumni,
    global_search, health_handler, list_alumni, list_events, list_forum_posts, list_registrations,
    mentorship_matches, register_for_event, search_alumni, search_events, search_forum,
    search_suggestions, update_event, update_profile, AppState,
};
use crate::cache::keys::{self, SearchKind};
use crate::middleware::{
    optional_auth, require_auth, with_invalidation, with_response_cache, KeySource, PatternSource,
};
use crate::search::{EventFilters, ProfileFilters};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/cache/stats", get(cache_stats_handler))
        .nest("/api/v1/search", search_routes())
        .nest("/api/v1", resource_routes(&state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/global", get(global_search))
        .route("/alumni", get(search_alumni))
        .route("/events", get(search_events))
        .route("/forum", get(search_forum))
        .route("/suggestions", get(search_suggestions))
        .route_layer(from_fn(require_auth))
}

fn resource_routes(state: &AppState) -> Router<AppState> {
    let store = &state.cache;
    let ttl = state.config.response_cache_ttl;

    let alumni_list = KeySource::dynamic(|ctx| {
        let filters: ProfileFilters = ctx.query_as()?;
        Ok(keys::alumni_list(ctx.page(), &filters)?)
    });
    let alumni_profile = KeySource::dynamic(|ctx| Ok(keys::user_profile(ctx.require_param("id")?)));
    let events_list = KeySource::dynamic(|ctx| {
        let filters: EventFilters = ctx.query_as()?;
        Ok(keys::events_list(ctx.page(), &filters)?)
    });
    let forum_posts = KeySource::dynamic(|ctx| {
        let category = ctx.query("category").map(str::trim).filter(|c| !c.is_empty());
        Ok(keys::forum_posts(category, ctx.page()))
    });
    let matches = KeySource::dynamic(|ctx| Ok(keys::mentorship_matches(ctx.require_user()?)));
    let registrations = KeySource::dynamic(|ctx| {
        Ok(keys::event_registrations(ctx.require_param("id")?, ctx.require_user()?))
    });

    let profile_changed = PatternSource::dynamic(|ctx| {
        Ok(vec![
            keys::user_profile(ctx.require_param("id")?),
            "alumni:list:*".to_string(),
            keys::search_pattern(SearchKind::Alumni),
            keys::search_pattern(SearchKind::Global),
            "mentorship:matches:*".to_string(),
        ])
    });
    let events_changed = PatternSource::fixed([
        "events:list:*".to_string(),
        keys::search_pattern(SearchKind::Events),
        keys::search_pattern(SearchKind::Global),
    ]);
    let registration_changed = PatternSource::dynamic(|ctx| {
        Ok(vec![
            keys::event_registrations_pattern(ctx.require_param("id")?),
            "events:list:*".to_string(),
            keys::search_pattern(SearchKind::Events),
            keys::search_pattern(SearchKind::Global),
        ])
    });
    let forum_changed = PatternSource::fixed([
        "forum:posts:*".to_string(),
        keys::search_pattern(SearchKind::Forum),
        keys::search_pattern(SearchKind::Global),
    ]);

    Router::new()
        .route(
            "/alumni",
            get(list_alumni)
                .route_layer(with_response_cache(store.clone(), alumni_list, ttl))
                .route_layer(from_fn(optional_auth)),
        )
        .route(
            "/alumni/:id",
            get(get_alumni)
                .route_layer(with_response_cache(store.clone(), alumni_profile, ttl))
                .route_layer(from_fn(optional_auth)),
        )
        .route(
            "/alumni/:id/profile",
            put(update_profile)
                .route_layer(with_invalidation(store.clone(), profile_changed))
                .route_layer(from_fn(require_auth)),
        )
        .route(
            "/events",
            get(list_events)
                .route_layer(with_response_cache(store.clone(), events_list, ttl))
                .route_layer(from_fn(optional_auth))
                .merge(
                    post(create_event)
                        .route_layer(with_invalidation(store.clone(), events_changed.clone()))
                        .route_layer(from_fn(require_auth)),
                ),
        )
        .route(
            "/events/:id",
            put(update_event)
                .route_layer(with_invalidation(store.clone(), events_changed))
                .route_layer(from_fn(require_auth)),
        )
        .route(
            "/events/:id/register",
            post(register_for_event)
                .route_layer(with_invalidation(store.clone(), registration_changed.clone()))
                .route_layer(from_fn(require_auth))
                .merge(
                    delete(cancel_registration)
                        .route_layer(with_invalidation(store.clone(), registration_changed))
                        .route_layer(from_fn(require_auth)),
                ),
        )
        .route(
            "/events/:id/registrations",
            get(list_registrations)
                .route_layer(with_response_cache(store.clone(), registrations, ttl))
                .route_layer(from_fn(require_auth)),
        )
        .route(
            "/forum/posts",
            get(list_forum_posts)
                .route_layer(with_response_cache(store.clone(), forum_posts, ttl))
                .route_layer(from_fn(optional_auth))
                .merge(
                    post(create_forum_post)
                        .route_layer(with_invalidation(store.clone(), forum_changed))
                        .route_layer(from_fn(require_auth)),
                ),
        )
        .route(
            "/mentorship/matches",
            get(mentorship_matches)
                .route_layer(with_response_cache(store.clone(), matches, ttl))
                .route_layer(from_fn(require_auth)),
        )
}
