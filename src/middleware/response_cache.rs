//! Response cache middleware.
//!
//! Wraps a route so the cache is consulted before the handler and fed after it.
//! A hit is answered straight from the store and the handler never runs. On a
//! miss the handler's response is buffered; when it is a 2xx JSON body the value
//! is written back in a detached task so the client never waits on the cache.
//! Failing to resolve the key only disables caching for that request.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::context::RequestContext;
use crate::cache::CacheStore;
use crate::error::KeyError;

/// Header telling clients whether a cacheable response came from the cache.
pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Default TTL for cached responses, in seconds.
pub const DEFAULT_RESPONSE_TTL_SECS: u64 = 300;

pub type KeyFn = dyn Fn(&RequestContext) -> Result<String, KeyError> + Send + Sync;

/// Where the cache key of a request comes from.
#[derive(Clone)]
pub enum KeySource {
    Fixed(String),
    Dynamic(Arc<KeyFn>),
}

impl KeySource {
    pub fn fixed(key: impl Into<String>) -> Self {
        KeySource::Fixed(key.into())
    }

    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<String, KeyError> + Send + Sync + 'static,
    {
        KeySource::Dynamic(Arc::new(f))
    }

    pub fn resolve(&self, ctx: &RequestContext) -> Result<String, KeyError> {
        match self {
            KeySource::Fixed(key) => Ok(key.clone()),
            KeySource::Dynamic(f) => f(ctx),
        }
    }
}

/// Builds the response cache layer for a route.
pub fn with_response_cache(store: Arc<CacheStore>, key: KeySource, ttl_secs: u64) -> ResponseCacheLayer {
    ResponseCacheLayer {
        store,
        key,
        ttl_secs,
    }
}

#[derive(Clone)]
pub struct ResponseCacheLayer {
    store: Arc<CacheStore>,
    key: KeySource,
    ttl_secs: u64,
}

impl<S> Layer<S> for ResponseCacheLayer {
    type Service = ResponseCache<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ResponseCache {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct ResponseCache<S> {
    inner: S,
    layer: ResponseCacheLayer,
}

impl<S> Service<Request<Body>> for ResponseCache<S>
where
    S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let ResponseCacheLayer { store, key, ttl_secs } = self.layer.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();
            let ctx = RequestContext::from_parts(&mut parts).await;
            let request = Request::from_parts(parts, body);

            let key = match key.resolve(&ctx) {
                Ok(key) => key,
                Err(err) => {
                    warn!(path = %ctx.path(), error = %err, "Response cache key unavailable, serving uncached");
                    return inner.call(request).await;
                }
            };

            if let Some(cached) = store.get(&key).await {
                debug!(key = %key, "Serving cached response");
                return Ok(with_cache_header(Json(cached).into_response(), "HIT"));
            }

            let response = inner.call(request).await?;
            if !response.status().is_success() || !is_json(&response) {
                return Ok(response);
            }

            let (parts, body) = response.into_parts();
            let bytes = match to_bytes(body, usize::MAX).await {
                Ok(bytes) => bytes,
                Err(err) => {
                    warn!(key = %key, error = %err, "Failed to read handler response");
                    return Ok(StatusCode::INTERNAL_SERVER_ERROR.into_response());
                }
            };

            match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => {
                    tokio::spawn(async move {
                        store.set(&key, &value, Some(ttl_secs)).await;
                    });
                }
                Err(err) => warn!(key = %key, error = %err, "Handler response is not valid JSON, not caching"),
            }

            let response = Response::from_parts(parts, Body::from(bytes));
            Ok(with_cache_header(response, "MISS"))
        })
    }
}

fn is_json(response: &Response<Body>) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"))
}

fn with_cache_header(mut response: Response<Body>, status: &'static str) -> Response<Body> {
    response
        .headers_mut()
        .insert(X_CACHE.clone(), HeaderValue::from_static(status));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use axum::Router;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tower::ServiceExt;

    fn store() -> Arc<CacheStore> {
        Arc::new(CacheStore::in_memory(100, Duration::from_secs(3600)))
    }

    fn counting_app(store: Arc<CacheStore>, key: KeySource, calls: Arc<AtomicUsize>, status: StatusCode) -> Router {
        let handler = move || {
            let calls = calls.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                (status, Json(json!({"calls": n})))
            }
        };

        Router::new().route(
            "/items/:id",
            get(handler).route_layer(with_response_cache(store, key, DEFAULT_RESPONSE_TTL_SECS)),
        )
    }

    async fn send(app: &Router, uri: &str) -> Response<Body> {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    /// Cache writes happen off the request path.
    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(store(), KeySource::fixed("items"), calls.clone(), StatusCode::OK);

        let first = send(&app, "/items/1").await;
        assert_eq!(first.headers()[&X_CACHE], "MISS");
        assert_eq!(json_body(first).await, json!({"calls": 1}));
        settle().await;

        let second = send(&app, "/items/1").await;
        assert_eq!(second.headers()[&X_CACHE], "HIT");
        assert_eq!(json_body(second).await, json!({"calls": 1}));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "handler must not run on a hit");
    }

    #[tokio::test]
    async fn test_dynamic_key_uses_path_params() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let key = KeySource::dynamic(|ctx| Ok(format!("item:{}", ctx.require_param("id")?)));
        let app = counting_app(store.clone(), key, calls.clone(), StatusCode::OK);

        send(&app, "/items/1").await;
        settle().await;
        send(&app, "/items/2").await;
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.get("item:1").await, Some(json!({"calls": 1})));
        assert_eq!(store.get("item:2").await, Some(json!({"calls": 2})));
    }

    #[tokio::test]
    async fn test_error_responses_are_not_cached() {
        let store = store();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = counting_app(store.clone(), KeySource::fixed("items"), calls.clone(), StatusCode::NOT_FOUND);

        let response = send(&app, "/items/1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(&X_CACHE).is_none());
        settle().await;

        send(&app, "/items/1").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(store.get("items").await, None);
    }

    #[tokio::test]
    async fn test_key_failure_serves_uncached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let key = KeySource::dynamic(|ctx| Ok(ctx.require_user()?.to_string()));
        let app = counting_app(store(), key, calls.clone(), StatusCode::OK);

        let response = send(&app, "/items/1").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(&X_CACHE).is_none());
        settle().await;

        send(&app, "/items/1").await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_non_json_passes_through() {
        let store = store();
        let app = Router::new().route(
            "/text",
            get(|| async { "plain" }).route_layer(with_response_cache(
                store.clone(),
                KeySource::fixed("text"),
                DEFAULT_RESPONSE_TTL_SECS,
            )),
        );

        let response = send(&app, "/text").await;
        assert_eq!(response.status(), StatusCode::OK);
        settle().await;
        assert_eq!(store.get("text").await, None);
    }
}
