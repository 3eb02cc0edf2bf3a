//! Invalidation middleware.
//!
//! After a mutating route answers with a 2xx status, the configured patterns are
//! resolved and cleared in a detached task; the response is returned without
//! waiting for it. Non-2xx responses leave the cache untouched.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{Request, Response};
use tower::{Layer, Service};
use tracing::{debug, warn};

use super::context::RequestContext;
use crate::cache::CacheStore;
use crate::error::KeyError;

pub type PatternFn = dyn Fn(&RequestContext) -> Result<Vec<String>, KeyError> + Send + Sync;

/// Where the invalidation patterns of a request come from.
#[derive(Clone)]
pub enum PatternSource {
    Fixed(Vec<String>),
    Dynamic(Arc<PatternFn>),
}

impl PatternSource {
    pub fn fixed<I, P>(patterns: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        PatternSource::Fixed(patterns.into_iter().map(Into::into).collect())
    }

    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&RequestContext) -> Result<Vec<String>, KeyError> + Send + Sync + 'static,
    {
        PatternSource::Dynamic(Arc::new(f))
    }

    pub fn resolve(&self, ctx: &RequestContext) -> Result<Vec<String>, KeyError> {
        match self {
            PatternSource::Fixed(patterns) => Ok(patterns.clone()),
            PatternSource::Dynamic(f) => f(ctx),
        }
    }
}

/// Builds the invalidation layer for a mutating route.
pub fn with_invalidation(store: Arc<CacheStore>, patterns: PatternSource) -> InvalidationLayer {
    InvalidationLayer { store, patterns }
}

#[derive(Clone)]
pub struct InvalidationLayer {
    store: Arc<CacheStore>,
    patterns: PatternSource,
}

impl<S> Layer<S> for InvalidationLayer {
    type Service = Invalidation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Invalidation {
            inner,
            layer: self.clone(),
        }
    }
}

#[derive(Clone)]
pub struct Invalidation<S> {
    inner: S,
    layer: InvalidationLayer,
}

impl<S> Service<Request<Body>> for Invalidation<S>
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
        let InvalidationLayer { store, patterns } = self.layer.clone();
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();
            let ctx = RequestContext::from_parts(&mut parts).await;

            let response = inner.call(Request::from_parts(parts, body)).await?;

            if response.status().is_success() {
                tokio::spawn(invalidate(store, patterns, ctx));
            }

            Ok(response)
        })
    }
}

async fn invalidate(store: Arc<CacheStore>, patterns: PatternSource, ctx: RequestContext) {
    let patterns = match patterns.resolve(&ctx) {
        Ok(patterns) => patterns,
        Err(err) => {
            warn!(path = %ctx.path(), error = %err, "Cache invalidation skipped");
            return;
        }
    };

    for pattern in &patterns {
        if !store.invalidate_pattern(pattern).await {
            warn!(pattern = %pattern, "Cache invalidation failed, entries expire on their TTL");
        }
    }
    debug!(path = %ctx.path(), count = patterns.len(), "Cache invalidated after mutation");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::put;
    use axum::Router;
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn seeded_store() -> Arc<CacheStore> {
        let store = Arc::new(CacheStore::in_memory(100, Duration::from_secs(3600)));
        store.set("user:profile:1", &json!("one"), None).await;
        store.set("user:profile:2", &json!("two"), None).await;
        store.set("alumni:list:1:{}", &json!([]), None).await;
        store
    }

    fn app(store: Arc<CacheStore>, status: StatusCode) -> Router {
        let patterns = PatternSource::dynamic(|ctx| {
            Ok(vec![
                format!("user:profile:{}", ctx.require_param("id")?),
                "alumni:list:*".to_string(),
            ])
        });

        Router::new().route(
            "/profiles/:id",
            put(move || async move { status }).route_layer(with_invalidation(store, patterns)),
        )
    }

    async fn send(app: Router, uri: &str) -> StatusCode {
        app.oneshot(Request::builder().method("PUT").uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_success_invalidates_resolved_patterns() {
        let store = seeded_store().await;

        assert_eq!(send(app(store.clone(), StatusCode::OK), "/profiles/1").await, StatusCode::OK);
        settle().await;

        assert_eq!(store.get("user:profile:1").await, None);
        assert_eq!(store.get("alumni:list:1:{}").await, None);
        assert_eq!(store.get("user:profile:2").await, Some(json!("two")));
    }

    #[tokio::test]
    async fn test_failed_mutation_leaves_cache_alone() {
        let store = seeded_store().await;

        assert_eq!(
            send(app(store.clone(), StatusCode::BAD_REQUEST), "/profiles/1").await,
            StatusCode::BAD_REQUEST
        );
        settle().await;

        assert_eq!(store.get("user:profile:1").await, Some(json!("one")));
        assert_eq!(store.get("alumni:list:1:{}").await, Some(json!([])));
    }

    #[tokio::test]
    async fn test_fixed_patterns() {
        let store = seeded_store().await;
        let app = Router::new().route(
            "/reset",
            put(|| async { StatusCode::NO_CONTENT })
                .route_layer(with_invalidation(store.clone(), PatternSource::fixed(["user:profile:*"]))),
        );

        assert_eq!(send(app, "/reset").await, StatusCode::NO_CONTENT);
        settle().await;

        assert_eq!(store.get("user:profile:1").await, None);
        assert_eq!(store.get("user:profile:2").await, None);
        assert!(store.get("alumni:list:1:{}").await.is_some());
    }
}
