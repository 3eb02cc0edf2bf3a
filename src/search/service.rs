//! Search aggregation service.
//!
//! Per-type searches are cache-aside: look up the registry key, and on a miss run
//! the count and page queries against the repository with the same predicate,
//! then store the assembled page. Global search fans the three per-type searches
//! out concurrently and caches the joined result under its own, shorter-lived key.
//! Event results carry their `registration_count`.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::filters::{EventFilters, ForumFilters, ProfileFilters, SearchFilters};
use super::repository::{Condition, PageWindow, Predicate, Repository, Resource, Row};
use crate::cache::keys::{self, SearchKind};
use crate::cache::CacheStore;
use crate::error::SearchError;
use crate::models::search::{GlobalSearchResult, Pagination, SearchResult, Suggestion, SuggestionScope};

/// TTL of a cached per-type search page, in seconds.
pub const SEARCH_TTL_SECS: u64 = 300;
/// TTL of a cached global search, in seconds.
pub const GLOBAL_SEARCH_TTL_SECS: u64 = 120;
/// Rows per type in a global search, whatever the caller asked for.
pub const GLOBAL_SEARCH_LIMIT: u32 = 5;

const MAX_SUGGESTIONS: usize = 10;
const COMPANY_SUGGESTIONS: usize = 5;
const EVENT_TYPE_SUGGESTIONS: usize = 3;

pub struct SearchService {
    repository: Arc<dyn Repository>,
    cache: Arc<CacheStore>,
}

impl SearchService {
    pub fn new(repository: Arc<dyn Repository>, cache: Arc<CacheStore>) -> Self {
        Self { repository, cache }
    }

    pub async fn search_profiles(
        &self,
        query: &str,
        filters: &ProfileFilters,
        page: u32,
        limit: u32,
    ) -> Result<SearchResult<ProfileFilters>, SearchError> {
        self.run_search(Resource::Alumni, SearchKind::Alumni, query, filters, page, limit)
            .await
    }

    pub async fn search_events(
        &self,
        query: &str,
        filters: &EventFilters,
        page: u32,
        limit: u32,
    ) -> Result<SearchResult<EventFilters>, SearchError> {
        self.run_search(Resource::Events, SearchKind::Events, query, filters, page, limit)
            .await
    }

    pub async fn search_forum_posts(
        &self,
        query: &str,
        filters: &ForumFilters,
        page: u32,
        limit: u32,
    ) -> Result<SearchResult<ForumFilters>, SearchError> {
        self.run_search(Resource::ForumPosts, SearchKind::Forum, query, filters, page, limit)
            .await
    }

    /// Searches all three resources at once. Fails as a whole if any part fails.
    pub async fn global_search(&self, query: &str, page: u32) -> Result<GlobalSearchResult, SearchError> {
        let key = keys::search_results(query, SearchKind::Global, page);
        if let Some(cached) = self.cache.get_json::<GlobalSearchResult>(&key).await {
            return Ok(cached);
        }

        let profile_filters = ProfileFilters::default();
        let event_filters = EventFilters::default();
        let forum_filters = ForumFilters::default();
        let (alumni, events, forum_posts) = tokio::try_join!(
            self.search_profiles(query, &profile_filters, 1, GLOBAL_SEARCH_LIMIT),
            self.search_events(query, &event_filters, 1, GLOBAL_SEARCH_LIMIT),
            self.search_forum_posts(query, &forum_filters, 1, GLOBAL_SEARCH_LIMIT),
        )?;

        let result = GlobalSearchResult {
            alumni: alumni.results,
            events: events.results,
            forum_posts: forum_posts.results,
            query: query.to_string(),
            timestamp: Utc::now(),
        };

        self.cache
            .set_json(&key, &result, Some(GLOBAL_SEARCH_TTL_SECS))
            .await;
        Ok(result)
    }

    /// Frequent company names and event types containing `partial`. Not cached.
    pub async fn suggestions(&self, partial: &str, scope: SuggestionScope) -> Result<Vec<Suggestion>, SearchError> {
        let partial = partial.trim();
        if partial.is_empty() {
            return Ok(Vec::new());
        }

        let mut suggestions = Vec::new();

        if scope.includes_alumni() {
            let companies = self
                .repository
                .top_values(Resource::Alumni, "company", partial, COMPANY_SUGGESTIONS)
                .await?;
            suggestions.extend(companies.into_iter().map(|text| Suggestion {
                text,
                kind: "company".to_string(),
            }));
        }

        if scope.includes_events() {
            let event_types = self
                .repository
                .top_values(Resource::Events, "event_type", partial, EVENT_TYPE_SUGGESTIONS)
                .await?;
            suggestions.extend(event_types.into_iter().map(|text| Suggestion {
                text,
                kind: "event_type".to_string(),
            }));
        }

        suggestions.truncate(MAX_SUGGESTIONS);
        Ok(suggestions)
    }

    async fn run_search<F>(
        &self,
        resource: Resource,
        kind: SearchKind,
        query: &str,
        filters: &F,
        page: u32,
        limit: u32,
    ) -> Result<SearchResult<F>, SearchError>
    where
        F: SearchFilters + Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        let page = page.max(1);
        let limit = limit.max(1);

        // A key that cannot be built only costs the cache, never the search
        let key = match keys::filtered_search_results(query, kind, page, limit, filters) {
            Ok(key) => Some(key),
            Err(err) => {
                warn!(kind = %kind, error = %err, "Could not build search cache key, searching uncached");
                None
            }
        };

        if let Some(key) = key.as_deref() {
            if let Some(cached) = self.cache.get_json::<SearchResult<F>>(key).await {
                return Ok(cached);
            }
        }

        let mut predicate = Predicate::new();
        if !query.is_empty() {
            predicate = predicate.and(Condition::any_contains(resource.text_columns(), query));
        }
        let predicate = predicate.extend(filters.conditions());

        let total = self.repository.count(resource, &predicate).await?;
        let mut results = self
            .repository
            .query(
                resource,
                &predicate,
                &resource.default_order(),
                PageWindow::for_page(page, limit),
            )
            .await?;
        if resource == Resource::Events {
            self.attach_registration_counts(&mut results).await?;
        }

        debug!(resource = %resource, total, returned = results.len(), "Search executed");

        let result = SearchResult {
            results,
            pagination: Pagination::new(page, limit, total),
            query: query.to_string(),
            filters: filters.clone(),
        };

        if let Some(key) = key.as_deref() {
            self.cache.set_json(key, &result, Some(SEARCH_TTL_SECS)).await;
        }
        Ok(result)
    }

    /// Adds `registration_count` to every event row with one grouped count.
    async fn attach_registration_counts(&self, events: &mut [Row]) -> Result<(), SearchError> {
        let id_column = Resource::Events.id_column();
        let ids: Vec<String> = events
            .iter()
            .filter_map(|event| event.get(id_column).and_then(Value::as_str))
            .map(str::to_string)
            .collect();
        if ids.is_empty() {
            return Ok(());
        }

        let counts = self
            .repository
            .count_by(Resource::Registrations, "event_id", &ids)
            .await?;

        for event in events.iter_mut() {
            let count = event
                .get(id_column)
                .and_then(Value::as_str)
                .and_then(|id| counts.get(id))
                .copied()
                .unwrap_or(0);
            event.insert("registration_count".to_string(), Value::from(count));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RepositoryError;
    use crate::search::{InMemoryRepository, SortOrder};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::time::{Duration, Instant};

    /// Wraps the in-memory repository with a per-call delay, a failure switch and
    /// a call counter.
    struct InstrumentedRepository {
        inner: InMemoryRepository,
        delay: Duration,
        fail_on: Option<Resource>,
        failing: AtomicBool,
        calls: AtomicU64,
    }

    impl InstrumentedRepository {
        fn new(inner: InMemoryRepository) -> Self {
            Self {
                inner,
                delay: Duration::ZERO,
                fail_on: None,
                failing: AtomicBool::new(false),
                calls: AtomicU64::new(0),
            }
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }

        async fn enter(&self, resource: Resource) -> Result<(), RepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let fails = self.failing.load(Ordering::SeqCst) || self.fail_on == Some(resource);
            if fails {
                return Err(RepositoryError::Unavailable("connection reset".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Repository for InstrumentedRepository {
        async fn count(&self, resource: Resource, predicate: &Predicate) -> Result<u64, RepositoryError> {
            self.enter(resource).await?;
            self.inner.count(resource, predicate).await
        }

        async fn query(
            &self,
            resource: Resource,
            predicate: &Predicate,
            order: &SortOrder,
            window: PageWindow,
        ) -> Result<Vec<Row>, RepositoryError> {
            self.enter(resource).await?;
            self.inner.query(resource, predicate, order, window).await
        }

        async fn top_values(
            &self,
            resource: Resource,
            column: &str,
            needle: &str,
            limit: usize,
        ) -> Result<Vec<String>, RepositoryError> {
            self.enter(resource).await?;
            self.inner.top_values(resource, column, needle, limit).await
        }

        async fn count_by(
            &self,
            resource: Resource,
            column: &str,
            values: &[String],
        ) -> Result<HashMap<String, u64>, RepositoryError> {
            self.enter(resource).await?;
            self.inner.count_by(resource, column, values).await
        }

        async fn find(&self, resource: Resource, id: &str) -> Result<Option<Row>, RepositoryError> {
            self.enter(resource).await?;
            self.inner.find(resource, id).await
        }

        async fn insert(&self, resource: Resource, row: Row) -> Result<Row, RepositoryError> {
            self.inner.insert(resource, row).await
        }

        async fn update(&self, resource: Resource, id: &str, patch: Row) -> Result<Option<Row>, RepositoryError> {
            self.inner.update(resource, id, patch).await
        }
    }

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("fixture rows are objects"),
        }
    }

    fn fixture() -> InMemoryRepository {
        InMemoryRepository::with_rows([
            (
                Resource::Alumni,
                vec![
                    row(json!({"user_id": "1", "full_name": "Ada Lovelace", "company": "Google", "industry": "Tech"})),
                    row(json!({"user_id": "2", "full_name": "Grace Hopper", "company": "Navy", "industry": "Tech"})),
                    row(json!({"user_id": "3", "full_name": "Linus Pauling", "company": "Caltech", "industry": "Science"})),
                ],
            ),
            (
                Resource::Events,
                vec![
                    row(json!({"id": "e1", "title": "Python meetup", "event_type": "networking", "start_date": "2024-05-01"})),
                    row(json!({"id": "e2", "title": "Career fair", "event_type": "career", "start_date": "2024-06-01"})),
                ],
            ),
            (
                Resource::ForumPosts,
                vec![row(json!({"id": "p1", "title": "Learning python", "content": "Where to start?", "created_at": "2024-01-01T00:00:00Z"}))],
            ),
            (
                Resource::Registrations,
                vec![
                    row(json!({"id": "r1", "event_id": "e1", "user_id": "1", "status": "registered"})),
                    row(json!({"id": "r2", "event_id": "e1", "user_id": "2", "status": "cancelled"})),
                ],
            ),
        ])
    }

    fn service(repository: Arc<InstrumentedRepository>) -> SearchService {
        let cache = Arc::new(CacheStore::in_memory(1000, Duration::from_secs(3600)));
        SearchService::new(repository, cache)
    }

    fn tech() -> ProfileFilters {
        ProfileFilters {
            industry: Some("Tech".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_profile_search_is_cached() {
        let repo = Arc::new(InstrumentedRepository::new(fixture()));
        let service = service(repo.clone());

        let first = service.search_profiles("google", &tech(), 1, 20).await.unwrap();
        assert_eq!(first.results.len(), 1);
        assert_eq!(first.pagination.total, 1);
        assert_eq!(first.pagination.total_pages, 1);
        assert_eq!(first.filters, tech());

        let calls = repo.calls();
        let second = service.search_profiles("google", &tech(), 1, 20).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(repo.calls(), calls, "second call must not touch the repository");
    }

    #[tokio::test]
    async fn test_filters_and_limit_get_their_own_entries() {
        let repo = Arc::new(InstrumentedRepository::new(fixture()));
        let service = service(repo.clone());

        let unfiltered = service.search_profiles("", &ProfileFilters::default(), 1, 20).await.unwrap();
        let filtered = service.search_profiles("", &tech(), 1, 20).await.unwrap();
        let narrow = service.search_profiles("", &tech(), 1, 1).await.unwrap();

        assert_eq!(unfiltered.pagination.total, 3);
        assert_eq!(filtered.pagination.total, 2);
        assert_eq!(narrow.results.len(), 1);
        assert_eq!(narrow.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_invalidation_forces_fresh_search() {
        let repo = Arc::new(InstrumentedRepository::new(fixture()));
        let service = service(repo.clone());

        service.search_profiles("google", &tech(), 1, 20).await.unwrap();
        let calls = repo.calls();

        assert!(service.cache.invalidate_pattern(&keys::search_pattern(SearchKind::Alumni)).await);
        service.search_profiles("google", &tech(), 1, 20).await.unwrap();

        assert!(repo.calls() > calls);
    }

    #[tokio::test]
    async fn test_global_search_joins_all_types() {
        let repo = Arc::new(InstrumentedRepository::new(fixture()));
        let service = service(repo.clone());

        let result = service.global_search("python", 1).await.unwrap();
        assert!(result.alumni.is_empty());
        assert_eq!(result.events.len(), 1);
        assert_eq!(result.forum_posts.len(), 1);
        assert_eq!(result.query, "python");

        let calls = repo.calls();
        let again = service.global_search("python", 1).await.unwrap();
        assert_eq!(again, result);
        assert_eq!(repo.calls(), calls);
    }

    #[tokio::test]
    async fn test_global_search_runs_concurrently() {
        let mut instrumented = InstrumentedRepository::new(fixture());
        instrumented.delay = Duration::from_millis(100);
        let service = service(Arc::new(instrumented));

        let started = Instant::now();
        service.global_search("python", 1).await.unwrap();
        let elapsed = started.elapsed();

        // Each sub-search is count + query (200ms), events add a grouped count
        // (300ms); sequential would be 700ms
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(500), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_global_search_fails_atomically() {
        let mut instrumented = InstrumentedRepository::new(fixture());
        instrumented.fail_on = Some(Resource::ForumPosts);
        let service = service(Arc::new(instrumented));

        assert!(service.global_search("python", 1).await.is_err());
        let key = keys::search_results("python", SearchKind::Global, 1);
        assert!(service.cache.get(&key).await.is_none(), "failed search must not be cached");
    }

    #[tokio::test]
    async fn test_event_results_carry_registration_count() {
        let repo = Arc::new(InstrumentedRepository::new(fixture()));
        let service = service(repo);

        let result = service
            .search_events("", &EventFilters::default(), 1, 20)
            .await
            .unwrap();

        let counts: Vec<(&str, u64)> = result
            .results
            .iter()
            .map(|event| (event["id"].as_str().unwrap(), event["registration_count"].as_u64().unwrap()))
            .collect();
        assert_eq!(counts, [("e1", 2), ("e2", 0)]);
    }

    #[tokio::test]
    async fn test_repository_error_propagates() {
        let repo = Arc::new(InstrumentedRepository::new(fixture()));
        repo.failing.store(true, Ordering::SeqCst);
        let service = service(repo);

        let err = service
            .search_events("", &EventFilters::default(), 1, 20)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Repository(_)));
    }

    #[tokio::test]
    async fn test_suggestions_by_scope() {
        let repo = Arc::new(InstrumentedRepository::new(fixture()));
        let service = service(repo.clone());

        let all = service.suggestions("a", SuggestionScope::All).await.unwrap();
        assert!(all.iter().any(|s| s.text == "Navy" && s.kind == "company"));
        assert!(all.iter().any(|s| s.text == "career" && s.kind == "event_type"));

        let events = service.suggestions("net", SuggestionScope::Events).await.unwrap();
        assert_eq!(events, vec![Suggestion { text: "networking".into(), kind: "event_type".into() }]);

        let calls = repo.calls();
        assert!(service.suggestions("  ", SuggestionScope::All).await.unwrap().is_empty());
        assert_eq!(repo.calls(), calls);
    }
}
