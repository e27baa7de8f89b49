#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use apistack_api::telemetry::RequestTracer;
use apistack_api::{create_api_router, ApiConfig, ApiMetrics, AppState};
use apistack_storage::{
    ActorListCache, ActorStore, CacheConfig, InMemoryActorStore, InMemoryListCache,
};
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use tower::ServiceExt;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Router over an in-memory store, with handles on the store and metrics.
pub struct TestApp {
    pub store: InMemoryActorStore,
    pub metrics: Arc<ApiMetrics>,
    router: Router,
}

impl TestApp {
    /// App without a list cache.
    pub fn new() -> TestResult<Self> {
        Self::build(InMemoryActorStore::new(), None)
    }

    /// App with an in-memory list cache using `ttl`.
    pub fn with_cache(ttl: Duration) -> TestResult<Self> {
        let cache = ActorListCache::new(
            Arc::new(InMemoryListCache::new()),
            CacheConfig::new().with_ttl(ttl),
        );
        Self::build(InMemoryActorStore::new(), Some(cache))
    }

    pub fn build(store: InMemoryActorStore, cache: Option<ActorListCache>) -> TestResult<Self> {
        let backing: Arc<dyn ActorStore> = Arc::new(store.clone());
        Self::assemble(store, backing, cache, &ApiConfig::default())
    }

    /// App whose handlers call `backing`, which usually wraps `store`.
    pub fn assemble(
        store: InMemoryActorStore,
        backing: Arc<dyn ActorStore>,
        cache: Option<ActorListCache>,
        config: &ApiConfig,
    ) -> TestResult<Self> {
        let metrics = Arc::new(ApiMetrics::new()?);
        let state = AppState::new(
            backing,
            cache,
            metrics.clone(),
            RequestTracer::unexported(),
        );
        let router = create_api_router(state, config);
        Ok(Self {
            store,
            metrics,
            router,
        })
    }

    /// Send a request and return the status and raw body.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        body: Option<String>,
    ) -> TestResult<(StatusCode, Vec<u8>)> {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json)
            }
            None => Body::empty(),
        };

        let response = self.router.clone().oneshot(builder.body(body)?).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        Ok((status, bytes.to_vec()))
    }

    /// Send a request and decode the JSON response body.
    pub async fn json(
        &self,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> TestResult<(StatusCode, serde_json::Value)> {
        let body = body.map(|v| v.to_string());
        let (status, bytes) = self.send(method, uri, body).await?;
        Ok((status, serde_json::from_slice(&bytes)?))
    }

    pub async fn get(&self, uri: &str) -> TestResult<(StatusCode, serde_json::Value)> {
        self.json(Method::GET, uri, None).await
    }

    pub async fn create(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> TestResult<(StatusCode, serde_json::Value)> {
        self.json(
            Method::POST,
            "/v1/actors",
            Some(serde_json::json!({ "FirstName": first_name, "LastName": last_name })),
        )
        .await
    }

    pub async fn update(
        &self,
        id: i64,
        first_name: &str,
        last_name: &str,
    ) -> TestResult<(StatusCode, serde_json::Value)> {
        self.json(
            Method::PUT,
            &format!("/v1/actors/{}", id),
            Some(serde_json::json!({ "FirstName": first_name, "LastName": last_name })),
        )
        .await
    }

    pub async fn delete(&self, id: i64) -> TestResult<(StatusCode, serde_json::Value)> {
        self.json(Method::DELETE, &format!("/v1/actors/{}", id), None)
            .await
    }
}

/// Ids in a list response, in response order.
pub fn listed_ids(body: &serde_json::Value) -> Vec<i64> {
    body["actors"]
        .as_array()
        .map(|actors| actors.iter().filter_map(|a| a["ID"].as_i64()).collect())
        .unwrap_or_default()
}
