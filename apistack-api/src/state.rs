//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use apistack_storage::{ActorListCache, ActorStore};

use crate::services::ActorService;
use crate::telemetry::{ApiMetrics, Observability, RequestTracer};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Actor operations over the configured store and list cache.
    pub actors: ActorService,
    /// Metrics registry rendered by GET /metrics.
    pub metrics: Arc<ApiMetrics>,
    /// Opens the per-request server span.
    pub tracer: RequestTracer,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ActorStore>,
        cache: Option<ActorListCache>,
        metrics: Arc<ApiMetrics>,
        tracer: RequestTracer,
    ) -> Self {
        Self {
            actors: ActorService::new(store, cache, metrics.clone()),
            metrics,
            tracer,
            start_time: Instant::now(),
        }
    }

    /// Handles for the observability middleware.
    pub fn observability(&self) -> Observability {
        Observability::new(self.metrics.clone(), self.tracer.clone())
    }
}

crate::impl_from_ref!(ActorService, actors);
crate::impl_from_ref!(Arc<ApiMetrics>, metrics);
crate::impl_from_ref!(Instant, start_time);
