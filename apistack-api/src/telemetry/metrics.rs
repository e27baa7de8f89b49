//! Prometheus Metrics Definitions
//!
//! `ApiMetrics` owns its registry and is shared through application state.
//! GET /metrics renders that registry in the Prometheus text format.

use std::sync::Arc;

use apistack_storage::{CacheOutcome, CacheWrite};
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

use crate::error::{ApiError, ApiResult};

/// HTTP request latency buckets (seconds)
/// Covers: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s
const HTTP_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0, 10.0,
];

/// Database operation latency buckets (seconds)
const DB_LATENCY_BUCKETS: &[f64] =
    &[0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.5, 5.0];

/// Container for all apistack metrics.
#[derive(Clone)]
pub struct ApiMetrics {
    registry: Registry,

    /// HTTP request counter - labels: method, path, status
    pub http_requests_total: CounterVec,

    /// HTTP request duration histogram - labels: method, path
    pub http_request_duration_seconds: HistogramVec,

    /// Store operation counter - labels: operation, status
    pub db_operations_total: CounterVec,

    /// Store operation duration histogram - labels: operation
    pub db_operation_duration_seconds: HistogramVec,

    /// List cache lookups - labels: result (hit, miss, error, bypass)
    pub cache_lookups_total: CounterVec,

    /// List cache writes - labels: status (ok, error)
    pub cache_writes_total: CounterVec,
}

fn register<C>(registry: &Registry, name: &str, collector: C) -> ApiResult<C>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|e| ApiError::internal_error(format!("Failed to register {}: {}", name, e)))?;
    Ok(collector)
}

fn counter_vec(name: &str, help: &str, labels: &[&str]) -> ApiResult<CounterVec> {
    CounterVec::new(Opts::new(name, help), labels)
        .map_err(|e| ApiError::internal_error(format!("Failed to create {}: {}", name, e)))
}

fn histogram_vec(
    name: &str,
    help: &str,
    labels: &[&str],
    buckets: &[f64],
) -> ApiResult<HistogramVec> {
    HistogramVec::new(HistogramOpts::new(name, help).buckets(buckets.to_vec()), labels)
        .map_err(|e| ApiError::internal_error(format!("Failed to create {}: {}", name, e)))
}

impl ApiMetrics {
    /// Create all metrics in a fresh registry.
    ///
    /// On Linux the process collector (CPU, memory, open fds) is registered
    /// as well.
    pub fn new() -> ApiResult<Self> {
        let registry = Registry::new();

        let http_requests_total = register(
            &registry,
            "apistack_http_requests_total",
            counter_vec(
                "apistack_http_requests_total",
                "Total number of HTTP requests",
                &["method", "path", "status"],
            )?,
        )?;

        let http_request_duration_seconds = register(
            &registry,
            "apistack_http_request_duration_seconds",
            histogram_vec(
                "apistack_http_request_duration_seconds",
                "HTTP request duration in seconds",
                &["method", "path"],
                HTTP_LATENCY_BUCKETS,
            )?,
        )?;

        let db_operations_total = register(
            &registry,
            "apistack_db_operations_total",
            counter_vec(
                "apistack_db_operations_total",
                "Total number of store operations",
                &["operation", "status"],
            )?,
        )?;

        let db_operation_duration_seconds = register(
            &registry,
            "apistack_db_operation_duration_seconds",
            histogram_vec(
                "apistack_db_operation_duration_seconds",
                "Store operation duration in seconds",
                &["operation"],
                DB_LATENCY_BUCKETS,
            )?,
        )?;

        let cache_lookups_total = register(
            &registry,
            "apistack_cache_lookups_total",
            counter_vec(
                "apistack_cache_lookups_total",
                "List cache lookups by result",
                &["result"],
            )?,
        )?;

        let cache_writes_total = register(
            &registry,
            "apistack_cache_writes_total",
            counter_vec(
                "apistack_cache_writes_total",
                "List cache writes by status",
                &["status"],
            )?,
        )?;

        #[cfg(target_os = "linux")]
        registry
            .register(Box::new(
                prometheus::process_collector::ProcessCollector::for_self(),
            ))
            .map_err(|e| {
                ApiError::internal_error(format!("Failed to register process collector: {}", e))
            })?;

        Ok(Self {
            registry,
            http_requests_total,
            http_request_duration_seconds,
            db_operations_total,
            db_operation_duration_seconds,
            cache_lookups_total,
            cache_writes_total,
        })
    }

    /// Record an HTTP request.
    pub fn record_http_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status_str = status.to_string();
        self.http_requests_total
            .with_label_values(&[method, path, &status_str])
            .inc();
        self.http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Record a store operation.
    pub fn record_db_operation(&self, operation: &str, success: bool, duration_secs: f64) {
        let status = if success { "success" } else { "error" };
        self.db_operations_total
            .with_label_values(&[operation, status])
            .inc();
        self.db_operation_duration_seconds
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    /// Record how a list request was served and whether the cache was filled.
    pub fn record_cache(&self, outcome: CacheOutcome, write: Option<CacheWrite>) {
        self.cache_lookups_total
            .with_label_values(&[outcome.as_str()])
            .inc();
        if let Some(write) = write {
            self.cache_writes_total
                .with_label_values(&[write.as_str()])
                .inc();
        }
    }

    /// Encode every registered metric in the Prometheus text format.
    pub fn encode(&self) -> Result<Vec<u8>, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/metrics",
        tag = "Observability",
        responses(
            (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
            (status = 500, description = "Failed to encode metrics"),
        ),
    )
)]
pub async fn metrics_handler(State(metrics): State<Arc<ApiMetrics>>) -> impl IntoResponse {
    match metrics.encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {}", e).into_bytes(),
            )
        }
    }
}
