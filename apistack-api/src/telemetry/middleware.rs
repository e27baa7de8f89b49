//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Provides automatic instrumentation of all routed HTTP requests with:
//! - a server span continuing any inbound `traceparent`
//! - Prometheus request count and latency
//! - a completion log line
//!
//! Installed with `route_layer`, so the matched route template is available
//! and used as the path label.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use opentelemetry::{
    context::FutureExt as _,
    trace::{SpanKind, Status, TraceContextExt, Tracer},
    KeyValue,
};
use tracing::{info_span, Instrument};

use super::metrics::ApiMetrics;
use super::tracer::RequestTracer;

/// Path label for requests that carry no matched route.
const UNMATCHED_PATH: &str = "unmatched";

/// Handles the middleware records into.
#[derive(Clone)]
pub struct Observability {
    pub metrics: Arc<ApiMetrics>,
    pub tracer: RequestTracer,
}

impl Observability {
    pub fn new(metrics: Arc<ApiMetrics>, tracer: RequestTracer) -> Self {
        Self { metrics, tracer }
    }
}

/// Route template for labels, e.g. `/v1/actors/:id`.
fn route_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string())
}

/// Observability middleware for Axum.
pub async fn observability_middleware(
    State(observability): State<Observability>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let route = route_label(&request);

    let parent_context = observability.tracer.extract(request.headers());

    let tracer = observability.tracer.tracer();
    let span = tracer
        .span_builder(format!("{} {}", method, route))
        .with_kind(SpanKind::Server)
        .with_attributes(vec![
            KeyValue::new("http.request.method", method.to_string()),
            KeyValue::new("url.path", path.clone()),
            KeyValue::new("http.route", route.clone()),
        ])
        .start_with_context(tracer, &parent_context);
    let cx = parent_context.with_span(span);

    let tracing_span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        http.route = %route,
        otel.kind = "server",
    );

    let response = next
        .run(request)
        .instrument(tracing_span)
        .with_context(cx.clone())
        .await;

    let duration = start.elapsed();
    let status = response.status();

    observability.metrics.record_http_request(
        method.as_str(),
        &route,
        status.as_u16(),
        duration.as_secs_f64(),
    );

    let span = cx.span();
    span.set_attribute(KeyValue::new(
        "http.response.status_code",
        i64::from(status.as_u16()),
    ));
    if status.is_server_error() {
        span.set_status(Status::error("Server error"));
    } else {
        span.set_status(Status::Ok);
    }
    span.end();

    tracing::info!(
        method = %method,
        path = %path,
        status = status.as_u16(),
        duration_ms = duration.as_millis() as u64,
        "Request completed"
    );

    response
}
