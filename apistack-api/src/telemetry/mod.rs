//! apistack Telemetry - Observability Infrastructure
//!
//! Provides OpenTelemetry tracing and Prometheus metrics for the API layer.
//! Everything works without a collector; the OTLP exporter is only attached
//! when an endpoint is configured.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, ApiMetrics};
pub use middleware::{observability_middleware, Observability};
pub use tracer::{init_telemetry, RequestTracer, TelemetryConfig, TelemetryGuard};
