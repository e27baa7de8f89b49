//! OpenTelemetry Tracer Initialization
//!
//! Sets up the tracing subscriber (env filter, JSON logs) bridged to an
//! OpenTelemetry tracer provider, optionally exporting over OTLP/HTTP.
//! Nothing is installed as an OpenTelemetry global: the request tracer is
//! handed out by [`TelemetryGuard::request_tracer`] and injected into state.

use axum::http::HeaderMap;
use opentelemetry::{propagation::TextMapPropagator, trace::TracerProvider as _, Context, KeyValue};
use opentelemetry_http::HeaderExtractor;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    trace::{RandomIdGenerator, Sampler, SdkTracer, SdkTracerProvider},
    Resource,
};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::constants::{DEFAULT_LOG_FILTER, TRACER_NAME};
use crate::error::{ApiError, ApiResult};

/// Telemetry configuration from environment variables.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// OTLP/HTTP endpoint for traces (e.g., "http://localhost:4318/v1/traces")
    pub otlp_endpoint: Option<String>,
    /// Service name for traces
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (production, staging, development)
    pub environment: String,
    /// Trace sampling ratio (0.0 to 1.0)
    pub trace_sample_rate: f64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: "apistack-api".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
            trace_sample_rate: 1.0,
        }
    }
}

impl TelemetryConfig {
    /// Load from `APISTACK_OTLP_ENDPOINT`, `APISTACK_SERVICE_NAME`,
    /// `APISTACK_SERVICE_VERSION`, `APISTACK_ENVIRONMENT` and
    /// `APISTACK_TRACE_SAMPLE_RATE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            otlp_endpoint: lookup("APISTACK_OTLP_ENDPOINT").filter(|s| !s.trim().is_empty()),
            service_name: lookup("APISTACK_SERVICE_NAME").unwrap_or(defaults.service_name),
            service_version: lookup("APISTACK_SERVICE_VERSION").unwrap_or(defaults.service_version),
            environment: lookup("APISTACK_ENVIRONMENT").unwrap_or(defaults.environment),
            trace_sample_rate: lookup("APISTACK_TRACE_SAMPLE_RATE")
                .and_then(|s| s.trim().parse().ok())
                .filter(|rate: &f64| rate.is_finite())
                .unwrap_or(defaults.trace_sample_rate),
        }
    }

    fn sampler(&self) -> Sampler {
        if self.trace_sample_rate >= 1.0 {
            Sampler::AlwaysOn
        } else if self.trace_sample_rate <= 0.0 {
            Sampler::AlwaysOff
        } else {
            Sampler::TraceIdRatioBased(self.trace_sample_rate)
        }
    }
}

/// Tracer and W3C propagator used to open one server span per request.
#[derive(Debug, Clone)]
pub struct RequestTracer {
    tracer: SdkTracer,
    propagator: TraceContextPropagator,
}

impl RequestTracer {
    pub fn new(provider: &SdkTracerProvider) -> Self {
        Self {
            tracer: provider.tracer(TRACER_NAME),
            propagator: TraceContextPropagator::new(),
        }
    }

    /// Tracer over a provider with no exporter. Spans get ids and
    /// propagate, nothing leaves the process.
    pub fn unexported() -> Self {
        Self::new(&SdkTracerProvider::builder().build())
    }

    pub fn tracer(&self) -> &SdkTracer {
        &self.tracer
    }

    /// Extract the inbound trace context (`traceparent`) from headers.
    pub fn extract(&self, headers: &HeaderMap) -> Context {
        self.propagator.extract(&HeaderExtractor(headers))
    }
}

/// Keeps the tracer provider alive; `shutdown` flushes pending spans.
#[derive(Debug)]
pub struct TelemetryGuard {
    provider: SdkTracerProvider,
}

impl TelemetryGuard {
    /// Request tracer backed by this provider.
    pub fn request_tracer(&self) -> RequestTracer {
        RequestTracer::new(&self.provider)
    }

    /// Flush and stop the tracer provider. Call before process exit.
    pub fn shutdown(self) {
        if let Err(e) = self.provider.shutdown() {
            tracing::warn!(error = %e, "Tracer shutdown failed");
        } else {
            tracing::info!("Tracer shutdown complete");
        }
    }
}

/// Initialize the OpenTelemetry tracer and tracing subscriber.
///
/// Called once at startup before any tracing occurs. Sets up:
/// - OTLP exporter for distributed traces (if an endpoint is configured)
/// - tracing-subscriber with env filter, JSON output and the OpenTelemetry layer
///
/// The returned guard owns the provider; pass
/// [`TelemetryGuard::request_tracer`] to application state.
pub fn init_telemetry(config: &TelemetryConfig) -> ApiResult<TelemetryGuard> {
    let resource = Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes([
            KeyValue::new("service.version", config.service_version.clone()),
            KeyValue::new("deployment.environment", config.environment.clone()),
        ])
        .build();

    let builder = SdkTracerProvider::builder()
        .with_sampler(config.sampler())
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource);

    let provider = match &config.otlp_endpoint {
        Some(endpoint) => {
            let exporter = SpanExporter::builder()
                .with_http()
                .with_endpoint(endpoint)
                .build()
                .map_err(|e| {
                    ApiError::internal_error(format!("Failed to create OTLP exporter: {}", e))
                })?;
            builder.with_batch_exporter(exporter).build()
        }
        // Spans still get ids and propagate; nothing is exported.
        None => builder.build(),
    };

    let tracer = provider.tracer(TRACER_NAME);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .with(OpenTelemetryLayer::new(tracer))
        .try_init()
        .map_err(|e| ApiError::internal_error(format!("Failed to init subscriber: {}", e)))?;

    tracing::info!(
        service_name = config.service_name,
        environment = config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { provider })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_telemetry_config_defaults() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config.service_name, "apistack-api");
        assert_eq!(config.environment, "development");
        assert_eq!(config.trace_sample_rate, 1.0);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_telemetry_config_from_vars() {
        let config = TelemetryConfig::from_lookup(lookup_from(&[
            ("APISTACK_OTLP_ENDPOINT", "http://collector:4318/v1/traces"),
            ("APISTACK_ENVIRONMENT", "staging"),
            ("APISTACK_TRACE_SAMPLE_RATE", "0.25"),
        ]));
        assert_eq!(
            config.otlp_endpoint.as_deref(),
            Some("http://collector:4318/v1/traces")
        );
        assert_eq!(config.environment, "staging");
        assert_eq!(config.trace_sample_rate, 0.25);

        let config =
            TelemetryConfig::from_lookup(lookup_from(&[("APISTACK_TRACE_SAMPLE_RATE", "NaN")]));
        assert_eq!(config.trace_sample_rate, 1.0);
    }

    #[test]
    fn test_request_tracer_extracts_traceparent() -> Result<(), Box<dyn std::error::Error>> {
        use opentelemetry::trace::TraceContextExt;

        let tracer = RequestTracer::unexported();
        let mut headers = HeaderMap::new();
        headers.insert(
            "traceparent",
            "00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01".parse()?,
        );

        let cx = tracer.extract(&headers);
        let span_context = cx.span().span_context().clone();
        assert!(span_context.is_remote());
        assert_eq!(
            span_context.trace_id().to_string(),
            "4bf92f3577b34da6a3ce929d0e0e4736"
        );

        let empty = tracer.extract(&HeaderMap::new());
        assert!(!empty.span().span_context().is_valid());
        Ok(())
    }

    #[test]
    fn test_sampler_selection() {
        let with_rate = |trace_sample_rate| TelemetryConfig {
            trace_sample_rate,
            ..Default::default()
        };
        assert!(matches!(with_rate(1.0).sampler(), Sampler::AlwaysOn));
        assert!(matches!(with_rate(0.0).sampler(), Sampler::AlwaysOff));
        assert!(matches!(
            with_rate(0.5).sampler(),
            Sampler::TraceIdRatioBased(r) if r == 0.5
        ));
    }
}
