//! Health Check Endpoints
//!
//! - /healthcheck - liveness, plain "OK"
//! - /health/ready - store and list cache connectivity
//!
//! The database decides readiness. A failing cache only degrades the
//! service, since list requests fall back to the store.

use std::time::Instant;

use apistack_storage::{ActorListCache, ActorStore};
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::services::ActorService;
use crate::state::AppState;

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthDetails {
    pub database: ComponentHealth,
    /// Absent when the service runs without a list cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<ComponentHealth>,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentHealth {
    fn from_check(result: Result<u64, String>, backend: Option<&str>) -> Self {
        let backend = backend.map(str::to_string);
        match result {
            Ok(latency) => Self {
                status: HealthStatus::Healthy,
                backend,
                latency_ms: Some(latency),
                error: None,
            },
            Err(e) => Self {
                status: HealthStatus::Unhealthy,
                backend,
                latency_ms: None,
                error: Some(e),
            },
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /healthcheck - Liveness check
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/healthcheck",
        tag = "Health",
        responses(
            (status = 200, description = "Service is responding", body = String),
        ),
    )
)]
pub async fn healthcheck() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /health/ready - Readiness check
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/health/ready",
        tag = "Health",
        responses(
            (status = 200, description = "Service is ready", body = HealthResponse),
            (status = 503, description = "Service is not ready", body = HealthResponse),
        ),
    )
)]
pub async fn readiness(
    State(service): State<ActorService>,
    State(start_time): State<Instant>,
) -> impl IntoResponse {
    let database = ComponentHealth::from_check(check_database(service.store().as_ref()).await, None);

    let cache = match service.cache() {
        Some(cache) => Some(ComponentHealth::from_check(
            check_cache(cache).await,
            Some(cache.backend_name()),
        )),
        None => None,
    };

    let overall_status = overall_status(&database, cache.as_ref());

    let response = HealthResponse {
        status: overall_status,
        details: Some(HealthDetails {
            database,
            cache,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if overall_status == HealthStatus::Unhealthy {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };

    (status_code, Json(response))
}

fn overall_status(database: &ComponentHealth, cache: Option<&ComponentHealth>) -> HealthStatus {
    if database.status != HealthStatus::Healthy {
        HealthStatus::Unhealthy
    } else if cache.is_some_and(|c| c.status != HealthStatus::Healthy) {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}

async fn check_database(store: &dyn ActorStore) -> Result<u64, String> {
    let start = Instant::now();
    match store.health_check().await {
        Ok(()) => Ok(start.elapsed().as_millis() as u64),
        Err(e) => {
            tracing::warn!(error = %e, "Database readiness check failed");
            Err("Database check failed".to_string())
        }
    }
}

async fn check_cache(cache: &ActorListCache) -> Result<u64, String> {
    let start = Instant::now();
    match cache.ping().await {
        Ok(()) => Ok(start.elapsed().as_millis() as u64),
        Err(e) => Err(format!("Cache check failed: {}", e)),
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check routes.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/healthcheck", get(healthcheck))
        .route("/health/ready", get(readiness))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(status: HealthStatus) -> ComponentHealth {
        ComponentHealth {
            status,
            backend: None,
            latency_ms: None,
            error: None,
        }
    }

    #[test]
    fn test_health_response_serialization() -> Result<(), serde_json::Error> {
        let response = HealthResponse {
            status: HealthStatus::Degraded,
            details: None,
        };
        let json = serde_json::to_value(&response)?;
        assert_eq!(json, serde_json::json!({ "status": "degraded" }));
        Ok(())
    }

    #[test]
    fn test_overall_status() {
        let healthy = component(HealthStatus::Healthy);
        let unhealthy = component(HealthStatus::Unhealthy);

        assert_eq!(overall_status(&healthy, None), HealthStatus::Healthy);
        assert_eq!(overall_status(&healthy, Some(&healthy)), HealthStatus::Healthy);
        assert_eq!(overall_status(&healthy, Some(&unhealthy)), HealthStatus::Degraded);
        assert_eq!(overall_status(&unhealthy, Some(&healthy)), HealthStatus::Unhealthy);
    }
}
