//! OpenAPI Specification for the apistack API
//!
//! Generated with utoipa from the route annotations and the request and
//! response types. Served at GET /openapi.json.

use utoipa::OpenApi;

use apistack_core::{Actor, ActorId};

use crate::error::{ApiError, ErrorCode};
use crate::routes::{actor, health};
use crate::telemetry::metrics;
use crate::types::{
    ActorRequest, CreateActorResponse, DeleteActorResponse, ListActorsResponse,
    UpdateActorResponse,
};

/// OpenAPI document for the apistack API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "apistack API",
        description = "CRUD service for actor records backed by PostgreSQL, with a cache-aside list cache.",
        license(name = "MIT OR Apache-2.0")
    ),
    paths(
        actor::list_actors,
        actor::create_actor,
        actor::get_actor,
        actor::update_actor,
        actor::delete_actor,
        health::healthcheck,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        Actor,
        ActorId,
        ActorRequest,
        CreateActorResponse,
        UpdateActorResponse,
        DeleteActorResponse,
        ListActorsResponse,
        ApiError,
        ErrorCode,
        health::HealthResponse,
        health::HealthStatus,
        health::HealthDetails,
        health::ComponentHealth,
    )),
    tags(
        (name = "Actors", description = "Actor records"),
        (name = "Health", description = "Liveness and readiness"),
        (name = "Observability", description = "Prometheus metrics"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_actor_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        for expected in ["/v1/actors", "/v1/actors/{id}", "/healthcheck", "/metrics"] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing {}",
                expected
            );
        }
    }

    #[test]
    fn test_openapi_serializes() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(ApiDoc::openapi())?;
        assert_eq!(json["info"]["title"], "apistack API");
        Ok(())
    }

    #[test]
    fn test_actor_timestamp_is_a_date_time_string() -> Result<(), serde_json::Error> {
        let json = serde_json::to_value(ApiDoc::openapi())?;
        let last_update = &json["components"]["schemas"]["Actor"]["properties"]["LastUpdate"];
        assert_eq!(last_update["type"], "string");
        assert_eq!(last_update["format"], "date-time");
        Ok(())
    }
}
