//! Actor REST API Routes
//!
//! CRUD endpoints for actors. Path ids are parsed by [`ActorIdPath`]; body
//! and query rejections are converted to the API error format.

use apistack_core::Actor;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::get,
    Json, Router,
};

use crate::error::ApiResult;
use crate::extractors::ActorIdPath;
use crate::services::ActorService;
use crate::state::AppState;
use crate::types::{
    ActorRequest, CreateActorResponse, DeleteActorResponse, ListActorsParams, ListActorsResponse,
    UpdateActorResponse,
};

#[cfg(feature = "openapi")]
use crate::error::ApiError;

// ============================================================================
// ROUTE HANDLERS
// ============================================================================

/// GET /v1/actors - List actors
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/v1/actors",
        tag = "Actors",
        params(ListActorsParams),
        responses(
            (status = 200, description = "Matching actors (possibly none)", body = ListActorsResponse),
            (status = 400, description = "Invalid query parameters", body = ApiError),
            (status = 500, description = "Store failure", body = ApiError),
        ),
    )
)]
pub async fn list_actors(
    State(service): State<ActorService>,
    params: Result<Query<ListActorsParams>, QueryRejection>,
) -> ApiResult<Json<ListActorsResponse>> {
    let Query(params) = params?;
    let response = service.list_actors(params).await?;
    Ok(Json(response))
}

/// POST /v1/actors - Create an actor
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        post,
        path = "/v1/actors",
        tag = "Actors",
        request_body = ActorRequest,
        responses(
            (status = 200, description = "Actor created", body = CreateActorResponse),
            (status = 400, description = "Invalid request", body = ApiError),
            (status = 409, description = "An actor with these names already exists", body = ApiError),
        ),
    )
)]
pub async fn create_actor(
    State(service): State<ActorService>,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> ApiResult<Json<CreateActorResponse>> {
    let Json(req) = payload?;
    let response = service.create_actor(&req).await?;
    Ok(Json(response))
}

/// GET /v1/actors/{id} - Get an actor by id
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/v1/actors/{id}",
        tag = "Actors",
        params(
            ("id" = i64, Path, description = "Actor id")
        ),
        responses(
            (status = 200, description = "Actor details", body = Actor),
            (status = 400, description = "Invalid id", body = ApiError),
            (status = 404, description = "Actor not found", body = ApiError),
        ),
    )
)]
pub async fn get_actor(
    State(service): State<ActorService>,
    ActorIdPath(id): ActorIdPath,
) -> ApiResult<Json<Actor>> {
    let actor = service.get_actor(id).await?;
    Ok(Json(actor))
}

/// PUT /v1/actors/{id} - Replace an actor's names
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        put,
        path = "/v1/actors/{id}",
        tag = "Actors",
        params(
            ("id" = i64, Path, description = "Actor id")
        ),
        request_body = ActorRequest,
        responses(
            (status = 200, description = "Actor updated", body = UpdateActorResponse),
            (status = 400, description = "Invalid request", body = ApiError),
            (status = 404, description = "Actor not found", body = ApiError),
            (status = 409, description = "Names unchanged or held by another actor", body = ApiError),
        ),
    )
)]
pub async fn update_actor(
    State(service): State<ActorService>,
    ActorIdPath(id): ActorIdPath,
    payload: Result<Json<ActorRequest>, JsonRejection>,
) -> ApiResult<Json<UpdateActorResponse>> {
    let Json(req) = payload?;
    let response = service.update_actor(id, &req).await?;
    Ok(Json(response))
}

/// DELETE /v1/actors/{id} - Delete an actor
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        delete,
        path = "/v1/actors/{id}",
        tag = "Actors",
        params(
            ("id" = i64, Path, description = "Actor id")
        ),
        responses(
            (status = 200, description = "Actor deleted", body = DeleteActorResponse),
            (status = 400, description = "Invalid id", body = ApiError),
            (status = 404, description = "Actor not found", body = ApiError),
        ),
    )
)]
pub async fn delete_actor(
    State(service): State<ActorService>,
    ActorIdPath(id): ActorIdPath,
) -> ApiResult<Json<DeleteActorResponse>> {
    let response = service.delete_actor(id).await?;
    Ok(Json(response))
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create the actor routes.
///
/// `/v1/actor/:id` is served as an alias of `/v1/actors/:id`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/v1/actors", get(list_actors).post(create_actor))
        .route(
            "/v1/actors/:id",
            get(get_actor).put(update_actor).delete(delete_actor),
        )
        .route(
            "/v1/actor/:id",
            get(get_actor).put(update_actor).delete(delete_actor),
        )
}
