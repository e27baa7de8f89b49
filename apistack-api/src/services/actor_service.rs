//! Actor Service
//!
//! Validates requests, routes lists through the cache and records store
//! metrics. Validation always completes before the store is called.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use apistack_core::{Actor, ActorId, StoreResult};
use apistack_storage::{ActorListCache, ActorStore, CacheOutcome, ListRead};

use crate::constants::ACTOR_DELETED_MESSAGE;
use crate::error::ApiResult;
use crate::telemetry::ApiMetrics;
use crate::types::{
    ActorRequest, CreateActorResponse, DeleteActorResponse, ListActorsParams, ListActorsResponse,
    UpdateActorResponse,
};

/// Domain outcomes (not found, conflicts) are successful store operations;
/// only infrastructure failures count as errors.
fn store_succeeded<T>(result: &StoreResult<T>) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => e.operation().is_none(),
    }
}

/// Actor operations shared by the HTTP handlers.
#[derive(Clone)]
pub struct ActorService {
    store: Arc<dyn ActorStore>,
    cache: Option<ActorListCache>,
    metrics: Arc<ApiMetrics>,
}

impl ActorService {
    pub fn new(
        store: Arc<dyn ActorStore>,
        cache: Option<ActorListCache>,
        metrics: Arc<ApiMetrics>,
    ) -> Self {
        Self {
            store,
            cache,
            metrics,
        }
    }

    pub fn store(&self) -> &Arc<dyn ActorStore> {
        &self.store
    }

    pub fn cache(&self) -> Option<&ActorListCache> {
        self.cache.as_ref()
    }

    /// Time a store call and count it by outcome.
    async fn observe<T, F>(&self, operation: &'static str, call: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let start = Instant::now();
        let result = call.await;
        self.metrics.record_db_operation(
            operation,
            store_succeeded(&result),
            start.elapsed().as_secs_f64(),
        );
        result
    }

    /// Create an actor from a validated name pair.
    pub async fn create_actor(&self, req: &ActorRequest) -> ApiResult<CreateActorResponse> {
        let names = req.validate()?;
        let id = self
            .observe("create", self.store.create(&names))
            .await?;

        tracing::info!(actor_id = id.get(), "Actor created");
        Ok(CreateActorResponse { id })
    }

    /// Get one actor by id.
    pub async fn get_actor(&self, id: ActorId) -> ApiResult<Actor> {
        Ok(self.observe("get", self.store.get(id)).await?)
    }

    /// List actors, through the list cache when one is configured.
    pub async fn list_actors(&self, params: ListActorsParams) -> ApiResult<ListActorsResponse> {
        let query = params.into_query()?;

        let read = match &self.cache {
            Some(cache) => {
                let start = Instant::now();
                let result = cache.list(self.store.as_ref(), &query).await;
                // A hit never reached the store.
                let hit = matches!(&result, Ok(read) if read.outcome == CacheOutcome::Hit);
                if !hit {
                    self.metrics.record_db_operation(
                        "list",
                        store_succeeded(&result),
                        start.elapsed().as_secs_f64(),
                    );
                }
                result?
            }
            None => ListRead::bypass(self.observe("list", self.store.list(&query)).await?),
        };

        self.metrics.record_cache(read.outcome, read.write);
        Ok(ListActorsResponse {
            actors: read.actors,
        })
    }

    /// Replace an actor's names.
    pub async fn update_actor(
        &self,
        id: ActorId,
        req: &ActorRequest,
    ) -> ApiResult<UpdateActorResponse> {
        let names = req.validate()?;
        let actor = self
            .observe("update", self.store.update(id, &names))
            .await?;

        tracing::info!(actor_id = actor.id.get(), "Actor updated");
        Ok(UpdateActorResponse { id: actor.id })
    }

    /// Delete an actor.
    pub async fn delete_actor(&self, id: ActorId) -> ApiResult<DeleteActorResponse> {
        self.observe("delete", self.store.delete(id)).await?;

        tracing::info!(actor_id = id.get(), "Actor deleted");
        Ok(DeleteActorResponse {
            message: ACTOR_DELETED_MESSAGE.to_string(),
        })
    }
}
