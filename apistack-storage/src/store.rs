//! Async store trait for actor persistence.

use async_trait::async_trait;
use apistack_core::{Actor, ActorId, ActorNames, ListQuery, StoreResult};

/// Persistence contract for actor records.
///
/// Implementations own the records. Every mutating operation runs its
/// existence/uniqueness check and its write atomically with respect to
/// concurrent writers, and leaves no partial state behind on error.
#[async_trait]
pub trait ActorStore: Send + Sync {
    /// List actors matching `query`.
    ///
    /// A non-empty search matches first OR last name, case-insensitively, as
    /// a substring. Results are ordered by id (descending when requested).
    /// No match is an empty list, not an error.
    async fn list(&self, query: &ListQuery) -> StoreResult<Vec<Actor>>;

    /// Get one actor, failing with `NotFound` when the id does not exist.
    async fn get(&self, id: ActorId) -> StoreResult<Actor>;

    /// Create an actor and return its assigned id.
    ///
    /// Fails with `AlreadyExists` when an actor with the same first AND last
    /// name exists.
    async fn create(&self, names: &ActorNames) -> StoreResult<ActorId>;

    /// Replace an actor's names and refresh `last_update`.
    ///
    /// Fails with `NotFound` for a missing id, `NoChanges` when the names are
    /// already the record's names, and `AlreadyExists` when another actor
    /// holds the pair.
    async fn update(&self, id: ActorId, names: &ActorNames) -> StoreResult<Actor>;

    /// Hard-delete an actor, failing with `NotFound` for a missing id.
    async fn delete(&self, id: ActorId) -> StoreResult<()>;

    /// Connectivity probe for readiness checks.
    async fn health_check(&self) -> StoreResult<()>;
}
