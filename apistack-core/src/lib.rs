//! apistack Core - Entity Types
//!
//! Pure data structures shared by the storage and API crates: the `Actor`
//! record, its identifier, list query parameters and the domain error types.
//! This crate performs no I/O.

mod actor;
mod error;
mod query;

pub use actor::{Actor, ActorId, ActorNames, ParseActorIdError, Timestamp};
pub use error::{CacheError, CacheResult, StoreError, StoreResult};
pub use query::ListQuery;
