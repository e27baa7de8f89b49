//! apistack Storage - Store Trait, In-Memory Store and List Cache
//!
//! Defines the persistence contract for actors (`ActorStore`) and the
//! cache-aside layer used for list queries. The PostgreSQL store lives in
//! apistack-api next to its connection pool.

pub mod cache;
mod memory;
mod store;

pub use cache::{
    ActorListCache, CacheConfig, CacheOutcome, CacheStats, CacheWrite, InMemoryListCache,
    ListCache, ListCacheKey, ListRead, RedisListCache, DEFAULT_LIST_TTL,
};
pub use memory::InMemoryActorStore;
pub use store::ActorStore;
