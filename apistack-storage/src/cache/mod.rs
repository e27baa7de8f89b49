//! Cache-aside layer for actor list queries.
//!
//! Only List is cached. Entries are keyed by the normalized search term plus
//! pagination and order ([`ListCacheKey`]), written with a fixed TTL after a
//! store read, and never invalidated by writes: a cached page may be stale
//! for at most one TTL.
//!
//! Backend failures are never surfaced to callers. [`ActorListCache`] logs
//! them and falls through to the store, reporting what happened as a
//! [`CacheOutcome`].

pub mod key;
pub mod memory_backend;
pub mod read_through;
pub mod redis_backend;
pub mod traits;

pub use key::ListCacheKey;
pub use memory_backend::InMemoryListCache;
pub use read_through::{ActorListCache, CacheConfig, CacheOutcome, CacheWrite, ListRead, DEFAULT_LIST_TTL};
pub use redis_backend::RedisListCache;
pub use traits::{CacheStats, ListCache};
