//! Cache-aside coordinator for list queries.

use apistack_core::{Actor, CacheError, ListQuery, StoreResult};
use std::sync::Arc;
use std::time::Duration;

use super::key::ListCacheKey;
use super::traits::ListCache;
use crate::store::ActorStore;

/// Default list cache TTL (3 minutes).
pub const DEFAULT_LIST_TTL: Duration = Duration::from_secs(180);

/// Configuration for the list cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL applied to every list entry.
    pub ttl: Duration,
    /// Upper bound for a single backend command.
    pub op_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_LIST_TTL,
            op_timeout: Duration::from_millis(250),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_op_timeout(mut self, op_timeout: Duration) -> Self {
        self.op_timeout = op_timeout;
        self
    }
}

/// How a list read was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Served from the cache; the store was not called.
    Hit,
    /// Not cached; served from the store.
    Miss,
    /// The cache failed or held an undecodable entry; served from the store.
    Error,
    /// No cache configured; served from the store.
    Bypass,
}

impl CacheOutcome {
    /// Label used in metrics and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Error => "error",
            Self::Bypass => "bypass",
        }
    }
}

/// Result of writing a store read back to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheWrite {
    Stored,
    Failed,
}

impl CacheWrite {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stored => "ok",
            Self::Failed => "error",
        }
    }
}

/// A page of actors plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRead {
    pub actors: Vec<Actor>,
    pub outcome: CacheOutcome,
    /// Write-back result; `None` on a hit or when no cache is configured.
    pub write: Option<CacheWrite>,
}

impl ListRead {
    /// A read served directly by the store with no cache involved.
    pub fn bypass(actors: Vec<Actor>) -> Self {
        Self {
            actors,
            outcome: CacheOutcome::Bypass,
            write: None,
        }
    }
}

/// Cache-aside wrapper around [`ActorStore::list`].
///
/// A hit short-circuits the store. A miss, a backend error or an
/// undecodable entry falls through to the store, and the store's result is
/// written back with the configured TTL before returning. Cache failures
/// are logged at `warn` and never fail the read; store failures propagate
/// unchanged and are not cached.
#[derive(Clone)]
pub struct ActorListCache {
    backend: Arc<dyn ListCache>,
    config: CacheConfig,
}

impl ActorListCache {
    pub fn new(backend: Arc<dyn ListCache>, config: CacheConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Probe the backend.
    pub async fn ping(&self) -> Result<(), CacheError> {
        self.backend.ping().await
    }

    /// List actors, consulting the cache first.
    pub async fn list(&self, store: &dyn ActorStore, query: &ListQuery) -> StoreResult<ListRead> {
        let key = ListCacheKey::from_query(query);

        let outcome = match self.lookup(&key).await {
            Ok(Some(actors)) => {
                tracing::debug!(key = %key, count = actors.len(), "List cache hit");
                return Ok(ListRead {
                    actors,
                    outcome: CacheOutcome::Hit,
                    write: None,
                });
            }
            Ok(None) => CacheOutcome::Miss,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    backend = self.backend.backend_name(),
                    error = %e,
                    "List cache read failed, falling back to store"
                );
                CacheOutcome::Error
            }
        };

        let actors = store.list(query).await?;
        let write = self.store_page(&key, &actors).await;

        Ok(ListRead {
            actors,
            outcome,
            write: Some(write),
        })
    }

    async fn lookup(&self, key: &ListCacheKey) -> Result<Option<Vec<Actor>>, CacheError> {
        let Some(bytes) = self.backend.get(key.as_str()).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })
    }

    async fn store_page(&self, key: &ListCacheKey, actors: &[Actor]) -> CacheWrite {
        let bytes = match serde_json::to_vec(actors) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Failed to encode list for cache");
                return CacheWrite::Failed;
            }
        };

        match self.backend.set(key.as_str(), bytes, self.config.ttl).await {
            Ok(()) => CacheWrite::Stored,
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    backend = self.backend.backend_name(),
                    error = %e,
                    "List cache write failed"
                );
                CacheWrite::Failed
            }
        }
    }
}

impl std::fmt::Debug for ActorListCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorListCache")
            .field("backend", &self.backend.backend_name())
            .field("config", &self.config)
            .finish()
    }
}
