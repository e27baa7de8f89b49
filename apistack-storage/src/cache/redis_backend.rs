//! Redis cache backend.

use async_trait::async_trait;
use apistack_core::{CacheError, CacheResult};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use super::traits::ListCache;

/// List cache stored in Redis.
///
/// Holds a [`ConnectionManager`], which multiplexes commands over one
/// connection and reconnects on its own after failures. Every command is
/// bounded by `op_timeout`.
#[derive(Clone)]
pub struct RedisListCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl RedisListCache {
    /// Open a connection to `url` and verify it with a PING.
    pub async fn connect(url: &str, op_timeout: Duration) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Connection {
            reason: e.to_string(),
        })?;

        let conn = match timeout(op_timeout, ConnectionManager::new(client)).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                return Err(CacheError::Connection {
                    reason: e.to_string(),
                })
            }
            Err(_) => return Err(CacheError::Timeout { operation: "connect" }),
        };

        let cache = Self { conn, op_timeout };
        cache.ping().await?;
        Ok(cache)
    }

    async fn run<T, F, Fut>(&self, operation: &'static str, op: F) -> CacheResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        match timeout(self.op_timeout, op(self.conn.clone())).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(map_redis_error(e)),
            Err(_) => Err(CacheError::Timeout { operation }),
        }
    }
}

impl std::fmt::Debug for RedisListCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisListCache")
            .field("op_timeout", &self.op_timeout)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(err: redis::RedisError) -> CacheError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        CacheError::Connection {
            reason: err.to_string(),
        }
    } else if err.is_timeout() {
        CacheError::Timeout { operation: "redis" }
    } else {
        CacheError::Backend {
            reason: err.to_string(),
        }
    }
}

/// Redis `SETEX` takes whole seconds; round sub-second TTLs up so they still
/// expire instead of being rejected.
fn ttl_seconds(ttl: Duration) -> u64 {
    let secs = ttl.as_secs();
    if ttl.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

#[async_trait]
impl ListCache for RedisListCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        let key = key.to_string();
        self.run("get", |mut conn| async move {
            let value: Option<Vec<u8>> = conn.get(key).await?;
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> CacheResult<()> {
        let key = key.to_string();
        let seconds = ttl_seconds(ttl);
        self.run("set", |mut conn| async move {
            if seconds == 0 {
                let _: () = conn.set(key, value).await?;
            } else {
                let _: () = conn.set_ex(key, value, seconds).await?;
            }
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> CacheResult<()> {
        let reply: String = self
            .run("ping", |mut conn| async move {
                redis::cmd("PING").query_async(&mut conn).await
            })
            .await?;
        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Backend {
                reason: format!("unexpected PING reply '{reply}'"),
            })
        }
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
