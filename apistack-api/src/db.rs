//! Database Connection Pool Module
//!
//! PostgreSQL connection pooling using deadpool-postgres, and the
//! PostgreSQL implementation of [`ActorStore`].
//!
//! Every statement is parameterized. Mutations run inside a transaction
//! value; dropping it without `commit` rolls back, so any early return
//! leaves the table untouched.

use std::time::Duration;

use async_trait::async_trait;
use apistack_core::{Actor, ActorId, ActorNames, ListQuery, StoreError, StoreResult};
use apistack_storage::ActorStore;
use deadpool_postgres::{
    Config, ManagerConfig, Pool, PoolConfig, PoolError, RecyclingMethod, Runtime, Timeouts,
};
use tokio_postgres::error::SqlState;
use tokio_postgres::{NoTls, Row};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Wait/create/recycle timeout for pooled connections
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "apistack".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 10,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("APISTACK_DB_HOST").unwrap_or(defaults.host),
            port: std::env::var("APISTACK_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            dbname: std::env::var("APISTACK_DB_NAME").unwrap_or(defaults.dbname),
            user: std::env::var("APISTACK_DB_USER").unwrap_or(defaults.user),
            password: std::env::var("APISTACK_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("APISTACK_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.max_size),
            timeout: std::env::var("APISTACK_DB_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened here; the first checkout connects.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_config = PoolConfig::new(self.max_size);
        pool_config.timeouts = Timeouts {
            wait: Some(self.timeout),
            create: Some(self.timeout),
            recycle: Some(self.timeout),
        };
        cfg.pool = Some(pool_config);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// SQL
// ============================================================================

const SELECT_COLUMNS: &str =
    "actor_id::BIGINT, first_name, last_name, last_update::TIMESTAMPTZ";

const LOCK_WRITERS: &str = "LOCK TABLE public.actor IN SHARE ROW EXCLUSIVE MODE";

const PAIR_EXISTS: &str = "SELECT EXISTS (\
     SELECT 1 FROM public.actor \
     WHERE first_name = $1 AND last_name = $2 AND ($3::BIGINT IS NULL OR actor_id <> $3::BIGINT))";

/// Escape `%`, `_` and `\` so a search term matches literally under ILIKE
/// (backslash is the default LIKE escape character).
fn ilike_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn list_sql(order_descending: bool) -> String {
    format!(
        "SELECT {SELECT_COLUMNS} FROM public.actor \
         WHERE $1::TEXT IS NULL OR first_name ILIKE $1 OR last_name ILIKE $1 \
         ORDER BY actor_id {} \
         OFFSET $2 LIMIT $3",
        if order_descending { "DESC" } else { "ASC" }
    )
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn pg_error(operation: &'static str) -> impl FnOnce(tokio_postgres::Error) -> StoreError {
    move |err| {
        tracing::error!(operation, error = ?err, "Database error");
        StoreError::internal(operation, err.to_string())
    }
}

fn pool_error(operation: &'static str) -> impl FnOnce(PoolError) -> StoreError {
    move |err| {
        tracing::error!(operation, error = ?err, "Connection pool error");
        match err {
            PoolError::Timeout(_) => StoreError::PoolExhausted { operation },
            PoolError::Closed => StoreError::Unavailable {
                operation,
                reason: "connection pool is closed".to_string(),
            },
            PoolError::Backend(e) => StoreError::Unavailable {
                operation,
                reason: e.to_string(),
            },
            other => StoreError::internal(operation, other.to_string()),
        }
    }
}

/// Map a write failure, treating a unique violation as a duplicate pair in
/// case the table carries a uniqueness constraint of its own.
fn write_error<'a>(
    operation: &'static str,
    names: &'a ActorNames,
) -> impl FnOnce(tokio_postgres::Error) -> StoreError + 'a {
    move |err| {
        if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
            StoreError::AlreadyExists {
                first_name: names.first_name.clone(),
                last_name: names.last_name.clone(),
            }
        } else {
            pg_error(operation)(err)
        }
    }
}

fn row_to_actor(row: &Row, operation: &'static str) -> StoreResult<Actor> {
    Ok(Actor {
        id: ActorId::new(row.try_get::<_, i64>(0).map_err(pg_error(operation))?),
        first_name: row.try_get(1).map_err(pg_error(operation))?,
        last_name: row.try_get(2).map_err(pg_error(operation))?,
        last_update: row.try_get(3).map_err(pg_error(operation))?,
    })
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// PostgreSQL actor store over a connection pool.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Close the pool; outstanding and future checkouts fail.
    pub fn close(&self) {
        self.pool.close();
    }

    /// Get a connection from the pool.
    async fn get_conn(&self, operation: &'static str) -> StoreResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_error(operation))
    }
}

#[async_trait]
impl ActorStore for DbClient {
    async fn list(&self, query: &ListQuery) -> StoreResult<Vec<Actor>> {
        const OP: &str = "list";
        let conn = self.get_conn(OP).await?;

        let term = query.search.trim();
        let pattern = (!term.is_empty()).then(|| ilike_pattern(term));
        let offset = i64::try_from(query.offset).unwrap_or(i64::MAX);
        let limit = (query.limit > 0).then_some(i64::from(query.limit));

        let rows = conn
            .query(
                list_sql(query.order_descending).as_str(),
                &[&pattern, &offset, &limit],
            )
            .await
            .map_err(pg_error(OP))?;

        rows.iter().map(|row| row_to_actor(row, OP)).collect()
    }

    async fn get(&self, id: ActorId) -> StoreResult<Actor> {
        const OP: &str = "get";
        let conn = self.get_conn(OP).await?;

        let sql = format!("SELECT {SELECT_COLUMNS} FROM public.actor WHERE actor_id = $1::BIGINT");
        let row = conn
            .query_opt(sql.as_str(), &[&id.get()])
            .await
            .map_err(pg_error(OP))?
            .ok_or(StoreError::NotFound { id })?;

        row_to_actor(&row, OP)
    }

    async fn create(&self, names: &ActorNames) -> StoreResult<ActorId> {
        const OP: &str = "create";
        let mut conn = self.get_conn(OP).await?;
        let tx = conn.transaction().await.map_err(pg_error(OP))?;

        tx.batch_execute(LOCK_WRITERS).await.map_err(pg_error(OP))?;

        let none: Option<i64> = None;
        let taken: bool = tx
            .query_one(PAIR_EXISTS, &[&names.first_name, &names.last_name, &none])
            .await
            .map_err(pg_error(OP))?
            .try_get(0)
            .map_err(pg_error(OP))?;
        if taken {
            return Err(StoreError::AlreadyExists {
                first_name: names.first_name.clone(),
                last_name: names.last_name.clone(),
            });
        }

        let id: i64 = tx
            .query_one(
                "INSERT INTO public.actor (first_name, last_name, last_update) \
                 VALUES ($1, $2, now()) RETURNING actor_id::BIGINT",
                &[&names.first_name, &names.last_name],
            )
            .await
            .map_err(write_error(OP, names))?
            .try_get(0)
            .map_err(pg_error(OP))?;

        tx.commit().await.map_err(pg_error(OP))?;

        tracing::debug!(actor_id = id, "Actor created");
        Ok(ActorId::new(id))
    }

    async fn update(&self, id: ActorId, names: &ActorNames) -> StoreResult<Actor> {
        const OP: &str = "update";
        let mut conn = self.get_conn(OP).await?;
        let tx = conn.transaction().await.map_err(pg_error(OP))?;

        tx.batch_execute(LOCK_WRITERS).await.map_err(pg_error(OP))?;

        let current = tx
            .query_opt(
                "SELECT first_name, last_name FROM public.actor \
                 WHERE actor_id = $1::BIGINT FOR UPDATE",
                &[&id.get()],
            )
            .await
            .map_err(pg_error(OP))?
            .ok_or(StoreError::NotFound { id })?;

        let first_name: String = current.try_get(0).map_err(pg_error(OP))?;
        let last_name: String = current.try_get(1).map_err(pg_error(OP))?;
        if first_name == names.first_name && last_name == names.last_name {
            return Err(StoreError::NoChanges {
                id,
                first_name,
                last_name,
            });
        }

        let taken: bool = tx
            .query_one(
                PAIR_EXISTS,
                &[&names.first_name, &names.last_name, &Some(id.get())],
            )
            .await
            .map_err(pg_error(OP))?
            .try_get(0)
            .map_err(pg_error(OP))?;
        if taken {
            return Err(StoreError::AlreadyExists {
                first_name: names.first_name.clone(),
                last_name: names.last_name.clone(),
            });
        }

        let sql = format!(
            "UPDATE public.actor SET first_name = $1, last_name = $2, last_update = now() \
             WHERE actor_id = $3::BIGINT RETURNING {SELECT_COLUMNS}"
        );
        let row = tx
            .query_one(sql.as_str(), &[&names.first_name, &names.last_name, &id.get()])
            .await
            .map_err(write_error(OP, names))?;
        let actor = row_to_actor(&row, OP)?;

        tx.commit().await.map_err(pg_error(OP))?;

        tracing::debug!(actor_id = id.get(), "Actor updated");
        Ok(actor)
    }

    async fn delete(&self, id: ActorId) -> StoreResult<()> {
        const OP: &str = "delete";
        let mut conn = self.get_conn(OP).await?;
        let tx = conn.transaction().await.map_err(pg_error(OP))?;

        tx.query_opt(
            "SELECT 1 FROM public.actor WHERE actor_id = $1::BIGINT FOR UPDATE",
            &[&id.get()],
        )
        .await
        .map_err(pg_error(OP))?
        .ok_or(StoreError::NotFound { id })?;

        tx.execute(
            "DELETE FROM public.actor WHERE actor_id = $1::BIGINT",
            &[&id.get()],
        )
        .await
        .map_err(pg_error(OP))?;

        tx.commit().await.map_err(pg_error(OP))?;

        tracing::debug!(actor_id = id.get(), "Actor deleted");
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        const OP: &str = "health_check";
        let conn = self.get_conn(OP).await?;

        // Simple query to verify connectivity
        conn.query_one("SELECT 1", &[]).await.map_err(pg_error(OP))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ilike_pattern_escapes_wildcards() {
        assert_eq!(ilike_pattern("smith"), "%smith%");
        assert_eq!(ilike_pattern("50%"), "%50\\%%");
        assert_eq!(ilike_pattern("a_b"), "%a\\_b%");
        assert_eq!(ilike_pattern("back\\slash"), "%back\\\\slash%");
    }

    #[test]
    fn test_list_sql_order() {
        assert!(list_sql(false).contains("ORDER BY actor_id ASC"));
        assert!(list_sql(true).contains("ORDER BY actor_id DESC"));
        assert!(!list_sql(true).contains("smith"));
    }

    #[test]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.dbname, "apistack");
        assert_eq!(config.max_size, 10);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_create_pool_is_lazy() -> ApiResult<()> {
        // Nothing listens on port 1; creating the pool must still succeed.
        let config = DbConfig {
            port: 1,
            timeout: Duration::from_millis(200),
            ..DbConfig::default()
        };
        let db = DbClient::from_config(&config)?;
        assert_eq!(db.pool_size(), 0);

        let result = db.health_check().await;
        assert!(matches!(
            result,
            Err(StoreError::Unavailable { .. }) | Err(StoreError::PoolExhausted { .. })
        ));
        Ok(())
    }
}
