#![allow(dead_code)]

use apistack_api::db::{DbClient, DbConfig};
use apistack_api::ApiResult;

/// Reference table layout. The service never migrates; tests create it.
pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS public.actor (
    actor_id    BIGSERIAL PRIMARY KEY,
    first_name  VARCHAR(100) NOT NULL,
    last_name   VARCHAR(100) NOT NULL,
    last_update TIMESTAMPTZ NOT NULL DEFAULT now()
)";

pub fn test_db_client() -> ApiResult<DbClient> {
    let config = DbConfig::from_env();
    DbClient::from_config(&config)
}

/// Pool for running setup statements directly.
pub fn test_pool() -> ApiResult<deadpool_postgres::Pool> {
    DbConfig::from_env().create_pool()
}
