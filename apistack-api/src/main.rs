//! apistack API Server Entry Point
//!
//! Loads configuration, connects the store and the list cache, and serves
//! the Axum router until SIGINT or SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use apistack_api::config::{ApiConfig, CacheBackendKind, CacheSettings};
use apistack_api::telemetry::{init_telemetry, TelemetryConfig};
use apistack_api::{create_api_router, ApiError, ApiMetrics, ApiResult, AppState, DbClient, DbConfig};
use apistack_storage::{ActorListCache, InMemoryListCache, RedisListCache};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry = init_telemetry(&TelemetryConfig::from_env())?;

    let api_config = ApiConfig::from_env()?;
    let addr = api_config.socket_addr()?;

    let db_config = DbConfig::from_env();
    let db = DbClient::from_config(&db_config)?;
    tracing::info!(
        host = %db_config.host,
        port = db_config.port,
        dbname = %db_config.dbname,
        pool_size = db_config.max_size,
        "Database pool configured"
    );

    let cache = build_list_cache(&CacheSettings::from_env()).await;
    let metrics = Arc::new(ApiMetrics::new()?);
    let state = AppState::new(
        Arc::new(db.clone()),
        cache,
        metrics,
        telemetry.request_tracer(),
    );
    let app = create_api_router(state, &api_config);

    tracing::info!(%addr, "Starting apistack API server");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    db.close();
    telemetry.shutdown();
    Ok(())
}

/// Build the list cache. An unreachable Redis is not fatal: the service
/// runs without a cache and lists go straight to the store.
async fn build_list_cache(settings: &CacheSettings) -> Option<ActorListCache> {
    match settings.backend {
        CacheBackendKind::Redis => {
            match RedisListCache::connect(&settings.redis_url, settings.cache.op_timeout).await {
                Ok(redis) => {
                    tracing::info!(ttl_secs = settings.cache.ttl.as_secs(), "Using Redis list cache");
                    Some(ActorListCache::new(Arc::new(redis), settings.cache))
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Redis unavailable, running without list cache");
                    None
                }
            }
        }
        CacheBackendKind::Memory => {
            tracing::info!(ttl_secs = settings.cache.ttl.as_secs(), "Using in-memory list cache");
            let memory = InMemoryListCache::new();
            spawn_expiry_sweeper(memory.clone(), settings.cache.ttl);
            Some(ActorListCache::new(Arc::new(memory), settings.cache))
        }
        CacheBackendKind::Disabled => {
            tracing::info!("List cache disabled");
            None
        }
    }
}

/// Purge expired in-memory entries once per TTL, so keys that are never
/// read again do not accumulate between writes.
fn spawn_expiry_sweeper(cache: InMemoryListCache, ttl: Duration) {
    if ttl.is_zero() {
        return;
    }
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ttl);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let removed = cache.purge_expired();
            if removed > 0 {
                tracing::debug!(removed, "Purged expired list cache entries");
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
