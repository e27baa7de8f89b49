//! apistack API - REST Layer for Actor Records
//!
//! Axum routes over an [`ActorStore`](apistack_storage::ActorStore): the
//! PostgreSQL store in [`db`] in production, the in-memory store in tests.
//! List requests go through an optional cache-aside layer (Redis or in
//! memory). Requests are traced with OpenTelemetry and counted in a
//! Prometheus registry.

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod extractors;
mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod types;
pub mod validation;

// Re-export commonly used types
pub use config::{ApiConfig, CacheBackendKind, CacheSettings};
pub use db::{DbClient, DbConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use routes::create_api_router;
pub use services::ActorService;
pub use state::AppState;
pub use telemetry::ApiMetrics;
pub use types::*;
