//! Constants for the apistack API
//!
//! This module contains the constant values used throughout the API.

use std::time::Duration;

// ============================================================================
// SERVER
// ============================================================================

/// Default listen host.
pub const DEFAULT_BIND_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default global request timeout (5 minutes).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Default CORS max age in seconds (24 hours)
pub const DEFAULT_CORS_MAX_AGE_SECS: u64 = 86400;

// ============================================================================
// ACTORS
// ============================================================================

/// Maximum length of a first or last name, in characters.
pub const MAX_NAME_LEN: usize = 100;

/// Maximum length of a list search term, in characters. Longer terms
/// cannot match a name.
pub const MAX_SEARCH_LEN: usize = MAX_NAME_LEN;

/// Maximum page size for list operations.
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Message returned by a successful delete.
pub const ACTOR_DELETED_MESSAGE: &str = "Actor deleted";

// ============================================================================
// CACHE
// ============================================================================

/// Default Redis URL.
pub const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379/0";

/// Default per-command cache timeout.
pub const DEFAULT_CACHE_OP_TIMEOUT: Duration = Duration::from_millis(250);

// ============================================================================
// TELEMETRY
// ============================================================================

/// Default tracing filter when RUST_LOG is unset.
pub const DEFAULT_LOG_FILTER: &str = "apistack_api=debug,tower_http=debug,info";

/// Instrumentation scope name for spans created by this crate.
pub const TRACER_NAME: &str = "apistack-api";
