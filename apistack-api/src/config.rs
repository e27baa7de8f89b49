//! API Configuration Module
//!
//! Server, CORS and list cache settings. Configuration is loaded from
//! environment variables with defaults suited to development.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use apistack_storage::CacheConfig;

use crate::constants::{
    DEFAULT_BIND_HOST, DEFAULT_CACHE_OP_TIMEOUT, DEFAULT_CORS_MAX_AGE_SECS, DEFAULT_PORT,
    DEFAULT_REDIS_URL, DEFAULT_REQUEST_TIMEOUT,
};
use crate::error::{ApiError, ApiResult};

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Listen host.
    pub bind_host: String,

    /// Listen port.
    pub port: u16,

    /// Deadline applied to every request.
    pub request_timeout: Duration,

    /// Allowed CORS origins (comma-separated in env var).
    /// Empty means allow all origins (dev mode).
    pub cors_origins: Vec<String>,

    /// Whether to allow credentials in CORS requests.
    pub cors_allow_credentials: bool,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_host: DEFAULT_BIND_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cors_origins: Vec::new(),
            cors_allow_credentials: false,
            cors_max_age_secs: DEFAULT_CORS_MAX_AGE_SECS,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `APISTACK_API_BIND`: Listen host (default: 0.0.0.0)
    /// - `PORT` or `APISTACK_API_PORT`: Listen port (default: 3000)
    /// - `APISTACK_REQUEST_TIMEOUT_SECS`: Request deadline (default: 300)
    /// - `APISTACK_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `APISTACK_CORS_ALLOW_CREDENTIALS`: "true" or "false" (default: false)
    /// - `APISTACK_CORS_MAX_AGE_SECS`: Preflight cache duration (default: 86400)
    ///
    /// # Errors
    /// Returns `INVALID_INPUT` for a port that is not a valid u16.
    pub fn from_env() -> ApiResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ApiResult<Self> {
        let bind_host = lookup("APISTACK_API_BIND")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_HOST.to_string());

        let port = match lookup("PORT").or_else(|| lookup("APISTACK_API_PORT")) {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ApiError::invalid_input(format!("Invalid port value: {}", raw)))?,
            None => DEFAULT_PORT,
        };

        let request_timeout = Duration::from_secs(parse_or(
            lookup("APISTACK_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT.as_secs(),
        ));

        let cors_origins = lookup("APISTACK_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let cors_allow_credentials = lookup("APISTACK_CORS_ALLOW_CREDENTIALS")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let cors_max_age_secs = parse_or(
            lookup("APISTACK_CORS_MAX_AGE_SECS"),
            DEFAULT_CORS_MAX_AGE_SECS,
        );

        Ok(Self {
            bind_host,
            port,
            request_timeout,
            cors_origins,
            cors_allow_credentials,
            cors_max_age_secs,
        })
    }

    /// Resolve the listen address.
    ///
    /// # Errors
    /// Returns `INVALID_INPUT` when host and port do not form a socket address.
    pub fn socket_addr(&self) -> ApiResult<SocketAddr> {
        let addr = format!("{}:{}", self.bind_host, self.port);
        addr.parse::<SocketAddr>().map_err(|e| {
            ApiError::invalid_input(format!("Invalid bind address {}: {}", addr, e))
        })
    }

    /// Check if a given origin is allowed.
    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.cors_origins.is_empty() || self.cors_origins.iter().any(|allowed| allowed == origin)
    }
}

// ============================================================================
// CACHE CONFIGURATION
// ============================================================================

/// Which list cache backend to run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
    Disabled,
}

impl FromStr for CacheBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(Self::Redis),
            "memory" | "in-memory" => Ok(Self::Memory),
            "none" | "off" | "disabled" => Ok(Self::Disabled),
            other => Err(format!("unknown cache backend '{}'", other)),
        }
    }
}

/// List cache settings.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub backend: CacheBackendKind,
    pub redis_url: String,
    pub cache: CacheConfig,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            cache: CacheConfig::default(),
        }
    }
}

impl CacheSettings {
    /// Create CacheSettings from environment variables.
    ///
    /// Environment variables:
    /// - `APISTACK_CACHE_BACKEND`: `redis`, `memory` or `none` (default: memory)
    /// - `APISTACK_REDIS_URL`: Redis URL (default: redis://127.0.0.1:6379/0)
    /// - `APISTACK_CACHE_TTL_SECS`: List entry TTL (default: 180)
    /// - `APISTACK_CACHE_OP_TIMEOUT_MS`: Per-command timeout (default: 250)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the settings from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let backend = match lookup("APISTACK_CACHE_BACKEND") {
            Some(raw) => raw.parse().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Falling back to the in-memory list cache");
                CacheBackendKind::Memory
            }),
            None => defaults.backend,
        };

        let redis_url = lookup("APISTACK_REDIS_URL").unwrap_or(defaults.redis_url);

        let ttl = Duration::from_secs(parse_or(
            lookup("APISTACK_CACHE_TTL_SECS"),
            defaults.cache.ttl.as_secs(),
        ));
        let op_timeout = Duration::from_millis(parse_or(
            lookup("APISTACK_CACHE_OP_TIMEOUT_MS"),
            DEFAULT_CACHE_OP_TIMEOUT.as_millis() as u64,
        ));

        Self {
            backend,
            redis_url,
            cache: CacheConfig::new().with_ttl(ttl).with_op_timeout(op_timeout),
        }
    }
}
