//! Error types for store and cache operations

use crate::actor::ActorId;
use thiserror::Error;

/// Store layer errors.
///
/// `NotFound`, `AlreadyExists` and `NoChanges` are domain outcomes. The
/// remaining variants cover connectivity and driver failures, whose detail
/// is logged where they happen and never shown to clients.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Actor {id} not found")]
    NotFound { id: ActorId },

    #[error("Actor '{first_name} {last_name}' already exists")]
    AlreadyExists {
        first_name: String,
        last_name: String,
    },

    #[error("Actor {id} already has the names '{first_name} {last_name}'")]
    NoChanges {
        id: ActorId,
        first_name: String,
        last_name: String,
    },

    #[error("Store operation '{operation}' failed: {reason}")]
    Internal {
        operation: &'static str,
        reason: String,
    },

    /// No pooled connection became available in time.
    #[error("Store operation '{operation}' timed out waiting for a connection")]
    PoolExhausted { operation: &'static str },

    /// The backend is shut down or unreachable.
    #[error("Store unavailable during '{operation}': {reason}")]
    Unavailable {
        operation: &'static str,
        reason: String,
    },
}

impl StoreError {
    pub fn internal(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Internal {
            operation,
            reason: reason.into(),
        }
    }

    /// Operation name carried by infrastructure failures.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            Self::Internal { operation, .. }
            | Self::PoolExhausted { operation }
            | Self::Unavailable { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Uniqueness or no-op violations.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. } | Self::NoChanges { .. })
    }
}

/// Cache backend errors. Callers recover from all of them locally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache connection failed: {reason}")]
    Connection { reason: String },

    #[error("Cache operation '{operation}' timed out")]
    Timeout { operation: &'static str },

    #[error("Cache backend error: {reason}")]
    Backend { reason: String },

    #[error("Cached payload could not be decoded: {reason}")]
    Serialization { reason: String },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_classification() {
        let exists = StoreError::AlreadyExists {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        let no_changes = StoreError::NoChanges {
            id: ActorId::new(1),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
        };
        assert!(exists.is_conflict());
        assert!(no_changes.is_conflict());
        assert!(!StoreError::NotFound { id: ActorId::new(1) }.is_conflict());
        assert!(!StoreError::internal("get", "boom").is_conflict());
        assert!(!StoreError::PoolExhausted { operation: "get" }.is_conflict());
    }

    #[test]
    fn test_operation_is_reported_for_infrastructure_errors() {
        assert_eq!(StoreError::internal("list", "io").operation(), Some("list"));
        assert_eq!(
            StoreError::PoolExhausted { operation: "create" }.operation(),
            Some("create")
        );
        assert_eq!(StoreError::NotFound { id: ActorId::new(1) }.operation(), None);
    }

    #[test]
    fn test_error_display() {
        let err = StoreError::NotFound { id: ActorId::new(9) };
        assert_eq!(err.to_string(), "Actor 9 not found");

        let err = StoreError::internal("create", "connection reset");
        assert!(err.to_string().contains("create"));
        assert!(err.to_string().contains("connection reset"));

        let err = CacheError::Timeout { operation: "get" };
        assert!(err.to_string().contains("timed out"));
    }
}
