//! The actor record and its identity types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Timestamp type using UTC timezone.
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// IDENTITY
// ============================================================================

/// Server-assigned actor identifier.
///
/// Serialized as a bare integer. Only digit strings parse; signs, whitespace
/// and overflow are rejected so path segments like `-1` or `1e3` never reach
/// the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct ActorId(i64);

impl ActorId {
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// The identifier following this one. Used by stores that assign ids
    /// as max+1.
    pub fn next(self) -> Option<Self> {
        self.0.checked_add(1).map(Self)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ActorId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Error returned when a string is not a valid actor id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseActorIdError {
    #[error("id is empty")]
    Empty,

    #[error("id '{0}' is not numeric")]
    NotNumeric(String),

    #[error("id '{0}' is out of range")]
    OutOfRange(String),
}

impl FromStr for ActorId {
    type Err = ParseActorIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseActorIdError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseActorIdError::NotNumeric(s.to_string()));
        }
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| ParseActorIdError::OutOfRange(s.to_string()))
    }
}

// ============================================================================
// ACTOR
// ============================================================================

/// A persisted actor record.
///
/// Field names on the wire are PascalCase (`ID`, `FirstName`, ...), the
/// format existing clients of the service already consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Actor {
    #[serde(rename = "ID")]
    pub id: ActorId,
    #[serde(rename = "FirstName")]
    pub first_name: String,
    #[serde(rename = "LastName")]
    pub last_name: String,
    #[serde(rename = "LastUpdate")]
    #[cfg_attr(feature = "openapi", schema(value_type = String, format = "date-time"))]
    pub last_update: Timestamp,
}

impl Actor {
    /// Whether this actor carries exactly the given name pair.
    pub fn has_names(&self, names: &ActorNames) -> bool {
        self.first_name == names.first_name && self.last_name == names.last_name
    }

    /// Case-insensitive substring match on either name.
    ///
    /// `needle` must already be lowercased.
    pub fn matches_search(&self, needle: &str) -> bool {
        needle.is_empty()
            || self.first_name.to_lowercase().contains(needle)
            || self.last_name.to_lowercase().contains(needle)
    }
}

/// The mutable part of an actor: the name pair written by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorNames {
    pub first_name: String,
    pub last_name: String,
}

impl ActorNames {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
        }
    }
}

impl fmt::Display for ActorNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.first_name, self.last_name)
    }
}
