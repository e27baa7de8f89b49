//! Service Layer
//!
//! Business logic between the HTTP handlers and the store: input
//! validation, list caching and store metrics.

mod actor_service;

pub use actor_service::*;
