//! Custom Axum extractors.

mod path_id;

pub use path_id::{ActorIdPath, PathIdError};
