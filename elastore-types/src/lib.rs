//! Core type definitions for elastore.
//!
//! The value layer under both the store contract and the schema layer:
//! - [`Value`] / [`Record`] — the in-memory document representation
//! - dotted-path access into records ([`get_path`], [`set_path`], [`delete_path`])
//! - [`generate_id`]: time-ordered document identifiers (UUID v7)
//!
//! Wire payloads exchanged with a store are plain `serde_json::Value`s;
//! [`Value::from_json`] and [`Value::to_json`] convert between the two.

mod ids;
mod path;
mod value;

pub use ids::generate_id;
pub use path::{delete_path, get_path, set_path};
pub use value::{Record, Value};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),
}
