//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by a store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("record not found: {collection}/{category}/{id}")]
    NotFound {
        collection: String,
        category: String,
        id: String,
    },

    /// The collection (index) does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// The category has no mapping in the collection.
    #[error("mapping not found: {collection}/{category}")]
    MappingNotFound { collection: String, category: String },

    /// A payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Opaque backend failure.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is the single-record not-found case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}
