//! Error types for the model layer.
//!
//! Three families: [`DomainError`] for user-actionable failures detected by
//! this layer, [`ValidationError`] for values a schema type rejected, and
//! store failures passed through from the adapter. [`SchemaError`] covers
//! mistakes made while defining a schema.

use elastore_store::StoreError;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type for schema definition.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Any failure surfaced by a model operation.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid stored data: {0}")]
    Data(#[from] elastore_types::Error),

    /// A hook rejected; the rest of its chain did not run.
    #[error("hook `{event}` failed: {source}")]
    Hook {
        event: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ModelError {
    /// The domain error, if this is one.
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            ModelError::Domain(err) => Some(err),
            _ => None,
        }
    }

    /// The validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ModelError::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Failures detected by the model layer itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("ID is not defined")]
    MissingId,

    #[error("ID `{0}` does not exist")]
    NotFound(String),

    #[error("`{0}` is required but missing")]
    RequiredPathMissing(String),

    #[error("document is not bound to a live model")]
    Detached,

    #[error("no instance method named `{0}`")]
    UnknownMethod(String),

    #[error("no static method named `{0}`")]
    UnknownStatic(String),

    #[error("no collection name has been specified")]
    MissingCollection,

    #[error("filter on `{0}` cannot be evaluated by the store")]
    UnsupportedFilter(String),
}

/// A schema type rejected a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Schema path that rejected the value.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Mistakes in a schema definition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("invalid value for schema path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("hook type must be `save` or `remove`, got `{0}`")]
    InvalidHookType(String),

    #[error("method name is required")]
    EmptyMethodName,

    #[error("schema definition must be an object")]
    InvalidShape,
}
