//! Schema-driven document models over a pluggable store.
//!
//! - [`Schema`] declares typed paths, virtual paths, hooks, methods and statics
//! - [`Model`] runs the entity lifecycle (save, update, remove, get, find)
//!   against a [`StoreAdapter`](elastore_store::StoreAdapter)
//! - [`Document`] is one entity with a weak link back to its model
//! - [`Connection`] holds configuration and the model registry
//!
//! ```ignore
//! let conn = Connection::new(Arc::new(MemoryStore::new()), ConnectionConfig::new("app"))?;
//! conn.connect().await?;
//!
//! let users = conn.model("User", Schema::from_json(&json!({
//!     "name": "String",
//!     "age": { "type": "Number", "required": true },
//! }))?);
//!
//! let saved = users.save(json!({ "name": "Ada", "age": 36 })).await?;
//! let found = users.get(saved.id().unwrap_or_default()).await?;
//! ```

mod connection;
mod document;
mod error;
mod events;
mod filter;
mod hooks;
mod model;
mod node;
mod schema;
pub mod types;

pub use connection::{Connection, ConnectionConfig, DEFAULT_LIMIT, FIND_ALL_LIMIT};
pub use document::{Document, DocumentInput};
pub use error::{DomainError, ModelError, ModelResult, SchemaError, SchemaResult, ValidationError};
pub use events::ModelEvent;
pub use filter::{Filter, FilterCondition, FindOptions, SortOrder};
pub use hooks::{
    AFTER_REMOVE, AFTER_SAVE, BEFORE_REMOVE, BEFORE_SAVE, Done, Hook, HookContext, HookFuture,
    HookKind, HookPhase, event_name,
};
pub use model::Model;
pub use node::{NodeKind, Relationship};
pub use schema::{Descriptor, ID_PATH, InstanceMethod, Schema, Shape, StaticMethod};
pub use types::{Matcher, SchemaType, TypeOptions, TypeTag};
