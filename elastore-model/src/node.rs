//! Declarative node kinds.
//!
//! A node kind names a record category and declares its fields; the
//! connection turns it into a [`Model`](crate::Model) registered under
//! that category.

use crate::error::SchemaResult;
use crate::schema::{Schema, Shape};
use crate::types::{TypeOptions, TypeTag};

pub trait NodeKind {
    /// Record category, also the registered model name.
    const TYPE: &'static str;

    fn shape() -> Shape;

    /// Extra schema setup (hooks, methods) applied after the shape.
    fn configure(schema: &mut Schema) -> SchemaResult<()> {
        let _ = schema;
        Ok(())
    }

    fn schema() -> SchemaResult<Schema> {
        let mut schema = Schema::from_shape(Self::shape())?;
        Self::configure(&mut schema)?;
        Ok(schema)
    }
}

/// A subject/predicate/object link between two documents, e.g.
/// `(post, "hasTag", tag)`.
pub struct Relationship;

impl NodeKind for Relationship {
    const TYPE: &'static str = "relationship";

    fn shape() -> Shape {
        let required = || TypeOptions::new().required(true);
        Shape::new()
            .field("subject", (TypeTag::String, required()))
            .field("predicate", (TypeTag::String, required()))
            .field("object", (TypeTag::String, required()))
    }
}
