use super::{SchemaType, TypeOptions, TypeTag};
use crate::error::ValidationError;
use elastore_types::{Record, Value};
use std::fmt;
use std::sync::Arc;

/// Computes a virtual path from the whole record.
pub type VirtualGetter = Arc<dyn Fn(&Record) -> Option<Value> + Send + Sync>;

/// A computed path. It is recomputed whenever getters run and is never
/// persisted: setting it has no effect on what the store receives.
#[derive(Clone)]
pub struct VirtualType {
    name: String,
    options: TypeOptions,
    getter: Option<VirtualGetter>,
}

impl VirtualType {
    pub fn new(name: &str, getter: Option<VirtualGetter>) -> Self {
        Self {
            name: name.to_string(),
            options: TypeOptions::new(),
            getter,
        }
    }

    /// Evaluates the getter against `data`.
    pub fn evaluate(&self, data: &Record) -> Option<Value> {
        self.getter.as_ref().and_then(|getter| getter(data))
    }
}

impl fmt::Debug for VirtualType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VirtualType")
            .field("name", &self.name)
            .field("getter", &self.getter.is_some())
            .finish()
    }
}

impl SchemaType for VirtualType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Virtual
    }

    fn cast(&self, value: Option<Value>, data: &Record) -> Result<Option<Value>, ValidationError> {
        match self.getter {
            Some(_) => Ok(self.evaluate(data)),
            None => Ok(value),
        }
    }

    fn validate(
        &self,
        _value: Option<Value>,
        _data: &Record,
    ) -> Result<Option<Value>, ValidationError> {
        Ok(None)
    }

    fn parse(&self, _value: Option<Value>, _data: &Record) -> Option<Value> {
        None
    }

    fn value(&self, _value: Option<Value>, _data: &Record) -> Option<Value> {
        None
    }
}
