//! Documents: one record plus a link back to its model.
//!
//! The link is weak; a document outliving its model keeps its data but its
//! persistence methods fail with [`DomainError::Detached`].

use crate::error::{DomainError, ModelResult};
use crate::model::{Model, ModelInner};
use crate::schema::ID_PATH;
use crate::types::TypeTag;
use elastore_types::{Record, Value, delete_path, get_path, set_path};
use std::fmt;
use std::sync::{Arc, Weak};

/// Anything a model can turn into a document.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    Record(Record),
    Json(serde_json::Value),
    Document(Document),
}

impl DocumentInput {
    pub(crate) fn into_record(self) -> ModelResult<Record> {
        match self {
            DocumentInput::Record(record) => Ok(record),
            DocumentInput::Json(json) => Ok(Value::record_from_json(json)?),
            DocumentInput::Document(doc) => Ok(doc.data),
        }
    }
}

impl From<Record> for DocumentInput {
    fn from(record: Record) -> Self {
        DocumentInput::Record(record)
    }
}

impl From<serde_json::Value> for DocumentInput {
    fn from(json: serde_json::Value) -> Self {
        DocumentInput::Json(json)
    }
}

impl From<Document> for DocumentInput {
    fn from(doc: Document) -> Self {
        DocumentInput::Document(doc)
    }
}

impl From<&Document> for DocumentInput {
    fn from(doc: &Document) -> Self {
        DocumentInput::Document(doc.clone())
    }
}

/// One entity of a model.
#[derive(Clone)]
pub struct Document {
    data: Record,
    model: Weak<ModelInner>,
}

impl Document {
    pub(crate) fn bound(data: Record, model: Weak<ModelInner>) -> Self {
        Self { data, model }
    }

    /// A document attached to no model.
    pub fn detached(data: Record) -> Self {
        Self {
            data,
            model: Weak::new(),
        }
    }

    /// The identifier, if set.
    pub fn id(&self) -> Option<&str> {
        get_path(&self.data, ID_PATH).and_then(Value::as_str)
    }

    /// Reads a path. Virtual paths are recomputed from the current data.
    pub fn get(&self, path: &str) -> Option<Value> {
        if let Some(model) = self.model.upgrade() {
            if let Some(schema_type) = model
                .schema
                .type_of(path)
                .filter(|t| t.tag() == TypeTag::Virtual)
            {
                return schema_type.cast(None, &self.data).ok().flatten();
            }
        }
        get_path(&self.data, path).cloned()
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        get_path(&self.data, path).and_then(Value::as_str)
    }

    pub fn get_number(&self, path: &str) -> Option<f64> {
        get_path(&self.data, path).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        get_path(&self.data, path).and_then(Value::as_bool)
    }

    pub fn set(&mut self, path: &str, value: impl Into<Value>) {
        set_path(&mut self.data, path, value.into());
    }

    /// Deletes a path from the in-memory data.
    pub fn unset(&mut self, path: &str) -> Option<Value> {
        delete_path(&mut self.data, path)
    }

    /// Raw data, without recomputing virtual paths.
    pub fn data(&self) -> &Record {
        &self.data
    }

    pub fn into_data(self) -> Record {
        self.data
    }

    /// A copy of the data with virtual paths recomputed.
    pub fn to_object(&self) -> Record {
        let mut data = self.data.clone();
        if let Some(model) = self.model.upgrade() {
            let virtuals = model
                .schema
                .paths()
                .filter(|(_, t)| t.tag() == TypeTag::Virtual);
            for (name, schema_type) in virtuals {
                match schema_type.cast(None, &self.data).ok().flatten() {
                    Some(value) => set_path(&mut data, name, value),
                    None => {
                        delete_path(&mut data, name);
                    }
                }
            }
        }
        data
    }

    pub fn to_json(&self) -> serde_json::Value {
        Value::record_to_json(&self.to_object())
    }

    /// The owning model.
    pub fn model(&self) -> ModelResult<Model> {
        self.model
            .upgrade()
            .map(Model::from_inner)
            .ok_or_else(|| DomainError::Detached.into())
    }

    pub fn is_bound_to(&self, model: &Model) -> bool {
        self.model
            .upgrade()
            .is_some_and(|inner| Arc::ptr_eq(&inner, model.inner()))
    }

    /// Invokes an instance method declared on the schema.
    pub fn call(&self, method: &str, args: &[Value]) -> ModelResult<Value> {
        let model = self.model()?;
        let f = model
            .schema()
            .instance_method(method)
            .cloned()
            .ok_or_else(|| DomainError::UnknownMethod(method.to_string()))?;
        f(self, args)
    }

    /// Persists this document through its model.
    pub async fn save(&self) -> ModelResult<Document> {
        self.model()?.save(self).await
    }

    /// Applies a partial update to the stored copy of this document.
    pub async fn update(&self, update: impl Into<DocumentInput>) -> ModelResult<Document> {
        let id = self.id().unwrap_or_default().to_string();
        self.model()?.update_by_id(&id, update).await
    }

    /// Removes the stored copy of this document.
    pub async fn remove(&self) -> ModelResult<Document> {
        let id = self.id().unwrap_or_default().to_string();
        self.model()?.remove(&id).await
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("data", &self.data).finish()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}
