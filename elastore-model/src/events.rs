//! Change notifications broadcast by a model after each write.

use crate::document::Document;

/// A completed write. Subscribers obtain these from `Model::subscribe`.
#[derive(Debug, Clone)]
pub enum ModelEvent {
    Insert(Document),
    Update(Document),
    Remove(Document),
}

impl ModelEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ModelEvent::Insert(_) => "insert",
            ModelEvent::Update(_) => "update",
            ModelEvent::Remove(_) => "remove",
        }
    }

    pub fn document(&self) -> &Document {
        match self {
            ModelEvent::Insert(doc) | ModelEvent::Update(doc) | ModelEvent::Remove(doc) => doc,
        }
    }
}
