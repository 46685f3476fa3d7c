use elastore_model::{
    ConnectionConfig, Document, DomainError, Model, Schema, Shape, TypeOptions, TypeTag,
};
use elastore_store::MemoryStore;
use elastore_types::{Record, Value, get_path};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

fn person_model() -> Model {
    let mut schema = Schema::from_shape(
        Shape::new()
            .field(
                "name",
                Shape::new()
                    .field("first", TypeTag::String)
                    .field("last", TypeTag::String),
            )
            .field("age", (TypeTag::Number, TypeOptions::new().default_value(0))),
    )
    .unwrap();
    schema
        .virtual_path("name.full", |data| {
            let first = get_path(data, "name.first")?.as_str()?;
            let last = get_path(data, "name.last")?.as_str()?;
            Some(Value::from(format!("{first} {last}")))
        })
        .unwrap();
    schema
        .method("greet", |doc, args| {
            let greeting = args.first().and_then(Value::as_str).unwrap_or("Hello");
            let first = doc.get_str("name.first").unwrap_or_default();
            Ok(Value::from(format!("{greeting}, {first}")))
        })
        .unwrap();

    Model::new(
        "Person",
        schema,
        Arc::new(MemoryStore::new()),
        Arc::new(ConnectionConfig::new("docs")),
    )
}

// ── Data access ──────────────────────────────────────────────────

#[test]
fn virtual_paths_follow_current_data() {
    let people = person_model();
    let mut doc = people
        .new_document(json!({ "name": { "first": "John", "last": "Doe" } }))
        .unwrap();
    assert_eq!(doc.get("name.full"), Some(Value::from("John Doe")));

    doc.set("name.first", "Jane");
    assert_eq!(doc.get("name.full"), Some(Value::from("Jane Doe")));
    assert_eq!(
        get_path(&doc.to_object(), "name.full"),
        Some(&Value::from("Jane Doe"))
    );
}

#[test]
fn unset_removes_path() {
    let people = person_model();
    let mut doc = people.new_document(json!({ "age": 3 })).unwrap();

    assert_eq!(doc.unset("age"), Some(Value::from(3)));
    assert_eq!(doc.get("age"), None);
    assert_eq!(doc.unset("age"), None);
}

#[test]
fn to_json_renders_wire_values() {
    let people = person_model();
    let doc = people
        .new_document(json!({ "_id": "p1", "name": { "first": "A", "last": "B" }, "age": 7 }))
        .unwrap();

    assert_eq!(
        doc.to_json(),
        json!({
            "_id": "p1",
            "age": 7,
            "name": { "first": "A", "last": "B", "full": "A B" }
        })
    );
    assert_eq!(doc.to_string(), doc.to_json().to_string());
}

#[test]
fn typed_accessors() {
    let mut data = Record::new();
    data.insert("flag".into(), Value::from(true));
    data.insert("n".into(), Value::from(2.5));
    let doc = Document::detached(data);

    assert_eq!(doc.get_bool("flag"), Some(true));
    assert_eq!(doc.get_number("n"), Some(2.5));
    assert_eq!(doc.get_str("n"), None);
    assert_eq!(doc.id(), None);
}

// ── Methods ──────────────────────────────────────────────────────

#[test]
fn instance_methods_receive_document_and_args() {
    let people = person_model();
    let doc = people
        .new_document(json!({ "name": { "first": "Ada" } }))
        .unwrap();

    assert_eq!(doc.call("greet", &[]).unwrap(), Value::from("Hello, Ada"));
    assert_eq!(
        doc.call("greet", &[Value::from("Hi")]).unwrap(),
        Value::from("Hi, Ada")
    );

    let err = doc.call("wave", &[]).unwrap_err();
    assert_eq!(
        err.as_domain(),
        Some(&DomainError::UnknownMethod("wave".to_string()))
    );
}

// ── Persistence through the model link ───────────────────────────

#[tokio::test]
async fn document_save_update_remove() {
    let people = person_model();
    let doc = people
        .new_document(json!({ "_id": "p1", "name": { "first": "A", "last": "B" } }))
        .unwrap();
    assert!(doc.is_bound_to(&people));

    doc.save().await.unwrap();
    assert_eq!(people.count().await.unwrap(), 1);

    let updated = doc.update(json!({ "age": 41 })).await.unwrap();
    assert_eq!(updated.get_number("age"), Some(41.0));

    let removed = updated.remove().await.unwrap();
    assert_eq!(removed.id(), Some("p1"));
    assert!(people.get("p1").await.unwrap().is_none());
}

#[tokio::test]
async fn detached_document_cannot_persist() {
    let doc = Document::detached(Record::new());

    let err = doc.save().await.unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::Detached));
    assert!(doc.model().is_err());
}

#[tokio::test]
async fn document_outliving_model_is_detached() {
    let people = person_model();
    let doc = people.new_document(json!({ "age": 1 })).unwrap();
    drop(people);

    assert_eq!(doc.get_number("age"), Some(1.0));
    let err = doc.remove().await.unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::Detached));
}

#[tokio::test]
async fn new_document_rebinds_existing_documents() {
    let people = person_model();
    let detached = Document::detached(Record::new());

    let bound = people.new_document(detached).unwrap();
    assert!(bound.is_bound_to(&people));
    assert_eq!(bound.id(), None);
}
