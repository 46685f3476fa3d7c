use chrono::{TimeZone, Utc};
use elastore_model::{
    Connection, ConnectionConfig, Descriptor, DomainError, Filter, FindOptions, Model, ModelError,
    ModelEvent, Schema, Shape, SortOrder, TypeOptions, TypeTag,
};
use elastore_store::{MemoryStore, Operation, StoreAdapter, StoreError};
use elastore_types::{Value, get_path};
use pretty_assertions::assert_eq;
use regex::Regex;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const COLLECTION: &str = "test";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn user_schema() -> Schema {
    let mut schema = Schema::from_shape(
        Shape::new()
            .field(
                "name",
                Shape::new()
                    .field("first", TypeTag::String)
                    .field("last", TypeTag::String),
            )
            .field("email", TypeTag::String)
            .field("age", (TypeTag::Number, TypeOptions::new().default_value(18)))
            .field("joined", TypeTag::Date)
            .field("tags", Descriptor::array_of(TypeTag::String)),
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
        .static_method("category", |model, _| Ok(Value::from(model.category())))
        .unwrap();
    schema
}

async fn setup() -> (Arc<MemoryStore>, Model) {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let conn = Connection::new(store.clone(), ConnectionConfig::new(COLLECTION)).unwrap();
    conn.connect().await.unwrap();
    let users = conn.model("User", user_schema());
    (store, users)
}

async fn seed(users: &Model) -> Vec<String> {
    users
        .save_many(vec![
            json!({ "name": { "first": "Ann", "last": "Lee" }, "email": "ann@example.com", "age": 20 }),
            json!({ "name": { "first": "Bob", "last": "Ray" }, "email": "bob@test.org", "age": 30 }),
            json!({ "name": { "first": "Cid", "last": "Moe" }, "email": "cid@example.com", "age": 40 }),
        ])
        .await
        .unwrap()
        .iter()
        .map(|doc| doc.id().unwrap().to_string())
        .collect()
}

fn ages(docs: &[elastore_model::Document]) -> Vec<f64> {
    docs.iter().filter_map(|d| d.get_number("age")).collect()
}

// ── Construction ─────────────────────────────────────────────────

#[tokio::test]
async fn new_document_applies_getters() {
    let (_, users) = setup().await;
    let doc = users
        .new_document(json!({ "name": { "first": "John", "last": "Doe" } }))
        .unwrap();

    assert!(doc.id().is_some());
    assert_eq!(doc.get_number("age"), Some(18.0));
    assert_eq!(doc.get("tags"), Some(Value::Array(vec![])));
    assert_eq!(doc.get("name.full"), Some(Value::from("John Doe")));
}

#[tokio::test]
async fn new_document_rejects_missing_required_path() {
    let store = Arc::new(MemoryStore::new());
    let posts = Model::new(
        "Post",
        Schema::from_json(&json!({ "title": { "type": "String", "required": true } })).unwrap(),
        store,
        Arc::new(ConnectionConfig::new(COLLECTION)),
    );

    let err = posts.new_document(json!({})).unwrap_err();
    assert_eq!(
        err.as_domain(),
        Some(&DomainError::RequiredPathMissing("title".to_string()))
    );
}

#[tokio::test]
async fn non_object_input_is_rejected() {
    let (_, users) = setup().await;
    let err = users.new_document(json!([1, 2])).unwrap_err();
    assert!(matches!(err, ModelError::Data(_)));
}

// ── Save ─────────────────────────────────────────────────────────

#[tokio::test]
async fn save_then_get_round_trips() {
    let (_, users) = setup().await;
    let joined = Utc.with_ymd_and_hms(2015, 6, 1, 12, 0, 0).unwrap();

    let saved = users
        .save(json!({
            "name": { "first": "John", "last": "Doe" },
            "email": "john@example.com",
            "joined": "2015-06-01T12:00:00.000Z",
            "tags": ["admin"]
        }))
        .await
        .unwrap();
    let id = saved.id().unwrap().to_string();

    let found = users.get(&id).await.unwrap().unwrap();
    assert_eq!(found.id(), Some(id.as_str()));
    assert_eq!(found.get_str("email"), Some("john@example.com"));
    assert_eq!(found.get("joined"), Some(Value::Date(joined)));
    assert_eq!(found.get("name.full"), Some(Value::from("John Doe")));
    assert_eq!(
        found.get("tags"),
        Some(Value::Array(vec![Value::from("admin")]))
    );
}

#[tokio::test]
async fn stored_body_is_exported_without_virtuals() {
    let (store, users) = setup().await;
    let saved = users
        .save(json!({
            "name": { "first": "John", "last": "Doe" },
            "joined": "2015-06-01T12:00:00Z"
        }))
        .await
        .unwrap();

    let record = store
        .get_record(COLLECTION, "user", saved.id().unwrap())
        .await
        .unwrap();
    assert_eq!(record.source["name"], json!({ "first": "John", "last": "Doe" }));
    assert_eq!(record.source["joined"], json!("2015-06-01T12:00:00.000Z"));
    assert_eq!(record.source["age"], json!(18));
}

#[tokio::test]
async fn save_without_id_fails_before_any_write() {
    let (store, users) = setup().await;
    let mut doc = users.new_document(json!({ "email": "x@y.z" })).unwrap();
    doc.unset("_id");

    let err = users.save(doc).await.unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::MissingId));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn validation_failure_leaves_store_untouched() {
    let (store, users) = setup().await;
    let err = users.save(json!({ "age": "abc" })).await.unwrap_err();

    let validation = err.as_validation().unwrap();
    assert_eq!(validation.path, "age");
    assert_eq!(validation.message, "`NaN` is not a number!");
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn saving_same_id_replaces_document() {
    let (_, users) = setup().await;
    users
        .save(json!({ "_id": "u1", "email": "old@x.y" }))
        .await
        .unwrap();
    users
        .save(json!({ "_id": "u1", "email": "new@x.y" }))
        .await
        .unwrap();

    assert_eq!(users.count().await.unwrap(), 1);
    let doc = users.get("u1").await.unwrap().unwrap();
    assert_eq!(doc.get_str("email"), Some("new@x.y"));
}

#[tokio::test]
async fn save_many_keeps_input_order_and_refreshes_once() {
    let (store, users) = setup().await;
    let docs = users
        .save_many(vec![
            json!({ "_id": "a", "age": 1 }),
            json!({ "_id": "b", "age": 2 }),
            json!({ "_id": "c", "age": 3 }),
        ])
        .await
        .unwrap();

    let ids: Vec<_> = docs.iter().map(|d| d.id().unwrap()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(users.count().await.unwrap(), 3);

    let refreshes = store
        .operations()
        .into_iter()
        .filter(|op| *op == Operation::RefreshCollection)
        .count();
    assert_eq!(refreshes, 1);
}

#[tokio::test]
async fn save_many_reports_store_failure_without_refresh() {
    let (store, users) = setup().await;
    store.fail_operation(Operation::IndexRecord, "disk full");

    let err = users
        .save_many(vec![json!({ "age": 1 }), json!({ "age": 2 })])
        .await
        .unwrap_err();
    assert!(matches!(err, ModelError::Store(StoreError::Backend(ref m)) if m == "disk full"));
    assert!(!store.operations().contains(&Operation::RefreshCollection));
}

#[tokio::test]
async fn save_many_of_nothing_is_empty() {
    let (_, users) = setup().await;
    let docs = users
        .save_many(Vec::<serde_json::Value>::new())
        .await
        .unwrap();
    assert!(docs.is_empty());
}

// ── Insert ───────────────────────────────────────────────────────

#[tokio::test]
async fn insert_uses_store_assigned_id() {
    let (_, users) = setup().await;
    let mut doc = users.new_document(json!({ "email": "n@x.y" })).unwrap();
    doc.unset("_id");

    let inserted = users.insert(doc).await.unwrap();
    let id = inserted.id().unwrap().to_string();
    assert!(id.starts_with("auto-"));

    let found = users.get(&id).await.unwrap().unwrap();
    assert_eq!(found.get_str("email"), Some("n@x.y"));
}

#[tokio::test]
async fn insert_keeps_caller_id() {
    let (_, users) = setup().await;
    let docs = users
        .insert_many(vec![json!({ "_id": "x1" }), json!({ "_id": "x2" })])
        .await
        .unwrap();

    assert_eq!(docs[0].id(), Some("x1"));
    assert_eq!(docs[1].id(), Some("x2"));
    assert_eq!(users.count().await.unwrap(), 2);
}

// ── Update ───────────────────────────────────────────────────────

#[tokio::test]
async fn update_merges_partial_fields() {
    let (_, users) = setup().await;
    let ids = seed(&users).await;

    let updated = users
        .update_by_id(&ids[0], json!({ "age": 21, "name": { "last": "Kim" } }))
        .await
        .unwrap();

    assert_eq!(updated.get_number("age"), Some(21.0));
    assert_eq!(updated.get_str("name.first"), Some("Ann"));
    assert_eq!(updated.get("name.full"), Some(Value::from("Ann Kim")));
}

#[tokio::test]
async fn update_casts_partial_fields_before_storing() {
    let (store, users) = setup().await;
    let ids = seed(&users).await;

    let updated = users
        .update_by_id(&ids[0], json!({ "age": "31", "joined": 1433160000000i64 }))
        .await
        .unwrap();
    assert_eq!(updated.get_number("age"), Some(31.0));

    let record = store.get_record(COLLECTION, "user", &ids[0]).await.unwrap();
    assert_eq!(record.source["age"], json!(31));
    assert_eq!(record.source["joined"], json!("2015-06-01T12:00:00.000Z"));

    let found = users
        .find(json!({ "age": 31 }), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), Some(ids[0].as_str()));
}

#[tokio::test]
async fn update_rejects_invalid_partial_before_any_store_call() {
    let (store, users) = setup().await;
    let ids = seed(&users).await;
    let before = store.operations().len();

    let err = users
        .update_by_id(&ids[0], json!({ "age": "abc" }))
        .await
        .unwrap_err();
    let validation = err.as_validation().unwrap();
    assert_eq!(validation.path, "age");
    assert_eq!(validation.message, "`NaN` is not a number!");
    assert_eq!(store.operations().len(), before);

    let record = store.get_record(COLLECTION, "user", &ids[0]).await.unwrap();
    assert_eq!(record.source["age"], json!(20));
}

#[tokio::test]
async fn update_requires_existing_id() {
    let (_, users) = setup().await;

    let err = users.update_by_id("", json!({})).await.unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::MissingId));

    let err = users.update_by_id("ghost", json!({})).await.unwrap_err();
    assert_eq!(
        err.as_domain(),
        Some(&DomainError::NotFound("ghost".to_string()))
    );
}

// ── Remove ───────────────────────────────────────────────────────

#[tokio::test]
async fn remove_returns_last_state() {
    let (_, users) = setup().await;
    let ids = seed(&users).await;

    let removed = users.remove(&ids[1]).await.unwrap();
    assert_eq!(removed.get_str("email"), Some("bob@test.org"));
    assert!(users.get(&ids[1]).await.unwrap().is_none());
    assert_eq!(users.count().await.unwrap(), 2);
}

#[tokio::test]
async fn remove_of_unknown_id_fails() {
    let (_, users) = setup().await;

    let err = users.remove_by_id("ghost").await.unwrap_err();
    assert_eq!(err.to_string(), "ID `ghost` does not exist");

    let err = users.remove("").await.unwrap_err();
    assert_eq!(err.as_domain(), Some(&DomainError::MissingId));
}

// ── Reads ────────────────────────────────────────────────────────

#[tokio::test]
async fn get_of_unknown_id_is_none() {
    let (_, users) = setup().await;
    assert!(users.find_by_id("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn get_propagates_store_failures() {
    let (store, users) = setup().await;
    store.fail_operation(Operation::GetRecord, "offline");

    let err = users.get("any").await.unwrap_err();
    assert!(matches!(err, ModelError::Store(StoreError::Backend(_))));
}

#[tokio::test]
async fn find_by_equality() {
    let (_, users) = setup().await;
    seed(&users).await;

    let found = users
        .find(json!({ "age": 30 }), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_str("name.first"), Some("Bob"));

    let nested = users
        .find(Filter::new().eq("name.last", "Moe"), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(ages(&nested), vec![40.0]);
}

#[tokio::test]
async fn find_by_range() {
    let (_, users) = setup().await;
    seed(&users).await;

    let mut found = users
        .find(
            Filter::new().range("age", Some(Value::from(25)), None),
            FindOptions::default(),
        )
        .await
        .unwrap();
    users.sort_documents(&mut found, "age", SortOrder::Ascending);
    assert_eq!(ages(&found), vec![30.0, 40.0]);
}

#[tokio::test]
async fn find_by_date_compares_wire_form() {
    let (_, users) = setup().await;
    let joined = Utc.with_ymd_and_hms(2019, 9, 9, 9, 9, 9).unwrap();
    users
        .save(json!({ "_id": "d1", "joined": "2019-09-09T09:09:09Z" }))
        .await
        .unwrap();
    users.save(json!({ "_id": "d2" })).await.unwrap();

    let found = users
        .find(Filter::new().eq("joined", joined), FindOptions::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id(), Some("d1"));
}

#[tokio::test]
async fn find_with_pattern_filters_client_side() {
    let (_, users) = setup().await;
    seed(&users).await;

    let found = users
        .find(
            Filter::new().pattern("email", Regex::new(r"@example\.com$").unwrap()),
            FindOptions::default(),
        )
        .await
        .unwrap();
    let mut emails: Vec<_> = found
        .iter()
        .filter_map(|d| d.get_str("email"))
        .collect();
    emails.sort();
    assert_eq!(emails, vec!["ann@example.com", "cid@example.com"]);
}

#[tokio::test]
async fn find_pages_with_limit_and_skip() {
    let (_, users) = setup().await;
    seed(&users).await;

    let page = users
        .find(Filter::new(), FindOptions::new().limit(2))
        .await
        .unwrap();
    assert_eq!(page.len(), 2);

    let rest = users
        .find(Filter::new(), FindOptions::new().limit(2).skip(2))
        .await
        .unwrap();
    assert_eq!(rest.len(), 1);

    // Zero falls back to the default page size.
    let all = users
        .find(Filter::new(), FindOptions::new().limit(0))
        .await
        .unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn find_default_limit_is_ten() {
    let (_, users) = setup().await;
    let batch: Vec<_> = (0..12).map(|i| json!({ "age": i })).collect();
    users.save_many(batch).await.unwrap();

    let page = users.find(Filter::new(), FindOptions::default()).await.unwrap();
    assert_eq!(page.len(), 10);

    let all = users.find_all(Filter::new()).await.unwrap();
    assert_eq!(all.len(), 12);
}

#[tokio::test]
async fn find_one_returns_first_match_or_none() {
    let (_, users) = setup().await;
    seed(&users).await;

    let one = users.find_one(json!({ "age": 40 })).await.unwrap().unwrap();
    assert_eq!(one.get_str("name.first"), Some("Cid"));
    assert!(users.find_one(json!({ "age": 99 })).await.unwrap().is_none());
}

// ── Bulk deletes ─────────────────────────────────────────────────

#[tokio::test]
async fn find_and_remove_deletes_matches() {
    let (_, users) = setup().await;
    seed(&users).await;

    let deleted = users.find_and_remove(json!({ "age": 20 })).await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(users.count().await.unwrap(), 2);
}

#[tokio::test]
async fn find_and_remove_rejects_patterns() {
    let (_, users) = setup().await;
    let err = users
        .find_and_remove(Filter::new().pattern("email", Regex::new("x").unwrap()))
        .await
        .unwrap_err();
    assert_eq!(
        err.as_domain(),
        Some(&DomainError::UnsupportedFilter("email".to_string()))
    );
}

#[tokio::test]
async fn drop_all_empties_the_model() {
    let (_, users) = setup().await;
    seed(&users).await;

    assert_eq!(users.drop_all().await.unwrap(), 3);
    assert_eq!(users.count().await.unwrap(), 0);
}

#[tokio::test]
async fn delete_mapping_of_unused_model_does_not_fail() {
    let (store, users) = setup().await;
    users.delete_mapping().await;
    assert!(store.operations().contains(&Operation::DeleteMapping));
}

// ── Events ───────────────────────────────────────────────────────

#[tokio::test]
async fn writes_broadcast_events() {
    let (_, users) = setup().await;
    let mut rx = users.subscribe();

    users.save(json!({ "_id": "e1", "age": 5 })).await.unwrap();
    users.update_by_id("e1", json!({ "age": 6 })).await.unwrap();
    users.remove("e1").await.unwrap();

    let names: Vec<_> = (0..3).map(|_| rx.try_recv().unwrap()).collect();
    assert_eq!(
        names.iter().map(ModelEvent::name).collect::<Vec<_>>(),
        vec!["insert", "update", "remove"]
    );
    assert_eq!(names[1].document().get_number("age"), Some(6.0));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn failed_write_broadcasts_nothing() {
    let (store, users) = setup().await;
    let mut rx = users.subscribe();
    store.fail_operation(Operation::IndexRecord, "nope");

    assert!(users.save(json!({})).await.is_err());
    assert!(rx.try_recv().is_err());
}

// ── Statics and sorting ──────────────────────────────────────────

#[tokio::test]
async fn statics_receive_the_model() {
    let (_, users) = setup().await;
    assert_eq!(
        users.call_static("category", &[]).unwrap(),
        Value::from("user")
    );

    let err = users.call_static("missing", &[]).unwrap_err();
    assert_eq!(
        err.as_domain(),
        Some(&DomainError::UnknownStatic("missing".to_string()))
    );
}

#[tokio::test]
async fn sort_documents_by_path() {
    let (_, users) = setup().await;
    let mut docs = vec![
        users.new_document(json!({ "age": 30 })).unwrap(),
        users.new_document(json!({ "age": 10 })).unwrap(),
        users.new_document(json!({ "age": 20 })).unwrap(),
    ];

    users.sort_documents(&mut docs, "age", SortOrder::Descending);
    assert_eq!(ages(&docs), vec![30.0, 20.0, 10.0]);

    users.sort_documents(&mut docs, "age", SortOrder::Ascending);
    assert_eq!(ages(&docs), vec![10.0, 20.0, 30.0]);
}
