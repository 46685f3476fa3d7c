use chrono::{TimeZone, Utc};
use elastore_types::{Record, Value};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::cmp::Ordering;

// ── JSON conversion ──────────────────────────────────────────────

#[test]
fn from_json_keeps_structure() {
    let value = Value::from_json(json!({"name": "John", "tags": ["a", "b"], "age": 20}));
    let map = value.as_object().unwrap();

    assert_eq!(map.get("name"), Some(&Value::from("John")));
    assert_eq!(map.get("age"), Some(&Value::Number(20.0)));
    assert_eq!(
        map.get("tags"),
        Some(&Value::Array(vec![Value::from("a"), Value::from("b")]))
    );
}

#[test]
fn from_json_never_infers_dates() {
    let value = Value::from_json(json!("2024-01-01T00:00:00.000Z"));
    assert_eq!(value, Value::from("2024-01-01T00:00:00.000Z"));
}

#[test]
fn integral_numbers_serialize_as_integers() {
    assert_eq!(Value::Number(20.0).to_json(), json!(20));
    assert_eq!(Value::Number(1.5).to_json(), json!(1.5));
}

#[test]
fn nan_serializes_as_null() {
    assert_eq!(Value::Number(f64::NAN).to_json(), json!(null));
}

#[test]
fn dates_serialize_as_iso_strings() {
    let date = Utc.with_ymd_and_hms(2014, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(Value::Date(date).to_json(), json!("2014-01-02T03:04:05.000Z"));
}

#[test]
fn record_from_json_rejects_non_objects() {
    assert!(Value::record_from_json(json!([1, 2])).is_err());
    assert!(Value::record_from_json(json!("x")).is_err());
}

#[test]
fn record_round_trips_through_json() {
    let wire = json!({"a": {"b": [1, "two", true, null]}});
    let record = Value::record_from_json(wire.clone()).unwrap();
    assert_eq!(Value::record_to_json(&record), wire);
}

// ── Natural string form ──────────────────────────────────────────

#[test]
fn display_matches_natural_string_form() {
    assert_eq!(Value::Number(1.0).to_string(), "1");
    assert_eq!(Value::Number(2.5).to_string(), "2.5");
    assert_eq!(Value::Number(f64::NAN).to_string(), "NaN");
    assert_eq!(Value::Bool(true).to_string(), "true");
    assert_eq!(
        Value::Array(vec![Value::from(1), Value::from("x")]).to_string(),
        "1,x"
    );
    assert_eq!(Value::Object(Record::new()).to_string(), "[object Object]");
}

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn total_cmp_ranks_variants() {
    assert_eq!(Value::Null.total_cmp(&Value::Bool(false)), Ordering::Less);
    assert_eq!(Value::Number(9.0).total_cmp(&Value::from("a")), Ordering::Less);
    assert_eq!(
        Value::Object(Record::new()).total_cmp(&Value::Array(vec![])),
        Ordering::Greater
    );
}

#[test]
fn total_cmp_arrays_break_ties_by_length() {
    let short = Value::Array(vec![Value::from(1)]);
    let long = Value::Array(vec![Value::from(1), Value::from(2)]);
    assert_eq!(short.total_cmp(&long), Ordering::Less);
    assert_eq!(long.total_cmp(&short), Ordering::Greater);
}
