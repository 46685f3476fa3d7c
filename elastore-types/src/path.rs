//! Dotted-path access into records (`"name.first"`).
//!
//! Intermediate segments must be objects. `set_path` replaces any
//! non-object intermediate with an empty object before descending.

use crate::{Record, Value};

/// Returns the value stored at `path`, if every segment resolves.
pub fn get_path<'a>(record: &'a Record, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = record.get(segments.next()?)?;

    for segment in segments {
        match current {
            Value::Object(map) => current = map.get(segment)?,
            _ => return None,
        }
    }

    Some(current)
}

/// Writes `value` at `path`, creating intermediate objects as needed.
pub fn set_path(record: &mut Record, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    set_in(record, &segments, value);
}

fn set_in(map: &mut Record, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let slot = map
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Record::new()));

            if let Value::Object(child) = slot {
                set_in(child, rest, value);
            } else {
                let mut child = Record::new();
                set_in(&mut child, rest, value);
                *slot = Value::Object(child);
            }
        }
    }
}

/// Removes and returns the value at `path`. Missing segments are a no-op.
pub fn delete_path(record: &mut Record, path: &str) -> Option<Value> {
    let segments: Vec<&str> = path.split('.').collect();
    delete_in(record, &segments)
}

fn delete_in(map: &mut Record, segments: &[&str]) -> Option<Value> {
    match segments {
        [] => None,
        [last] => map.remove(*last),
        [head, rest @ ..] => match map.get_mut(*head)? {
            Value::Object(child) => delete_in(child, rest),
            _ => None,
        },
    }
}
