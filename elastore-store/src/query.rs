//! Simple conjunctive term queries.
//!
//! Only what the model layer can express: match-everything, or a list of
//! per-field equality/range conditions that must all hold.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Query {
    /// Every record of the category.
    MatchAll,
    /// Records satisfying every term.
    Filter(Vec<Term>),
}

/// One field condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Dotted field path (e.g. "name.first").
    pub field: String,
    pub condition: Condition,
}

/// The test applied to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Field equals the value. Array fields match when any element does.
    Equals(serde_json::Value),
    /// Field lies within the inclusive bounds.
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<serde_json::Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<serde_json::Value>,
    },
}

impl Term {
    /// Shorthand for an equality term.
    pub fn equals(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            field: field.into(),
            condition: Condition::Equals(value),
        }
    }

    /// Shorthand for a range term.
    pub fn range(
        field: impl Into<String>,
        gte: Option<serde_json::Value>,
        lte: Option<serde_json::Value>,
    ) -> Self {
        Self {
            field: field.into(),
            condition: Condition::Range { gte, lte },
        }
    }

    fn matches(&self, source: &serde_json::Value) -> bool {
        let Some(field) = lookup(source, &self.field) else {
            return false;
        };

        match &self.condition {
            Condition::Equals(expected) => match field {
                serde_json::Value::Array(items) if !expected.is_array() => {
                    items.iter().any(|item| item == expected)
                }
                other => other == expected,
            },
            Condition::Range { gte, lte } => {
                let above = gte
                    .as_ref()
                    .is_none_or(|bound| compare(field, bound).is_some_and(Ordering::is_ge));
                let below = lte
                    .as_ref()
                    .is_none_or(|bound| compare(field, bound).is_some_and(Ordering::is_le));
                above && below
            }
        }
    }
}

impl Query {
    /// Builds a query from terms; no terms means match-everything.
    pub fn from_terms(terms: Vec<Term>) -> Self {
        if terms.is_empty() {
            Query::MatchAll
        } else {
            Query::Filter(terms)
        }
    }

    /// Evaluates the query against a stored body.
    pub fn matches(&self, source: &serde_json::Value) -> bool {
        match self {
            Query::MatchAll => true,
            Query::Filter(terms) => terms.iter().all(|term| term.matches(source)),
        }
    }
}

fn lookup<'a>(source: &'a serde_json::Value, path: &str) -> Option<&'a serde_json::Value> {
    path.split('.')
        .try_fold(source, |current, segment| current.as_object()?.get(segment))
}

/// Numbers compare numerically, strings lexicographically (ISO dates sort
/// correctly this way); anything else is incomparable.
fn compare(a: &serde_json::Value, b: &serde_json::Value) -> Option<Ordering> {
    match (a, b) {
        (serde_json::Value::Number(x), serde_json::Value::Number(y)) => {
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (serde_json::Value::String(x), serde_json::Value::String(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
