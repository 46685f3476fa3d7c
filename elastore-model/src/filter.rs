//! Find filters and their translation into store queries.
//!
//! Equality and range conditions go to the store as terms, with values
//! exported through the path's schema type (so dates are compared in their
//! wire form). Pattern conditions cannot be expressed as terms; they are
//! evaluated on the returned documents through the path type's `matches`.

use crate::schema::Schema;
use crate::types::Matcher;
use elastore_store::{Query, Term};
use elastore_types::{Record, Value};
use regex::Regex;

/// One condition on a path.
#[derive(Debug, Clone)]
pub enum FilterCondition {
    Equals(Value),
    /// Inclusive bounds; either may be open.
    Range {
        gte: Option<Value>,
        lte: Option<Value>,
    },
    Pattern(Regex),
}

/// A conjunction of path conditions. Empty matches every document.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conditions: Vec<(String, FilterCondition)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push((path.into(), FilterCondition::Equals(value.into())));
        self
    }

    pub fn range(mut self, path: impl Into<String>, gte: Option<Value>, lte: Option<Value>) -> Self {
        self.conditions
            .push((path.into(), FilterCondition::Range { gte, lte }));
        self
    }

    pub fn pattern(mut self, path: impl Into<String>, pattern: Regex) -> Self {
        self.conditions
            .push((path.into(), FilterCondition::Pattern(pattern)));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> &[(String, FilterCondition)] {
        &self.conditions
    }

    /// Splits the filter into a store query and the conditions that must be
    /// checked on returned documents.
    pub(crate) fn plan(&self, schema: &Schema) -> FilterPlan {
        let mut terms = Vec::new();
        let mut client = Vec::new();

        for (path, condition) in &self.conditions {
            match condition {
                FilterCondition::Equals(value) => {
                    terms.push(Term::equals(path.clone(), wire(schema, path, value)));
                }
                FilterCondition::Range { gte, lte } => terms.push(Term::range(
                    path.clone(),
                    gte.as_ref().map(|v| wire(schema, path, v)),
                    lte.as_ref().map(|v| wire(schema, path, v)),
                )),
                FilterCondition::Pattern(pattern) => {
                    client.push((path.clone(), Matcher::Pattern(pattern.clone())));
                }
            }
        }

        FilterPlan {
            query: Query::from_terms(terms),
            client,
        }
    }
}

/// Top-level keys of a JSON object become equality conditions; anything
/// other than an object is an empty filter.
impl From<serde_json::Value> for Filter {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(map) => map
                .into_iter()
                .fold(Filter::new(), |filter, (k, v)| filter.eq(k, Value::from_json(v))),
            _ => Filter::new(),
        }
    }
}

impl From<Record> for Filter {
    fn from(record: Record) -> Self {
        record
            .into_iter()
            .fold(Filter::new(), |filter, (k, v)| filter.eq(k, v))
    }
}

pub(crate) struct FilterPlan {
    pub query: Query,
    pub client: Vec<(String, Matcher)>,
}

fn wire(schema: &Schema, path: &str, value: &Value) -> serde_json::Value {
    schema
        .type_of(path)
        .and_then(|t| t.value(Some(value.clone()), &Record::new()))
        .unwrap_or_else(|| value.clone())
        .to_json()
}

/// Options for `Model::find`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Page size; `None` or zero means the configured default.
    pub limit: Option<usize>,
    pub skip: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }
}

/// Direction for `Model::sort_documents`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}
