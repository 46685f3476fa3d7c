use super::{
    Matcher, MixedType, SchemaType, TypeOptions, TypeTag, check_required, compare_presence,
    is_absent, rejected,
};
use crate::error::ValidationError;
use elastore_types::{Record, Value};
use std::cmp::Ordering;
use std::sync::Arc;

/// A list whose elements are processed by a child type. Scalars are
/// wrapped into one-element lists; the default is an empty list.
#[derive(Debug, Clone)]
pub struct ArrayType {
    name: String,
    options: TypeOptions,
    child: Arc<dyn SchemaType>,
}

impl ArrayType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        let child = options
            .child
            .clone()
            .unwrap_or_else(|| Arc::new(MixedType::new(name, TypeOptions::new())));
        let options = if options.has_default() {
            options
        } else {
            options.default_with(|| Value::Array(Vec::new()))
        };
        Self {
            name: name.to_string(),
            options,
            child,
        }
    }

    pub fn child(&self) -> &Arc<dyn SchemaType> {
        &self.child
    }

    fn map_items(
        &self,
        items: Vec<Value>,
        mut stage: impl FnMut(Value) -> Result<Option<Value>, ValidationError>,
    ) -> Result<Value, ValidationError> {
        items
            .into_iter()
            .map(|item| stage(item).map(|v| v.unwrap_or(Value::Null)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array)
    }
}

impl SchemaType for ArrayType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Array
    }

    fn cast(&self, value: Option<Value>, data: &Record) -> Result<Option<Value>, ValidationError> {
        if is_absent(value.as_ref()) {
            return Ok(self.options.produce_default());
        }
        let items = match value {
            Some(Value::Array(items)) => items,
            Some(other) => vec![other],
            None => return Ok(None),
        };
        self.map_items(items, |item| self.child.cast(Some(item), data))
            .map(Some)
    }

    fn validate(
        &self,
        value: Option<Value>,
        data: &Record,
    ) -> Result<Option<Value>, ValidationError> {
        check_required(&self.name, &self.options, value.as_ref())?;
        match value {
            None => Ok(None),
            Some(Value::Array(items)) => self
                .map_items(items, |item| self.child.validate(Some(item), data))
                .map(Some),
            Some(other) => Err(rejected(&self.name, &other, "an array")),
        }
    }

    fn parse(&self, value: Option<Value>, data: &Record) -> Option<Value> {
        match value {
            Some(Value::Array(items)) => self
                .map_items(items, |item| Ok(self.child.parse(Some(item), data)))
                .ok(),
            other => other,
        }
    }

    fn value(&self, value: Option<Value>, data: &Record) -> Option<Value> {
        match value {
            Some(Value::Array(items)) => self
                .map_items(items, |item| Ok(self.child.value(Some(item), data)))
                .ok(),
            other => other,
        }
    }

    fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        compare_presence(a, b, |a, b| match (a, b) {
            (Value::Array(x), Value::Array(y)) => x
                .iter()
                .zip(y.iter())
                .map(|(l, r)| self.child.compare(Some(l), Some(r)))
                .find(|ord| ord.is_ne())
                .unwrap_or_else(|| x.len().cmp(&y.len())),
            _ => a.total_cmp(b),
        })
    }

    /// A scalar operand matches when any element matches it.
    fn matches(&self, value: Option<&Value>, query: &Matcher, data: &Record) -> bool {
        match (value, query) {
            (Some(Value::Array(items)), Matcher::Value(expected)) if !matches!(expected, Value::Array(_)) => {
                items
                    .iter()
                    .any(|item| self.child.matches(Some(item), query, data))
            }
            (Some(Value::Array(items)), Matcher::Pattern(_)) => items
                .iter()
                .any(|item| self.child.matches(Some(item), query, data)),
            (value, Matcher::Value(expected)) => value == Some(expected),
            (_, Matcher::Pattern(_)) => false,
        }
    }
}
