use super::{Matcher, SchemaType, TypeOptions, TypeTag, check_required, is_absent, rejected};
use crate::error::ValidationError;
use elastore_types::{Record, Value};

/// Text. Non-string inputs are cast to their string form; `matches`
/// accepts regular expressions.
#[derive(Debug, Clone)]
pub struct StringType {
    name: String,
    options: TypeOptions,
}

impl StringType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
        }
    }
}

impl SchemaType for StringType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::String
    }

    fn cast(&self, value: Option<Value>, _data: &Record) -> Result<Option<Value>, ValidationError> {
        if is_absent(value.as_ref()) {
            return Ok(self.options.produce_default());
        }
        Ok(value.map(|v| match v {
            Value::String(_) => v,
            other => Value::String(other.to_string()),
        }))
    }

    fn validate(
        &self,
        value: Option<Value>,
        _data: &Record,
    ) -> Result<Option<Value>, ValidationError> {
        check_required(&self.name, &self.options, value.as_ref())?;
        match value {
            None | Some(Value::String(_)) => Ok(value),
            Some(other) => Err(rejected(&self.name, &other, "a string")),
        }
    }

    fn matches(&self, value: Option<&Value>, query: &Matcher, _data: &Record) -> bool {
        match query {
            Matcher::Pattern(pattern) => value
                .and_then(Value::as_str)
                .is_some_and(|s| pattern.is_match(s)),
            Matcher::Value(expected) => value == Some(expected),
        }
    }
}
