use super::{SchemaType, TypeOptions, TypeTag, check_required, is_absent, rejected};
use crate::error::ValidationError;
use elastore_types::{Record, Value};

/// Booleans. `"true"`/`"false"` and numbers are cast; other strings are
/// left for `validate` to reject.
#[derive(Debug, Clone)]
pub struct BooleanType {
    name: String,
    options: TypeOptions,
}

impl BooleanType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
        }
    }
}

impl SchemaType for BooleanType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Boolean
    }

    fn cast(&self, value: Option<Value>, _data: &Record) -> Result<Option<Value>, ValidationError> {
        if is_absent(value.as_ref()) {
            return Ok(self.options.produce_default());
        }
        Ok(value.map(|v| match v {
            Value::Number(n) => Value::Bool(n != 0.0 && !n.is_nan()),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Value::Bool(true),
                "false" | "0" | "" => Value::Bool(false),
                _ => Value::String(s),
            },
            other => other,
        }))
    }

    fn validate(
        &self,
        value: Option<Value>,
        _data: &Record,
    ) -> Result<Option<Value>, ValidationError> {
        check_required(&self.name, &self.options, value.as_ref())?;
        match value {
            None | Some(Value::Bool(_)) => Ok(value),
            Some(other) => Err(rejected(&self.name, &other, "a boolean")),
        }
    }
}
