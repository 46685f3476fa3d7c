use super::{SchemaType, TypeOptions, TypeTag, check_required, is_absent, rejected};
use crate::error::ValidationError;
use elastore_types::{Record, Value};

/// Numbers. Casting follows numeric coercion: `"1"` becomes 1, booleans
/// become 0/1, dates their epoch milliseconds, and anything unparsable NaN
/// (which `validate` then rejects).
#[derive(Debug, Clone)]
pub struct NumberType {
    name: String,
    options: TypeOptions,
}

impl NumberType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
        }
    }
}

fn coerce(value: Value) -> f64 {
    match value {
        Value::Number(n) => n,
        Value::Bool(b) => f64::from(u8::from(b)),
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Date(d) => d.timestamp_millis() as f64,
        Value::Null => 0.0,
        Value::Array(_) | Value::Object(_) => f64::NAN,
    }
}

impl SchemaType for NumberType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Number
    }

    fn cast(&self, value: Option<Value>, _data: &Record) -> Result<Option<Value>, ValidationError> {
        if is_absent(value.as_ref()) {
            return Ok(self.options.produce_default());
        }
        Ok(value.map(|v| Value::Number(coerce(v))))
    }

    fn validate(
        &self,
        value: Option<Value>,
        _data: &Record,
    ) -> Result<Option<Value>, ValidationError> {
        check_required(&self.name, &self.options, value.as_ref())?;
        match value {
            Some(Value::Number(n)) if n.is_nan() => {
                Err(rejected(&self.name, &Value::Number(n), "a number"))
            }
            None | Some(Value::Number(_)) => Ok(value),
            Some(other) => Err(rejected(&self.name, &other, "a number")),
        }
    }
}
