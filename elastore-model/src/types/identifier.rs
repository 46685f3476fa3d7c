use super::{SchemaType, TypeOptions, TypeTag, check_required, is_absent, rejected};
use crate::error::ValidationError;
use elastore_types::{Record, Value, generate_id};

/// Document identifiers. Absent values receive a freshly generated,
/// time-ordered id.
#[derive(Debug, Clone)]
pub struct IdentifierType {
    name: String,
    options: TypeOptions,
}

impl IdentifierType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        let options = if options.has_default() {
            options
        } else {
            options.default_with(|| Value::String(generate_id()))
        };
        Self {
            name: name.to_string(),
            options,
        }
    }
}

impl SchemaType for IdentifierType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Identifier
    }

    fn cast(&self, value: Option<Value>, _data: &Record) -> Result<Option<Value>, ValidationError> {
        if is_absent(value.as_ref()) {
            return Ok(self.options.produce_default());
        }
        Ok(value.map(|v| match v {
            Value::Number(_) => Value::String(v.to_string()),
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
            Some(Value::String(ref s)) if s.is_empty() => Err(ValidationError::new(
                &self.name,
                format!("`{}` must not be empty!", self.name),
            )),
            None | Some(Value::String(_)) => Ok(value),
            Some(other) => Err(rejected(&self.name, &other, "a valid identifier")),
        }
    }
}
