use super::{SchemaType, TypeOptions, TypeTag, check_required};
use crate::error::ValidationError;
use elastore_types::{Record, Value};

/// A value restricted to a fixed set.
#[derive(Debug, Clone)]
pub struct EnumType {
    name: String,
    options: TypeOptions,
}

impl EnumType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
        }
    }

    pub fn allowed(&self) -> &[Value] {
        self.options.values.as_deref().unwrap_or_default()
    }
}

impl SchemaType for EnumType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Enum
    }

    fn validate(
        &self,
        value: Option<Value>,
        _data: &Record,
    ) -> Result<Option<Value>, ValidationError> {
        check_required(&self.name, &self.options, value.as_ref())?;
        match &value {
            Some(v) if !v.is_null() && !self.allowed().contains(v) => {
                let allowed: Vec<String> = self.allowed().iter().map(Value::to_string).collect();
                Err(ValidationError::new(
                    &self.name,
                    format!("`{v}` is not one of [{}]!", allowed.join(", ")),
                ))
            }
            _ => Ok(value),
        }
    }
}
