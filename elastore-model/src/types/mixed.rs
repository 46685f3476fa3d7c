use super::{SchemaType, TypeOptions, TypeTag};

/// Accepts any value unchanged. Used for untyped array elements and as the
/// base behavior custom types start from.
#[derive(Debug, Clone)]
pub struct MixedType {
    name: String,
    options: TypeOptions,
}

impl MixedType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        Self {
            name: name.to_string(),
            options,
        }
    }
}

impl SchemaType for MixedType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Mixed
    }
}
