use super::{SchemaType, TypeOptions, TypeTag};
use elastore_types::{Record, Value};

/// A structural object; nested paths carry their own types. Defaults to an
/// empty object.
#[derive(Debug, Clone)]
pub struct ObjectType {
    name: String,
    options: TypeOptions,
}

impl ObjectType {
    pub fn new(name: &str, options: TypeOptions) -> Self {
        let options = if options.has_default() {
            options
        } else {
            options.default_with(|| Value::Object(Record::new()))
        };
        Self {
            name: name.to_string(),
            options,
        }
    }
}

impl SchemaType for ObjectType {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> &TypeOptions {
        &self.options
    }

    fn tag(&self) -> TypeTag {
        TypeTag::Object
    }
}
