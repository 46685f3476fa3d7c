//! Schema types: the per-path value pipeline.
//!
//! Every path in a schema is bound to a [`SchemaType`]. A type owns five
//! transformations, each applied by the schema to the whole record:
//!
//! | Stage      | When                         | Method     |
//! |------------|------------------------------|------------|
//! | getter     | building a document          | `cast`     |
//! | setter     | before persisting            | `validate` |
//! | import     | reading from the store       | `parse`    |
//! | export     | writing to the store         | `value`    |
//!
//! plus `compare` for sorting and `matches` for filtering.
//!
//! The trait is open: applications implement it to add their own types and
//! register them with [`Descriptor::Type`](crate::Descriptor::Type).

mod array;
mod boolean;
mod date;
mod enumeration;
mod identifier;
mod mixed;
mod number;
mod object;
mod string;
mod virtuals;

pub use array::ArrayType;
pub use boolean::BooleanType;
pub use date::DateType;
pub use enumeration::EnumType;
pub use identifier::IdentifierType;
pub use mixed::MixedType;
pub use number::NumberType;
pub use object::ObjectType;
pub use string::StringType;
pub use virtuals::{VirtualGetter, VirtualType};

use crate::error::ValidationError;
use elastore_types::{Record, Value};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Produces a fresh default value each time it is called.
pub type DefaultFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// A filter operand for [`SchemaType::matches`].
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Equality against a concrete value.
    Value(Value),
    /// Regular-expression test (String paths).
    Pattern(Regex),
}

/// The built-in type families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    Date,
    Array,
    Object,
    Enum,
    Identifier,
    Mixed,
    Virtual,
}

impl TypeTag {
    /// Builds a type of this family for `name`.
    pub fn instantiate(self, name: &str, options: TypeOptions) -> Arc<dyn SchemaType> {
        match self {
            TypeTag::String => Arc::new(StringType::new(name, options)),
            TypeTag::Number => Arc::new(NumberType::new(name, options)),
            TypeTag::Boolean => Arc::new(BooleanType::new(name, options)),
            TypeTag::Date => Arc::new(DateType::new(name, options)),
            TypeTag::Array => Arc::new(ArrayType::new(name, options)),
            TypeTag::Object => Arc::new(ObjectType::new(name, options)),
            TypeTag::Enum => Arc::new(EnumType::new(name, options)),
            TypeTag::Identifier => Arc::new(IdentifierType::new(name, options)),
            TypeTag::Mixed => Arc::new(MixedType::new(name, options)),
            TypeTag::Virtual => Arc::new(VirtualType::new(name, None)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TypeTag::String => "String",
            TypeTag::Number => "Number",
            TypeTag::Boolean => "Boolean",
            TypeTag::Date => "Date",
            TypeTag::Array => "Array",
            TypeTag::Object => "Object",
            TypeTag::Enum => "Enum",
            TypeTag::Identifier => "Identifier",
            TypeTag::Mixed => "Mixed",
            TypeTag::Virtual => "Virtual",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "String" => Ok(TypeTag::String),
            "Number" => Ok(TypeTag::Number),
            "Boolean" => Ok(TypeTag::Boolean),
            "Date" => Ok(TypeTag::Date),
            "Array" => Ok(TypeTag::Array),
            "Object" => Ok(TypeTag::Object),
            "Enum" => Ok(TypeTag::Enum),
            "Identifier" | "ID" => Ok(TypeTag::Identifier),
            "Mixed" => Ok(TypeTag::Mixed),
            "Virtual" => Ok(TypeTag::Virtual),
            other => Err(format!("unknown type `{other}`")),
        }
    }
}

/// Options shared by every schema type.
#[derive(Clone, Default)]
pub struct TypeOptions {
    pub required: bool,
    /// Always a producer; literal defaults are wrapped on the way in.
    pub default: Option<DefaultFn>,
    /// Element type of an Array path.
    pub child: Option<Arc<dyn SchemaType>>,
    /// Allowed values of an Enum path.
    pub values: Option<Vec<Value>>,
}

impl TypeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// A literal default; every document receives its own copy.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.default = Some(Arc::new(move || value.clone()));
        self
    }

    /// A computed default, evaluated once per document.
    pub fn default_with<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(Arc::new(producer));
        self
    }

    pub fn child(mut self, child: Arc<dyn SchemaType>) -> Self {
        self.child = Some(child);
        self
    }

    pub fn values(mut self, values: Vec<Value>) -> Self {
        self.values = Some(values);
        self
    }

    /// Runs the default producer, if any.
    pub fn produce_default(&self) -> Option<Value> {
        self.default.as_ref().map(|producer| producer())
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

impl fmt::Debug for TypeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeOptions")
            .field("required", &self.required)
            .field("default", &self.default.as_ref().map(|_| "<fn>"))
            .field("child", &self.child.as_ref().map(|c| c.tag()))
            .field("values", &self.values)
            .finish()
    }
}

/// Absent means missing or explicitly null.
pub fn is_absent(value: Option<&Value>) -> bool {
    matches!(value, None | Some(Value::Null))
}

/// Absent values sort before present ones; two absent values are equal.
pub fn compare_presence(
    a: Option<&Value>,
    b: Option<&Value>,
    present: impl FnOnce(&Value, &Value) -> Ordering,
) -> Ordering {
    match (a.filter(|v| !v.is_null()), b.filter(|v| !v.is_null())) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => present(a, b),
    }
}

/// A value type bound to one schema path.
///
/// `data` is always the whole record being processed, so types can derive
/// values from sibling paths. Returning `None` from `cast` leaves the path
/// untouched; returning `None` from the other stages removes it.
pub trait SchemaType: Send + Sync + fmt::Debug {
    /// The path this type is bound to.
    fn name(&self) -> &str;

    fn options(&self) -> &TypeOptions;

    fn tag(&self) -> TypeTag;

    /// Getter stage. Substitutes the default for absent values.
    fn cast(&self, value: Option<Value>, data: &Record) -> Result<Option<Value>, ValidationError> {
        let _ = data;
        if is_absent(value.as_ref()) {
            Ok(self.options().produce_default())
        } else {
            Ok(value)
        }
    }

    /// Setter stage. Enforces `required`.
    fn validate(
        &self,
        value: Option<Value>,
        data: &Record,
    ) -> Result<Option<Value>, ValidationError> {
        let _ = data;
        check_required(self.name(), self.options(), value.as_ref())?;
        Ok(value)
    }

    /// Import stage.
    fn parse(&self, value: Option<Value>, data: &Record) -> Option<Value> {
        let _ = data;
        value
    }

    /// Export stage.
    fn value(&self, value: Option<Value>, data: &Record) -> Option<Value> {
        let _ = data;
        value
    }

    fn compare(&self, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        compare_presence(a, b, Value::total_cmp)
    }

    fn matches(&self, value: Option<&Value>, query: &Matcher, data: &Record) -> bool {
        let _ = data;
        match query {
            Matcher::Value(expected) => value == Some(expected),
            Matcher::Pattern(_) => false,
        }
    }
}

/// Fails when a required path is absent.
pub(crate) fn check_required(
    name: &str,
    options: &TypeOptions,
    value: Option<&Value>,
) -> Result<(), ValidationError> {
    if options.required && is_absent(value) {
        return Err(ValidationError::new(name, format!("`{name}` is required!")));
    }
    Ok(())
}

/// Shared error for a value of the wrong kind.
pub(crate) fn rejected(name: &str, value: &Value, what: &str) -> ValidationError {
    ValidationError::new(name, format!("`{value}` is not {what}!"))
}
