//! Schema definition and the whole-record pipelines.
//!
//! A [`Schema`] maps dotted paths to [`SchemaType`]s in registration order.
//! Shapes are described with [`Descriptor`]s, either built in code through
//! [`Shape`] or read from JSON with [`Schema::from_json`]:
//!
//! ```json
//! { "name": { "first": "String", "last": "String" },
//!   "age": { "type": "Number", "required": true },
//!   "tags": ["String"] }
//! ```
//!
//! Registration rules:
//! - a type or type tag registers that type
//! - `{ type, required, default, values, child }` registers the type with options
//! - an array registers an Array whose element type is the first entry
//!   (Mixed when empty)
//! - any other object registers a structural Object, then each nested key
//!   under `parent.key`
//!
//! Registering a path again replaces its type in place.

use crate::document::Document;
use crate::error::{ModelResult, SchemaError, SchemaResult, ValidationError};
use crate::hooks::{Hook, HookKind, HookPhase};
use crate::model::Model;
use crate::types::{
    ArrayType, IdentifierType, Matcher, MixedType, ObjectType, SchemaType, TypeOptions, TypeTag,
    VirtualType, compare_presence,
};
use elastore_types::{Record, Value, delete_path, get_path, set_path};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Path of the document identifier.
pub const ID_PATH: &str = "_id";

/// An instance method: called with the document and arguments.
pub type InstanceMethod = Arc<dyn Fn(&Document, &[Value]) -> ModelResult<Value> + Send + Sync>;

/// A static method: called with the model and arguments.
pub type StaticMethod = Arc<dyn Fn(&Model, &[Value]) -> ModelResult<Value> + Send + Sync>;

/// How one path (or subtree) is declared.
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// A ready-made type, including custom [`SchemaType`] implementations.
    Type(Arc<dyn SchemaType>),
    Tag(TypeTag),
    Typed(TypeTag, TypeOptions),
    /// Array of the first descriptor's type.
    Array(Vec<Descriptor>),
    Nested(Shape),
}

impl Descriptor {
    pub fn typed(tag: TypeTag, options: TypeOptions) -> Self {
        Descriptor::Typed(tag, options)
    }

    pub fn array_of(element: impl Into<Descriptor>) -> Self {
        Descriptor::Array(vec![element.into()])
    }
}

impl From<TypeTag> for Descriptor {
    fn from(tag: TypeTag) -> Self {
        Descriptor::Tag(tag)
    }
}

impl From<(TypeTag, TypeOptions)> for Descriptor {
    fn from((tag, options): (TypeTag, TypeOptions)) -> Self {
        Descriptor::Typed(tag, options)
    }
}

impl From<Arc<dyn SchemaType>> for Descriptor {
    fn from(schema_type: Arc<dyn SchemaType>) -> Self {
        Descriptor::Type(schema_type)
    }
}

impl From<Vec<Descriptor>> for Descriptor {
    fn from(items: Vec<Descriptor>) -> Self {
        Descriptor::Array(items)
    }
}

impl From<Shape> for Descriptor {
    fn from(shape: Shape) -> Self {
        Descriptor::Nested(shape)
    }
}

/// An ordered set of field declarations.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    fields: Vec<(String, Descriptor)>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, descriptor: impl Into<Descriptor>) -> Self {
        self.fields.push((name.into(), descriptor.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Path types, methods, statics and hooks of one model.
#[derive(Clone, Default)]
pub struct Schema {
    paths: Vec<(String, Arc<dyn SchemaType>)>,
    index: HashMap<String, usize>,
    methods: HashMap<String, InstanceMethod>,
    statics: HashMap<String, StaticMethod>,
    hooks: Vec<(HookPhase, HookKind, Hook)>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shape(shape: Shape) -> SchemaResult<Self> {
        let mut schema = Self::new();
        schema.add(shape, "")?;
        Ok(schema)
    }

    /// Builds a schema from a JSON shape.
    pub fn from_json(json: &serde_json::Value) -> SchemaResult<Self> {
        let serde_json::Value::Object(map) = json else {
            return Err(SchemaError::InvalidShape);
        };
        let mut shape = Shape::new();
        for (key, value) in map {
            shape = shape.field(key.clone(), descriptor_from_json(key, value)?);
        }
        Self::from_shape(shape)
    }

    /// Registers every field of `shape` under `prefix`.
    pub fn add(&mut self, shape: Shape, prefix: &str) -> SchemaResult<()> {
        for (key, descriptor) in shape.fields {
            self.path(&format!("{prefix}{key}"), descriptor)?;
        }
        Ok(())
    }

    /// Registers one path.
    pub fn path(&mut self, name: &str, descriptor: impl Into<Descriptor>) -> SchemaResult<()> {
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(SchemaError::InvalidPath {
                path: name.to_string(),
                reason: "path segments must not be empty".to_string(),
            });
        }

        match descriptor.into() {
            Descriptor::Nested(shape) => {
                self.ensure_object(name);
                self.add(shape, &format!("{name}."))
            }
            other => {
                let schema_type = resolve_type(name, &other)?;
                self.register(name, schema_type);
                Ok(())
            }
        }
    }

    /// Registers a computed, never-persisted path.
    pub fn virtual_path<F>(&mut self, name: &str, getter: F) -> SchemaResult<()>
    where
        F: Fn(&Record) -> Option<Value> + Send + Sync + 'static,
    {
        self.path(name, Descriptor::Type(Arc::new(VirtualType::new(name, Some(Arc::new(getter))))))
    }

    /// Adds a hook that runs before `kind` ("save" or "remove").
    pub fn pre(&mut self, kind: &str, hook: Hook) -> SchemaResult<()> {
        let kind = kind.parse()?;
        self.hooks.push((HookPhase::Pre, kind, hook));
        Ok(())
    }

    /// Adds a hook that runs after `kind` ("save" or "remove").
    pub fn post(&mut self, kind: &str, hook: Hook) -> SchemaResult<()> {
        let kind = kind.parse()?;
        self.hooks.push((HookPhase::Post, kind, hook));
        Ok(())
    }

    pub fn method<F>(&mut self, name: &str, f: F) -> SchemaResult<()>
    where
        F: Fn(&Document, &[Value]) -> ModelResult<Value> + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(SchemaError::EmptyMethodName);
        }
        self.methods.insert(name.to_string(), Arc::new(f));
        Ok(())
    }

    pub fn static_method<F>(&mut self, name: &str, f: F) -> SchemaResult<()>
    where
        F: Fn(&Model, &[Value]) -> ModelResult<Value> + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(SchemaError::EmptyMethodName);
        }
        self.statics.insert(name.to_string(), Arc::new(f));
        Ok(())
    }

    /// Registers `_id` as a generated identifier unless already declared.
    pub fn ensure_identifier(&mut self) {
        if !self.index.contains_key(ID_PATH) {
            self.register(
                ID_PATH,
                Arc::new(IdentifierType::new(ID_PATH, TypeOptions::new().required(true))),
            );
        }
    }

    /// The type registered at `name`.
    pub fn type_of(&self, name: &str) -> Option<&Arc<dyn SchemaType>> {
        self.index.get(name).map(|&i| &self.paths[i].1)
    }

    pub fn is_virtual(&self, name: &str) -> bool {
        self.type_of(name)
            .is_some_and(|t| t.tag() == TypeTag::Virtual)
    }

    /// Registered paths in registration order.
    pub fn paths(&self) -> impl Iterator<Item = (&str, &Arc<dyn SchemaType>)> {
        self.paths.iter().map(|(name, t)| (name.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn instance_method(&self, name: &str) -> Option<&InstanceMethod> {
        self.methods.get(name)
    }

    pub fn static_fn(&self, name: &str) -> Option<&StaticMethod> {
        self.statics.get(name)
    }

    /// Hooks declared for one phase and operation, in declaration order.
    pub fn hooks(&self, phase: HookPhase, kind: HookKind) -> impl Iterator<Item = &Hook> {
        self.hooks
            .iter()
            .filter(move |(p, k, _)| *p == phase && *k == kind)
            .map(|(_, _, hook)| hook)
    }

    /// First required path that is absent from `data`.
    pub fn missing_required(&self, data: &Record) -> Option<&str> {
        self.paths
            .iter()
            .find(|(name, t)| {
                t.options().required
                    && matches!(get_path(data, name), None | Some(Value::Null))
            })
            .map(|(name, _)| name.as_str())
    }

    // ── Pipelines ───────────────────────────────────────────────────

    /// Getter stage: casts and fills defaults. Paths whose cast yields
    /// nothing are left untouched.
    pub fn apply_getters(&self, data: &mut Record) -> Result<(), ValidationError> {
        for (name, schema_type) in &self.paths {
            let current = get_path(data, name).cloned();
            if let Some(value) = schema_type.cast(current, data)? {
                set_path(data, name, value);
            }
        }
        Ok(())
    }

    /// Setter stage: validates every path, stopping at the first failure.
    pub fn apply_setters(&self, data: &mut Record) -> Result<(), ValidationError> {
        for (name, schema_type) in &self.paths {
            let current = get_path(data, name).cloned();
            let result = schema_type.validate(current, data)?;
            write_back(data, name, result);
        }
        Ok(())
    }

    /// Casts then validates only the paths present in a partial update.
    /// Virtual paths are dropped.
    pub fn apply_partial(&self, data: &mut Record) -> Result<(), ValidationError> {
        for (name, schema_type) in &self.paths {
            if schema_type.tag() == TypeTag::Virtual {
                delete_path(data, name);
                continue;
            }
            let Some(current) = get_path(data, name).cloned() else {
                continue;
            };
            let cast = schema_type.cast(Some(current), data)?;
            let result = schema_type.validate(cast, data)?;
            write_back(data, name, result);
        }
        Ok(())
    }

    /// Import stage: wire values into in-memory values.
    pub fn apply_import(&self, data: &mut Record) {
        for (name, schema_type) in &self.paths {
            let current = get_path(data, name).cloned();
            let result = schema_type.parse(current, data);
            write_back(data, name, result);
        }
    }

    /// Export stage: in-memory values into wire values.
    pub fn apply_export(&self, data: &mut Record) {
        for (name, schema_type) in &self.paths {
            let current = get_path(data, name).cloned();
            let result = schema_type.value(current, data);
            write_back(data, name, result);
        }
    }

    /// Orders two values of `path` using its type.
    pub fn compare_path(&self, path: &str, a: Option<&Value>, b: Option<&Value>) -> Ordering {
        match self.type_of(path) {
            Some(schema_type) => schema_type.compare(a, b),
            None => compare_presence(a, b, Value::total_cmp),
        }
    }

    /// Tests a value of `path` against a matcher using its type.
    pub fn match_path(
        &self,
        path: &str,
        value: Option<&Value>,
        matcher: &Matcher,
        data: &Record,
    ) -> bool {
        match self.type_of(path) {
            Some(schema_type) => schema_type.matches(value, matcher, data),
            None => match matcher {
                Matcher::Value(expected) => value == Some(expected),
                Matcher::Pattern(pattern) => value
                    .and_then(Value::as_str)
                    .is_some_and(|s| pattern.is_match(s)),
            },
        }
    }

    fn register(&mut self, name: &str, schema_type: Arc<dyn SchemaType>) {
        let mut prefix = String::new();
        let segments: Vec<&str> = name.split('.').collect();
        for segment in &segments[..segments.len() - 1] {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            self.ensure_object(&prefix);
        }

        match self.index.get(name) {
            Some(&i) => self.paths[i].1 = schema_type,
            None => {
                self.index.insert(name.to_string(), self.paths.len());
                self.paths.push((name.to_string(), schema_type));
            }
        }
    }

    /// Registers a structural Object at `name` unless something is there.
    fn ensure_object(&mut self, name: &str) {
        if !self.index.contains_key(name) {
            self.register(name, Arc::new(ObjectType::new(name, TypeOptions::new())));
        }
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.keys().collect();
        methods.sort();
        let mut statics: Vec<_> = self.statics.keys().collect();
        statics.sort();
        f.debug_struct("Schema")
            .field(
                "paths",
                &self
                    .paths
                    .iter()
                    .map(|(name, t)| (name.as_str(), t.tag()))
                    .collect::<Vec<_>>(),
            )
            .field("methods", &methods)
            .field("statics", &statics)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

fn write_back(data: &mut Record, name: &str, result: Option<Value>) {
    match result {
        Some(value) => set_path(data, name, value),
        None => {
            delete_path(data, name);
        }
    }
}

/// Turns a non-nested descriptor into a type bound to `name`.
fn resolve_type(name: &str, descriptor: &Descriptor) -> SchemaResult<Arc<dyn SchemaType>> {
    Ok(match descriptor {
        Descriptor::Type(schema_type) => schema_type.clone(),
        Descriptor::Tag(tag) => tag.instantiate(name, TypeOptions::new()),
        Descriptor::Typed(tag, options) => tag.instantiate(name, options.clone()),
        Descriptor::Array(items) => {
            let child = match items.first() {
                Some(element) => resolve_type(name, element)?,
                None => Arc::new(MixedType::new(name, TypeOptions::new())),
            };
            Arc::new(ArrayType::new(name, TypeOptions::new().child(child)))
        }
        Descriptor::Nested(_) => Arc::new(ObjectType::new(name, TypeOptions::new())),
    })
}

fn parse_tag(path: &str, name: &str) -> SchemaResult<TypeTag> {
    name.parse().map_err(|reason| SchemaError::InvalidPath {
        path: path.to_string(),
        reason,
    })
}

fn descriptor_from_json(path: &str, json: &serde_json::Value) -> SchemaResult<Descriptor> {
    match json {
        serde_json::Value::String(name) => parse_tag(path, name).map(Descriptor::Tag),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|item| descriptor_from_json(path, item))
            .collect::<SchemaResult<Vec<_>>>()
            .map(Descriptor::Array),
        serde_json::Value::Object(map) => match map.get("type") {
            Some(serde_json::Value::String(name)) => {
                let tag = parse_tag(path, name)?;
                let mut options = TypeOptions::new().required(
                    map.get("required")
                        .and_then(serde_json::Value::as_bool)
                        .unwrap_or(false),
                );
                if let Some(default) = map.get("default") {
                    options = options.default_value(Value::from_json(default.clone()));
                }
                if let Some(serde_json::Value::Array(values)) = map.get("values") {
                    options = options.values(values.iter().cloned().map(Value::from_json).collect());
                }
                if let Some(child) = map.get("child") {
                    let child = descriptor_from_json(path, child)?;
                    options = options.child(resolve_type(path, &child)?);
                }
                Ok(Descriptor::Typed(tag, options))
            }
            _ => {
                let mut shape = Shape::new();
                for (key, value) in map {
                    let nested = format!("{path}.{key}");
                    shape = shape.field(key.clone(), descriptor_from_json(&nested, value)?);
                }
                Ok(Descriptor::Nested(shape))
            }
        },
        other => Err(SchemaError::InvalidPath {
            path: path.to_string(),
            reason: format!("expected a type name, array or object, got `{other}`"),
        }),
    }
}
