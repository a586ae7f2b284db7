//! Node Schema Registry.
//!
//! Every OpenAPI node type owns a [`NodeSchema`]: a structural definition
//! written in the small [`SchemaDef`] language, a stable identifier and a
//! non-empty list of example payloads. Schemas are shared through `Arc` and
//! compared by identity, never by name; the identifier only has to be unique
//! inside one compiled reference closure.
//!
//! Mutually recursive node types (Operation, PathItem, Callback and Header,
//! MediaType, Encoding) are built with [`NodeSchema::recursive`], which hands
//! the body constructor a placeholder bound to the schema being defined. The
//! placeholder renders to a `$ref` on the schema's own identifier, so the
//! definition is expanded exactly once regardless of nesting depth.

mod closure;
mod compiler;
pub mod registry;

pub use closure::references;
pub use compiler::{CompiledValidator, CompilerConfig, SchemaCompiler, SchemaDraft};

use serde_json::{Map, Value, json};
use std::fmt;
use std::sync::Arc;

/// Pattern accepted for specification extension keys.
pub const EXTENSION_PATTERN: &str = "^x-";

/// Self-reference handle of a recursive schema.
///
/// Only [`NodeSchema::recursive`] can create one, so every placeholder in a
/// body is bound to the schema that encloses it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    id: String,
}

impl Placeholder {
    /// Identifier of the recursive schema this placeholder stands for
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// How an object treats keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Additional {
    /// Any extra key is accepted
    Open,
    /// Undeclared keys are rejected
    Closed,
    /// Only `x-` extension keys are accepted besides declared ones
    Extensible,
}

/// A declared object property.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub schema: SchemaDef,
    pub required: bool,
}

/// Object with named properties.
#[derive(Debug, Clone)]
pub struct ObjectDef {
    pub properties: Vec<Property>,
    pub additional: Additional,
    /// Property pairs that may not both be present
    pub exclusive: Vec<(String, String)>,
}

/// Map from string keys to a single value shape.
#[derive(Debug, Clone)]
pub struct RecordDef {
    /// Regex every non-extension key must match, any key when absent
    pub key_pattern: Option<String>,
    pub value: Box<SchemaDef>,
    /// Also accept `x-` extension keys with arbitrary values
    pub extensible: bool,
}

/// Structural schema definition.
#[derive(Debug, Clone)]
pub enum SchemaDef {
    Any,
    String { pattern: Option<String> },
    Boolean,
    Number,
    Integer,
    Literal(Value),
    Enum(Vec<Value>),
    Array(Box<SchemaDef>),
    Object(ObjectDef),
    Record(RecordDef),
    Union(Vec<SchemaDef>),
    /// Reference to another node schema, compiled through its closure
    Ref(Arc<NodeSchema>),
    /// Self-reference inside a recursive definition
    This(Placeholder),
}

impl SchemaDef {
    pub fn string() -> Self {
        Self::String { pattern: None }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self::String {
            pattern: Some(pattern.into()),
        }
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        Self::Literal(value.into())
    }

    /// Enumeration of string values
    pub fn one_of_str(values: &[&str]) -> Self {
        Self::Enum(values.iter().map(|v| Value::from(*v)).collect())
    }

    pub fn array(items: SchemaDef) -> Self {
        Self::Array(Box::new(items))
    }

    /// Closed object with no properties yet
    pub fn object() -> Self {
        Self::Object(ObjectDef {
            properties: Vec::new(),
            additional: Additional::Closed,
            exclusive: Vec::new(),
        })
    }

    /// Map with arbitrary keys
    pub fn record(value: SchemaDef) -> Self {
        Self::Record(RecordDef {
            key_pattern: None,
            value: Box::new(value),
            extensible: false,
        })
    }

    /// Map whose keys must match `key_pattern`
    pub fn patterned_record(key_pattern: impl Into<String>, value: SchemaDef) -> Self {
        Self::Record(RecordDef {
            key_pattern: Some(key_pattern.into()),
            value: Box::new(value),
            extensible: false,
        })
    }

    pub fn union(variants: Vec<SchemaDef>) -> Self {
        Self::Union(variants)
    }

    /// Reference to a registered node schema
    pub fn node(schema: &Arc<NodeSchema>) -> Self {
        Self::Ref(Arc::clone(schema))
    }

    /// Add a required property. No-op on non-object definitions.
    pub fn required(self, name: impl Into<String>, schema: SchemaDef) -> Self {
        self.property(name.into(), schema, true)
    }

    /// Add an optional property. No-op on non-object definitions.
    pub fn optional(self, name: impl Into<String>, schema: SchemaDef) -> Self {
        self.property(name.into(), schema, false)
    }

    fn property(mut self, name: String, schema: SchemaDef, required: bool) -> Self {
        if let Self::Object(object) = &mut self {
            object.properties.push(Property {
                name,
                schema,
                required,
            });
        }
        self
    }

    /// Accept `x-` extension keys on objects and records
    pub fn extensible(mut self) -> Self {
        match &mut self {
            Self::Object(object) => object.additional = Additional::Extensible,
            Self::Record(record) => record.extensible = true,
            _ => {}
        }
        self
    }

    /// Reject objects carrying both `first` and `second`. No-op on
    /// non-object definitions.
    pub fn exclusive(mut self, first: impl Into<String>, second: impl Into<String>) -> Self {
        if let Self::Object(object) = &mut self {
            object.exclusive.push((first.into(), second.into()));
        }
        self
    }

    /// Accept any undeclared key on objects
    pub fn open(mut self) -> Self {
        if let Self::Object(object) = &mut self {
            object.additional = Additional::Open;
        }
        self
    }

    /// Render this definition as a JSON Schema fragment.
    ///
    /// Node references and placeholders become `$ref`s into `$defs`.
    pub fn render(&self) -> Value {
        match self {
            Self::Any => json!({}),
            Self::String { pattern } => match pattern {
                Some(pattern) => json!({ "type": "string", "pattern": pattern }),
                None => json!({ "type": "string" }),
            },
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Number => json!({ "type": "number" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Literal(value) => json!({ "const": value }),
            Self::Enum(values) => json!({ "enum": values }),
            Self::Array(items) => json!({ "type": "array", "items": items.render() }),
            Self::Object(object) => render_object(object),
            Self::Record(record) => render_record(record),
            Self::Union(variants) => {
                json!({ "anyOf": variants.iter().map(SchemaDef::render).collect::<Vec<_>>() })
            }
            Self::Ref(node) => definition_ref(node.id()),
            Self::This(placeholder) => definition_ref(placeholder.id()),
        }
    }
}

fn definition_ref(id: &str) -> Value {
    json!({ "$ref": format!("#/$defs/{id}") })
}

fn render_object(object: &ObjectDef) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for property in &object.properties {
        properties.insert(property.name.clone(), property.schema.render());
        if property.required {
            required.push(Value::from(property.name.clone()));
        }
    }

    let mut rendered = Map::new();
    rendered.insert("type".into(), json!("object"));
    rendered.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        rendered.insert("required".into(), Value::Array(required));
    }
    match object.additional {
        Additional::Open => {}
        Additional::Closed => {
            rendered.insert("additionalProperties".into(), json!(false));
        }
        Additional::Extensible => {
            rendered.insert(
                "patternProperties".into(),
                json!({ EXTENSION_PATTERN: {} }),
            );
            rendered.insert("additionalProperties".into(), json!(false));
        }
    }
    let exclusions: Vec<Value> = object
        .exclusive
        .iter()
        .map(|(first, second)| json!({ "not": { "required": [first, second] } }))
        .collect();
    if !exclusions.is_empty() {
        rendered.insert("allOf".into(), Value::Array(exclusions));
    }
    Value::Object(rendered)
}

fn render_record(record: &RecordDef) -> Value {
    let value = record.value.render();
    let mut rendered = Map::new();
    rendered.insert("type".into(), json!("object"));

    match (&record.key_pattern, record.extensible) {
        (None, false) => {
            rendered.insert("additionalProperties".into(), value);
        }
        (None, true) => {
            // `additionalProperties` only applies to keys no pattern matched.
            rendered.insert(
                "patternProperties".into(),
                json!({ EXTENSION_PATTERN: {} }),
            );
            rendered.insert("additionalProperties".into(), value);
        }
        (Some(pattern), extensible) => {
            let mut patterns = Map::new();
            patterns.insert(pattern.clone(), value);
            if extensible {
                patterns.insert(EXTENSION_PATTERN.into(), json!({}));
            }
            rendered.insert("patternProperties".into(), Value::Object(patterns));
            rendered.insert("additionalProperties".into(), json!(false));
        }
    }
    Value::Object(rendered)
}

/// A node type's structural schema.
pub struct NodeSchema {
    id: String,
    body: SchemaDef,
    examples: Vec<Value>,
    recursive: bool,
}

impl NodeSchema {
    /// Define a non-recursive node schema.
    pub fn define(id: impl Into<String>, body: SchemaDef, examples: Vec<Value>) -> Arc<Self> {
        let id = id.into();
        debug_assert!(!examples.is_empty(), "node schema `{id}` needs examples");
        Arc::new(Self {
            id,
            body,
            examples,
            recursive: false,
        })
    }

    /// Define a schema whose body refers back to itself.
    ///
    /// `body` receives the placeholder for this schema exactly once and may
    /// thread it into nested shape constructors.
    pub fn recursive<F>(id: impl Into<String>, examples: Vec<Value>, body: F) -> Arc<Self>
    where
        F: FnOnce(SchemaDef) -> SchemaDef,
    {
        let id = id.into();
        debug_assert!(!examples.is_empty(), "node schema `{id}` needs examples");
        let this = SchemaDef::This(Placeholder { id: id.clone() });
        Arc::new(Self {
            body: body(this),
            id,
            examples,
            recursive: true,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn body(&self) -> &SchemaDef {
        &self.body
    }

    pub fn examples(&self) -> &[Value] {
        &self.examples
    }

    pub fn is_recursive(&self) -> bool {
        self.recursive
    }

    /// Render a standalone JSON Schema document for this node.
    ///
    /// The root and every member of `closure` land under `$defs`, keyed by
    /// identifier; the document itself is a `$ref` to the root definition.
    pub fn to_json_schema(&self, closure: &[Arc<NodeSchema>]) -> Value {
        let mut definitions = Map::new();
        definitions.insert(self.id.clone(), self.render_definition());
        for node in closure {
            if !definitions.contains_key(node.id()) {
                definitions.insert(node.id.clone(), node.render_definition());
            }
        }

        json!({
            "$defs": definitions,
            "$ref": format!("#/$defs/{}", self.id),
        })
    }

    fn render_definition(&self) -> Value {
        let mut rendered = self.body.render();
        if let Value::Object(map) = &mut rendered {
            map.insert("title".into(), Value::from(self.id.clone()));
            map.insert("examples".into(), Value::Array(self.examples.clone()));
        }
        rendered
    }
}

impl fmt::Debug for NodeSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSchema")
            .field("id", &self.id)
            .field("recursive", &self.recursive)
            .field("examples", &self.examples.len())
            .finish_non_exhaustive()
    }
}
