//! Schema Object for OpenAPI.
//!
//! OpenAPI 3.1 schemas are JSON Schema 2020-12 documents. They are kept as
//! raw JSON: the structural check only requires an object or a boolean.

use crate::node::impl_node;
use crate::schema::{NodeSchema, SchemaDef};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

static SCHEMA: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Schema",
        SchemaDef::union(vec![SchemaDef::object().open(), SchemaDef::Boolean]),
        vec![
            json!({ "type": "string", "format": "email" }),
            json!({
                "type": "object",
                "required": ["name"],
                "properties": {
                    "name": { "type": "string" },
                    "tag": { "$ref": "#/components/schemas/Tag" }
                }
            }),
            json!(true),
        ],
    )
});

impl_node!(Schema, SCHEMA);

/// A JSON Schema describing input or output data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(Value);

impl Default for Schema {
    fn default() -> Self {
        Self::any()
    }
}

impl Schema {
    /// Schema accepting any value
    pub fn any() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Wrap raw JSON Schema content
    pub fn raw(value: impl Into<Value>) -> Self {
        Self(value.into())
    }

    pub fn boolean() -> Self {
        Self::of_type("boolean")
    }

    pub fn string() -> Self {
        Self::of_type("string")
    }

    pub fn number() -> Self {
        Self::of_type("number")
    }

    pub fn integer() -> Self {
        Self::of_type("integer")
    }

    pub fn object() -> Self {
        Self::of_type("object")
    }

    pub fn array(items: Schema) -> Self {
        Self::of_type("array").with_keyword("items", items.0)
    }

    /// A `$ref` to a schema under `#/components/schemas`
    pub fn component(name: &str) -> Self {
        Self(json!({
            "$ref": format!(
                "#/components/schemas/{}",
                crate::validation::escape_pointer_segment(name)
            )
        }))
    }

    fn of_type(name: &str) -> Self {
        Self(json!({ "type": name }))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// Set an arbitrary keyword. A boolean schema is first widened to an
    /// object (`true` to `{}`, `false` to `{"not": {}}`).
    pub fn with_keyword(mut self, keyword: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Value::Bool(accept) = self.0 {
            self.0 = if accept { json!({}) } else { json!({ "not": {} }) };
        }
        if let Value::Object(map) = &mut self.0 {
            map.insert(keyword.into(), value.into());
        }
        self
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        self.with_keyword("title", title.into())
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.with_keyword("description", description.into())
    }

    pub fn with_format(self, format: impl Into<String>) -> Self {
        self.with_keyword("format", format.into())
    }

    pub fn with_enum(self, values: Vec<Value>) -> Self {
        self.with_keyword("enum", values)
    }

    /// Add a property schema, keeping previously added properties in order
    pub fn with_property(mut self, name: impl Into<String>, schema: Schema) -> Self {
        let mut properties = match self.keyword_mut("properties") {
            Some(Value::Object(existing)) => std::mem::take(existing),
            _ => Map::new(),
        };
        properties.insert(name.into(), schema.0);
        self.with_keyword("properties", Value::Object(properties))
    }

    /// Mark a property as required
    pub fn require_property(mut self, name: impl Into<String>) -> Self {
        let name = Value::from(name.into());
        let mut required = match self.keyword_mut("required") {
            Some(Value::Array(existing)) => std::mem::take(existing),
            _ => Vec::new(),
        };
        if !required.contains(&name) {
            required.push(name);
        }
        self.with_keyword("required", required)
    }

    fn keyword_mut(&mut self, keyword: &str) -> Option<&mut Value> {
        self.0.as_object_mut().and_then(|map| map.get_mut(keyword))
    }
}

impl From<Value> for Schema {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
