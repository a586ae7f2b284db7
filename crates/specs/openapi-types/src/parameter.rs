//! Parameter Object and Header Object for OpenAPI.

use crate::media::{encoding_shape, media_type_shape};
use crate::node::{Node, impl_node, present};
use crate::resolve::reference_or;
use crate::schema::{NodeSchema, SchemaDef};
use crate::{Example, Extensions, MediaType, RefOr, Schema};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;

static PARAMETER: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Parameter",
        SchemaDef::object()
            .required("name", SchemaDef::string())
            .required("in", SchemaDef::one_of_str(&["query", "header", "path", "cookie"]))
            .optional("description", SchemaDef::string())
            .optional("required", SchemaDef::Boolean)
            .optional("deprecated", SchemaDef::Boolean)
            .optional("allowEmptyValue", SchemaDef::Boolean)
            .optional(
                "style",
                SchemaDef::one_of_str(&[
                    "matrix",
                    "label",
                    "form",
                    "simple",
                    "spaceDelimited",
                    "pipeDelimited",
                    "deepObject",
                ]),
            )
            .optional("explode", SchemaDef::Boolean)
            .optional("allowReserved", SchemaDef::Boolean)
            .optional("schema", SchemaDef::node(Schema::schema()))
            .optional("example", SchemaDef::Any)
            .optional("examples", examples_map())
            .optional("content", SchemaDef::record(SchemaDef::node(MediaType::schema())))
            .extensible(),
        vec![
            json!({
                "name": "limit",
                "in": "query",
                "description": "How many items to return at one time (max 100)",
                "schema": { "type": "integer", "format": "int32" }
            }),
            json!({
                "name": "petId",
                "in": "path",
                "required": true,
                "schema": { "type": "string" }
            }),
            json!({
                "name": "coordinates",
                "in": "query",
                "content": {
                    "application/json": {
                        "schema": { "type": "object", "required": ["lat", "long"] }
                    }
                }
            }),
        ],
    )
});

static HEADER: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::recursive(
        "Header",
        vec![
            json!({
                "description": "The number of allowed requests in the current period",
                "schema": { "type": "integer" }
            }),
            json!({
                "content": {
                    "text/plain": {
                        "encoding": {
                            "part": { "headers": { "X-Rate-Limit": { "required": true } } }
                        }
                    }
                }
            }),
        ],
        |this| header_shape(media_type_shape(encoding_shape(this))),
    )
});

impl_node!(Parameter, PARAMETER);
impl_node!(Header, HEADER);

/// `examples` field shared by parameters, headers and media types.
pub(crate) fn examples_map() -> SchemaDef {
    SchemaDef::record(reference_or(SchemaDef::node(Example::schema())))
}

/// Header body with `content` values of the given media type shape.
pub(crate) fn header_shape(media_type: SchemaDef) -> SchemaDef {
    SchemaDef::object()
        .optional("description", SchemaDef::string())
        .optional("required", SchemaDef::Boolean)
        .optional("deprecated", SchemaDef::Boolean)
        .optional("style", SchemaDef::one_of_str(&["simple"]))
        .optional("explode", SchemaDef::Boolean)
        .optional("schema", SchemaDef::node(Schema::schema()))
        .optional("example", SchemaDef::Any)
        .optional("examples", examples_map())
        .optional("content", SchemaDef::record(media_type))
        .extensible()
}

/// The location of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Header,
    Path,
    Cookie,
}

impl ParameterLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Header => "header",
            Self::Path => "path",
            Self::Cookie => "cookie",
        }
    }
}

impl fmt::Display for ParameterLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a parameter, header or encoded property value is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterStyle {
    Matrix,
    Label,
    Form,
    Simple,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

/// Describes a single operation parameter.
///
/// A unique parameter is defined by a combination of `name` and location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Parameter {
    /// The name of the parameter. Parameter names are case sensitive.
    pub name: String,

    /// The location of the parameter.
    #[serde(rename = "in")]
    pub location: ParameterLocation,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether this parameter is mandatory. MUST be `true` for path parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    #[serde(rename = "allowEmptyValue", skip_serializing_if = "Option::is_none")]
    pub allow_empty_value: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParameterStyle>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(rename = "allowReserved", skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,

    /// The schema defining the type used for the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<IndexMap<String, RefOr<Example>>>,

    /// A map containing the representations for the parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Parameter {
    /// Create a parameter; path parameters are marked required.
    pub fn new(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: name.into(),
            location,
            description: None,
            required: (location == ParameterLocation::Path).then_some(true),
            deprecated: None,
            allow_empty_value: None,
            style: None,
            explode: None,
            allow_reserved: None,
            schema: None,
            example: None,
            examples: None,
            content: None,
            extensions: Extensions::new(),
        }
    }

    pub fn query(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Query)
    }

    pub fn path(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Path)
    }

    pub fn header(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Header)
    }

    pub fn cookie(name: impl Into<String>) -> Self {
        Self::new(name, ParameterLocation::Cookie)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }

    pub fn with_style(mut self, style: ParameterStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_explode(mut self, explode: bool) -> Self {
        self.explode = Some(explode);
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn with_examples_entry(
        mut self,
        name: impl Into<String>,
        example: impl Into<RefOr<Example>>,
    ) -> Self {
        self.examples
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), example.into());
        self
    }

    pub fn with_content(mut self, media_type: impl Into<String>, content: MediaType) -> Self {
        self.content
            .get_or_insert_with(IndexMap::new)
            .insert(media_type.into(), content);
        self
    }

    /// Whether the parameter must be supplied
    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }

    /// Key identifying this parameter within one operation
    pub fn key(&self) -> (String, ParameterLocation) {
        (self.name.clone(), self.location)
    }
}

/// Describes a single header for responses and multipart encodings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct Header {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// Only `simple` is allowed for headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParameterStyle>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<IndexMap<String, RefOr<Example>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn with_example(mut self, example: impl Into<Value>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn with_content(mut self, media_type: impl Into<String>, content: MediaType) -> Self {
        self.content
            .get_or_insert_with(IndexMap::new)
            .insert(media_type.into(), content);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OpenApiError;

    #[test]
    fn test_path_parameters_are_required() {
        assert_eq!(Parameter::path("id").required, Some(true));
        assert_eq!(Parameter::query("limit").required, None);
        assert!(Parameter::path("id").is_required());
    }

    #[test]
    fn test_independent_violations_are_all_reported() {
        let err = Parameter::from_value(&json!({ "in": "body" })).unwrap_err();
        let OpenApiError::TypeCheck { node, violations } = &err else {
            panic!("expected type check error, got {err:?}");
        };
        assert_eq!(node, "Parameter");
        assert_eq!(violations.len(), 2);
        assert!(violations.iter().any(|v| v.message.contains("\"name\"")));
        assert!(violations.iter().any(|v| v.path == "/in"));
    }

    #[test]
    fn test_parameter_round_trip() {
        let parameter = Parameter::query("tags")
            .with_description("Tags to filter by")
            .with_style(ParameterStyle::Form)
            .with_explode(true)
            .with_schema(Schema::array(Schema::string()))
            .with_examples_entry("one", Example::of(json!(["dog"])))
            .with_examples_entry("shared", crate::Reference::component("examples", "tags"));

        let raw = parameter.json().unwrap();
        assert_eq!(raw["in"], json!("query"));
        assert_eq!(raw["style"], json!("form"));

        let parsed = Parameter::from_value(&raw).unwrap();
        assert_eq!(parsed, parameter);
        assert!(parsed.examples.as_ref().unwrap()["shared"].is_reference());
        assert_eq!(parsed.json().unwrap(), raw);
    }

    #[test]
    fn test_header_content_cycle_validates() {
        let raw = json!({
            "content": {
                "multipart/mixed": {
                    "encoding": {
                        "file": {
                            "headers": {
                                "X-Part": {
                                    "content": {
                                        "text/plain": {
                                            "encoding": {
                                                "inner": { "headers": { "X-Deep": { "required": true } } }
                                            }
                                        }
                                    }
                                },
                                "X-Shared": { "$ref": "#/components/headers/Shared" }
                            }
                        }
                    }
                }
            }
        });

        let header = Header::from_value(&raw).unwrap();
        assert_eq!(header.json().unwrap(), raw);

        let mut broken = raw.clone();
        broken["content"]["multipart/mixed"]["encoding"]["file"]["headers"]["X-Part"]["style"] =
            json!("form");
        assert!(!Header::check(&broken));
    }
}
