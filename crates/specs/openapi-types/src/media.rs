//! Request Body, Media Type and Encoding Objects for OpenAPI.
//!
//! Media types, their encodings and the headers of those encodings form a
//! cycle (`Header.content` holds media types again). Each of the three node
//! schemas is a recursive definition rooted at itself, with the other two
//! shapes expanded inline once around the placeholder.

use crate::node::{Node, impl_node, present};
use crate::parameter::{examples_map, header_shape};
use crate::resolve::reference_or;
use crate::schema::{NodeSchema, SchemaDef};
use crate::{Example, Extensions, Header, ParameterStyle, RefOr, Schema};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

static MEDIA_TYPE: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::recursive(
        "MediaType",
        vec![
            json!({
                "schema": { "$ref": "#/components/schemas/Pet" },
                "examples": {
                    "cat": { "summary": "A cat", "value": { "name": "Fluffy" } },
                    "dog": { "$ref": "#/components/examples/dog" }
                }
            }),
            json!({
                "schema": { "type": "object" },
                "encoding": {
                    "profileImage": {
                        "contentType": "image/png, image/jpeg",
                        "headers": { "X-Rate-Limit-Limit": { "schema": { "type": "integer" } } }
                    }
                }
            }),
        ],
        |this| media_type_shape(encoding_shape(header_shape(this))),
    )
});

static ENCODING: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::recursive(
        "Encoding",
        vec![
            json!({ "contentType": "application/xml; charset=utf-8" }),
            json!({
                "style": "form",
                "explode": true,
                "headers": { "X-Trace": { "$ref": "#/components/headers/Trace" } }
            }),
        ],
        |this| encoding_shape(header_shape(media_type_shape(this))),
    )
});

static REQUEST_BODY: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "RequestBody",
        SchemaDef::object()
            .optional("description", SchemaDef::string())
            .required(
                "content",
                SchemaDef::record(SchemaDef::node(MediaType::schema())),
            )
            .optional("required", SchemaDef::Boolean)
            .extensible(),
        vec![
            json!({
                "description": "Pet to add to the store",
                "content": {
                    "application/json": { "schema": { "$ref": "#/components/schemas/NewPet" } }
                },
                "required": true
            }),
            json!({ "content": { "text/plain": { "schema": { "type": "string" } } } }),
        ],
    )
});

impl_node!(MediaType, MEDIA_TYPE);
impl_node!(Encoding, ENCODING);
impl_node!(RequestBody, REQUEST_BODY);

/// Media Type body with `encoding` values of the given shape.
pub(crate) fn media_type_shape(encoding: SchemaDef) -> SchemaDef {
    SchemaDef::object()
        .optional("schema", SchemaDef::node(Schema::schema()))
        .optional("example", SchemaDef::Any)
        .optional("examples", examples_map())
        .optional("encoding", SchemaDef::record(encoding))
        .extensible()
}

/// Encoding body with `headers` values of the given header shape.
pub(crate) fn encoding_shape(header: SchemaDef) -> SchemaDef {
    SchemaDef::object()
        .optional("contentType", SchemaDef::string())
        .optional("headers", SchemaDef::record(reference_or(header)))
        .optional(
            "style",
            SchemaDef::one_of_str(&["form", "spaceDelimited", "pipeDelimited", "deepObject"]),
        )
        .optional("explode", SchemaDef::Boolean)
        .optional("allowReserved", SchemaDef::Boolean)
        .extensible()
}

/// Describes a single request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct RequestBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The content of the request body, keyed by media type or range.
    pub content: IndexMap<String, MediaType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl RequestBody {
    /// Create a request body with a single media type
    pub fn new(media_type: impl Into<String>, content: MediaType) -> Self {
        Self {
            description: None,
            content: IndexMap::from([(media_type.into(), content)]),
            required: None,
            extensions: Extensions::new(),
        }
    }

    /// Shorthand for an `application/json` body with the given schema
    pub fn application_json(schema: Schema) -> Self {
        Self::new("application/json", MediaType::new().with_schema(schema))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_content(mut self, media_type: impl Into<String>, content: MediaType) -> Self {
        self.content.insert(media_type.into(), content);
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }
}

/// Provides schema and examples for one media type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct MediaType {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,

    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<IndexMap<String, RefOr<Example>>>,

    /// Encoding information for properties of multipart or form bodies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<IndexMap<String, Encoding>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl MediaType {
    pub fn new() -> Self {
        Self::default()
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

    pub fn with_encoding(mut self, property: impl Into<String>, encoding: Encoding) -> Self {
        self.encoding
            .get_or_insert_with(IndexMap::new)
            .insert(property.into(), encoding);
        self
    }
}

/// Encoding applied to a single schema property.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct Encoding {
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, RefOr<Header>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<ParameterStyle>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub explode: Option<bool>,

    #[serde(rename = "allowReserved", skip_serializing_if = "Option::is_none")]
    pub allow_reserved: Option<bool>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Encoding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        header: impl Into<RefOr<Header>>,
    ) -> Self {
        self.headers
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), header.into());
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Reference;

    #[test]
    fn test_request_body_requires_content() {
        assert!(!RequestBody::check(&json!({ "description": "empty" })));

        let body = RequestBody::application_json(Schema::component("NewPet")).with_required(true);
        assert_eq!(
            body.json().unwrap(),
            json!({
                "content": {
                    "application/json": { "schema": { "$ref": "#/components/schemas/NewPet" } }
                },
                "required": true
            })
        );
        assert!(body.revalidate().is_ok());
    }

    #[test]
    fn test_media_type_examples_resolve_both_variants() {
        let media = MediaType::from_value(&MediaType::examples()[0]).unwrap();
        let examples = media.examples.as_ref().unwrap();
        assert!(examples["cat"].as_value().is_some());
        assert_eq!(
            examples["dog"].as_reference().map(Reference::reference),
            Some("#/components/examples/dog")
        );
    }

    #[test]
    fn test_encoding_rejects_header_only_style() {
        assert!(!Encoding::check(&json!({ "style": "simple" })));
        assert!(Encoding::check(&json!({ "style": "deepObject" })));
    }

    #[test]
    fn test_multipart_encoding_builder() {
        let media = MediaType::new()
            .with_schema(Schema::object())
            .with_encoding(
                "avatar",
                Encoding::new()
                    .with_content_type("image/png")
                    .with_header("X-Checksum", Header::new().with_required(true))
                    .with_header("X-Trace", Reference::component("headers", "Trace")),
            );

        let raw = media.json().unwrap();
        assert_eq!(MediaType::from_value(&raw).unwrap(), media);
        assert_eq!(
            raw["encoding"]["avatar"]["headers"]["X-Trace"],
            json!({ "$ref": "#/components/headers/Trace" })
        );
    }
}
