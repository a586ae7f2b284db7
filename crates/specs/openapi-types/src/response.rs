//! Responses Object and Response Object for OpenAPI.

use crate::node::{Node, impl_node};
use crate::patterned::PatternedMap;
use crate::resolve::reference_or;
use crate::schema::{NodeSchema, SchemaDef};
use crate::{Extensions, Header, Link, MediaType, RefOr};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::ops::Deref;
use std::sync::Arc;

/// Keys accepted by a Responses object besides extensions.
pub const RESPONSE_KEY_PATTERN: &str = "^(default|[1-5](?:[0-9]{2}|XX))$";

static RESPONSE: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Response",
        SchemaDef::object()
            .required("description", SchemaDef::string())
            .optional(
                "headers",
                SchemaDef::record(reference_or(SchemaDef::node(Header::schema()))),
            )
            .optional("content", SchemaDef::record(SchemaDef::node(MediaType::schema())))
            .optional(
                "links",
                SchemaDef::record(reference_or(SchemaDef::node(Link::schema()))),
            )
            .extensible(),
        vec![
            json!({
                "description": "A complex object array response",
                "content": {
                    "application/json": {
                        "schema": { "type": "array", "items": { "$ref": "#/components/schemas/Pet" } }
                    }
                }
            }),
            json!({
                "description": "A simple string response",
                "headers": {
                    "X-Rate-Limit-Limit": { "schema": { "type": "integer" } },
                    "X-Trace": { "$ref": "#/components/headers/Trace" }
                },
                "links": { "next": { "operationId": "listPets" } }
            }),
            json!({ "description": "object created" }),
        ],
    )
});

static RESPONSES: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Responses",
        SchemaDef::patterned_record(
            RESPONSE_KEY_PATTERN,
            reference_or(SchemaDef::node(Response::schema())),
        )
        .extensible(),
        vec![
            json!({
                "200": { "description": "a pet to be returned" },
                "default": { "$ref": "#/components/responses/Error" }
            }),
            json!({ "4XX": { "description": "client error" }, "x-rate-limited": true }),
        ],
    )
});

impl_node!(Response, RESPONSE);
impl_node!(Responses, RESPONSES);

/// Describes a single response from an API operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Response {
    /// A description of the response. CommonMark syntax MAY be used.
    pub description: String,

    /// Maps a header name to its definition. `Content-Type` is ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, RefOr<Header>>>,

    /// Potential response payloads, keyed by media type or range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,

    /// Operation links that can be followed from the response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<IndexMap<String, RefOr<Link>>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Response {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            headers: None,
            content: None,
            links: None,
            extensions: Extensions::new(),
        }
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

    pub fn with_content(mut self, media_type: impl Into<String>, content: MediaType) -> Self {
        self.content
            .get_or_insert_with(IndexMap::new)
            .insert(media_type.into(), content);
        self
    }

    pub fn with_link(mut self, name: impl Into<String>, link: impl Into<RefOr<Link>>) -> Self {
        self.links
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), link.into());
        self
    }

    /// Add an `x-` extension field.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not start with `x-`; see [`crate::Extensions::try_with`].
    pub fn with_extension(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extensions.insert(key, value);
        self
    }
}

/// Expected responses of an operation, keyed by status code, range or `default`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Responses(PatternedMap<RefOr<Response>>);

impl Responses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the response for a status code (`"200"`) or range (`"4XX"`)
    pub fn with_status(
        self,
        status: impl Into<String>,
        response: impl Into<RefOr<Response>>,
    ) -> Self {
        Self(self.0.with_entry(status, response))
    }

    /// Add the response used for every status not covered individually
    pub fn with_default(self, response: impl Into<RefOr<Response>>) -> Self {
        self.with_status("default", response)
    }

    /// Add an `x-` extension field.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not start with `x-`; see [`crate::Extensions::try_with`].
    pub fn with_extension(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(self.0.with_extension(key, value))
    }

    /// The `default` response, if declared
    pub fn default_response(&self) -> Option<&RefOr<Response>> {
        self.0.get("default")
    }
}

impl Deref for Responses {
    type Target = PatternedMap<RefOr<Response>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Reference, Schema};

    #[test]
    fn test_response_key_pattern() {
        assert!(Responses::check(&json!({ "204": { "description": "No content" } })));
        assert!(Responses::check(&json!({ "5XX": { "description": "server" } })));
        assert!(!Responses::check(&json!({ "600": { "description": "nope" } })));
        assert!(!Responses::check(&json!({ "2xx": { "description": "nope" } })));
        assert!(!Responses::check(&json!({ "200": {} })));
    }

    #[test]
    fn test_responses_preserve_status_order() {
        let responses = Responses::new()
            .with_status(
                "201",
                Response::new("Created").with_content(
                    "application/json",
                    MediaType::new().with_schema(Schema::component("Pet")),
                ),
            )
            .with_status("400", Reference::response_component("BadRequest"))
            .with_default(Response::new("Unexpected error"));

        let keys: Vec<&String> = responses.keys().collect();
        assert_eq!(keys, ["201", "400", "default"]);
        assert!(responses.get("400").unwrap().is_reference());
        assert!(responses.default_response().is_some());

        let raw = responses.json().unwrap();
        assert_eq!(Responses::from_value(&raw).unwrap(), responses);
    }

    #[test]
    fn test_response_headers_and_links() {
        let response = Response::new("ok")
            .with_header("X-Rate-Limit", crate::Header::new().with_schema(Schema::integer()))
            .with_link(
                "self",
                Link::to_operation("getPet").with_parameter("id", "$response.body#/id"),
            );

        let raw = response.json().unwrap();
        assert_eq!(raw["headers"]["X-Rate-Limit"]["schema"], json!({ "type": "integer" }));
        assert_eq!(Response::from_value(&raw).unwrap(), response);
    }
}
