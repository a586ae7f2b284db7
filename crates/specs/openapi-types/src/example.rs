//! Example Object and Link Object for OpenAPI.

use crate::node::{Node, impl_node, present};
use crate::schema::{NodeSchema, SchemaDef};
use crate::{Extensions, Server};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

static EXAMPLE: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Example",
        SchemaDef::object()
            .optional("summary", SchemaDef::string())
            .optional("description", SchemaDef::string())
            .optional("value", SchemaDef::Any)
            .optional("externalValue", SchemaDef::string())
            .exclusive("value", "externalValue")
            .extensible(),
        vec![
            json!({ "summary": "A cat", "value": { "name": "Fluffy", "petType": "Cat" } }),
            json!({ "externalValue": "https://example.org/examples/address-example.xml" }),
        ],
    )
});

static LINK: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Link",
        SchemaDef::object()
            .optional("operationRef", SchemaDef::string())
            .optional("operationId", SchemaDef::string())
            .optional("parameters", SchemaDef::record(SchemaDef::Any))
            .optional("requestBody", SchemaDef::Any)
            .optional("description", SchemaDef::string())
            .optional("server", SchemaDef::node(Server::schema()))
            .exclusive("operationRef", "operationId")
            .extensible(),
        vec![
            json!({
                "operationId": "getUserAddress",
                "parameters": { "userId": "$request.path.id" }
            }),
            json!({ "operationRef": "#/paths/~12.0~1repositories~1{username}/get" }),
        ],
    )
});

impl_node!(Example, EXAMPLE);
impl_node!(Link, LINK);

/// An example value for a parameter, media type or header.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct Example {
    /// Short description for the example.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// Long description for the example. CommonMark syntax MAY be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Embedded literal example. Mutually exclusive with `externalValue`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    /// A URI that identifies the literal example.
    #[serde(rename = "externalValue", skip_serializing_if = "Option::is_none")]
    pub external_value: Option<String>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Example {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Example with an embedded value
    pub fn of(value: impl Into<Value>) -> Self {
        Self::new().with_value(value)
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the embedded value, clearing any external value
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self.external_value = None;
        self
    }

    /// Set the external value, clearing any embedded value
    pub fn with_external_value(mut self, external_value: impl Into<String>) -> Self {
        self.external_value = Some(external_value.into());
        self.value = None;
        self
    }
}

/// A possible design-time link for a response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct Link {
    /// A relative or absolute URI reference to an OAS operation.
    #[serde(rename = "operationRef", skip_serializing_if = "Option::is_none")]
    pub operation_ref: Option<String>,

    /// The name of an existing, resolvable OAS operation.
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    /// Parameters to pass to the linked operation, constants or runtime expressions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, Value>>,

    #[serde(
        default,
        deserialize_with = "present",
        rename = "requestBody",
        skip_serializing_if = "Option::is_none"
    )]
    pub request_body: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// A server object to be used by the target operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Link {
    /// Link to an operation by its `operationId`
    pub fn to_operation(operation_id: impl Into<String>) -> Self {
        Self {
            operation_id: Some(operation_id.into()),
            ..Self::default()
        }
    }

    /// Link to an operation by reference
    pub fn to_operation_ref(operation_ref: impl Into<String>) -> Self {
        Self {
            operation_ref: Some(operation_ref.into()),
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_request_body(mut self, body: impl Into<Value>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.server = Some(server);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_value_and_external_value_exclusive() {
        let example = Example::of(json!({ "id": 1 })).with_external_value("https://x/e.json");
        assert!(example.value.is_none());
        assert_eq!(
            example.json().unwrap(),
            json!({ "externalValue": "https://x/e.json" })
        );
    }

    #[test]
    fn test_link_parameters_preserve_order() {
        let link = Link::to_operation("getUser")
            .with_parameter("userId", "$response.body#/id")
            .with_parameter("expand", true);

        assert_eq!(
            serde_json::to_string(&link).unwrap(),
            r#"{"operationId":"getUser","parameters":{"userId":"$response.body#/id","expand":true}}"#
        );
        assert!(link.revalidate().is_ok());
    }

    #[test]
    fn test_link_server_is_checked() {
        assert!(!Link::check(&json!({ "operationId": "x", "server": {} })));
        assert!(Link::check(&json!({ "operationId": "x", "server": { "url": "/" } })));
    }
}
