//! Operation Object and Callback Object for OpenAPI.
//!
//! Operations hold callbacks, callbacks hold path items and path items hold
//! operations again. The Operation and PathItem schemas are each a recursive
//! definition rooted at themselves; the Callback schema simply refers to the
//! PathItem schema.

use crate::node::{Node, impl_node};
use crate::paths::path_item_shape;
use crate::patterned::PatternedMap;
use crate::resolve::reference_or;
use crate::schema::{NodeSchema, SchemaDef};
use crate::tree;
use crate::{
    Extensions, ExternalDocumentation, OpenApiError, Parameter, PathItem, RefOr, RequestBody,
    Response, Responses, SecurityRequirement, Server,
};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use std::ops::Deref;
use std::sync::Arc;

static OPERATION: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::recursive(
        "Operation",
        vec![
            json!({
                "tags": ["pet"],
                "summary": "Updates a pet in the store with form data",
                "operationId": "updatePetWithForm",
                "parameters": [{
                    "name": "petId",
                    "in": "path",
                    "description": "ID of pet that needs to be updated",
                    "required": true,
                    "schema": { "type": "string" }
                }],
                "requestBody": {
                    "content": {
                        "application/x-www-form-urlencoded": {
                            "schema": {
                                "type": "object",
                                "properties": { "name": { "type": "string" } }
                            }
                        }
                    }
                },
                "responses": {
                    "200": { "description": "Pet updated." },
                    "405": { "description": "Method Not Allowed" }
                },
                "security": [{ "petstore_auth": ["write:pets", "read:pets"] }]
            }),
            json!({
                "operationId": "subscribe",
                "callbacks": {
                    "onData": {
                        "{$request.query.callbackUrl}/data": {
                            "post": {
                                "requestBody": { "$ref": "#/components/requestBodies/Event" },
                                "responses": { "202": { "description": "accepted" } }
                            }
                        }
                    },
                    "shared": { "$ref": "#/components/callbacks/Shared" }
                }
            }),
        ],
        |this| operation_shape(path_item_shape(this)),
    )
});

static CALLBACK: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Callback",
        callback_shape(SchemaDef::node(PathItem::schema())),
        vec![
            json!({
                "{$request.body#/callbackUrl}": {
                    "post": { "responses": { "200": { "description": "callback received" } } }
                }
            }),
            json!({
                "http://notificationServer.com?transactionId={$request.body#/id}": {
                    "$ref": "#/components/pathItems/Notify"
                },
                "x-retry": 3
            }),
        ],
    )
});

impl_node!(Operation, OPERATION, tree::operation);
impl_node!(Callback, CALLBACK, tree::callback);

/// Operation body whose callbacks hold the given path item shape.
pub(crate) fn operation_shape(path_item: SchemaDef) -> SchemaDef {
    SchemaDef::object()
        .optional("tags", SchemaDef::array(SchemaDef::string()))
        .optional("summary", SchemaDef::string())
        .optional("description", SchemaDef::string())
        .optional("externalDocs", SchemaDef::node(ExternalDocumentation::schema()))
        .optional("operationId", SchemaDef::string())
        .optional(
            "parameters",
            SchemaDef::array(reference_or(SchemaDef::node(Parameter::schema()))),
        )
        .optional(
            "requestBody",
            reference_or(SchemaDef::node(RequestBody::schema())),
        )
        .optional("responses", SchemaDef::node(Responses::schema()))
        .optional(
            "callbacks",
            SchemaDef::record(reference_or(callback_shape(path_item))),
        )
        .optional("deprecated", SchemaDef::Boolean)
        .optional(
            "security",
            SchemaDef::array(SchemaDef::node(SecurityRequirement::schema())),
        )
        .optional("servers", SchemaDef::array(SchemaDef::node(Server::schema())))
        .extensible()
}

/// Callback body: runtime expressions mapped to path items or references.
pub(crate) fn callback_shape(path_item: SchemaDef) -> SchemaDef {
    SchemaDef::record(reference_or(path_item)).extensible()
}

/// Describes a single API operation on a path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Builder)]
pub struct Operation {
    /// Tags for API documentation control.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    /// Unique string used to identify the operation across the whole document.
    #[serde(rename = "operationId", skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<RefOr<Parameter>>>,

    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RefOr<RequestBody>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<Responses>,

    /// Out-of-band callbacks related to this operation, keyed by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<IndexMap<String, RefOr<Callback>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,

    /// Security mechanisms for this operation; an empty list removes
    /// top-level security.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Operation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_external_docs(mut self, external_docs: ExternalDocumentation) -> Self {
        self.external_docs = Some(external_docs);
        self
    }

    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<RefOr<Parameter>>) -> Self {
        self.parameters
            .get_or_insert_with(Vec::new)
            .push(parameter.into());
        self
    }

    pub fn with_request_body(mut self, request_body: impl Into<RefOr<RequestBody>>) -> Self {
        self.request_body = Some(request_body.into());
        self
    }

    pub fn with_responses(mut self, responses: Responses) -> Self {
        self.responses = Some(responses);
        self
    }

    /// Add one response, creating the Responses object on first use
    pub fn with_response(
        mut self,
        status: impl Into<String>,
        response: impl Into<RefOr<Response>>,
    ) -> Self {
        let responses = self.responses.take().unwrap_or_default();
        self.responses = Some(responses.with_status(status, response));
        self
    }

    pub fn with_callback(
        mut self,
        name: impl Into<String>,
        callback: impl Into<RefOr<Callback>>,
    ) -> Self {
        self.callbacks
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), callback.into());
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }

    pub fn with_security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.get_or_insert_with(Vec::new).push(requirement);
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.get_or_insert_with(Vec::new).push(server);
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

    /// Inline parameters, references skipped
    pub fn inline_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .flatten()
            .filter_map(RefOr::as_value)
    }
}

/// A map of runtime expressions to the path items describing the requests
/// the API provider may initiate.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Callback(pub(crate) PatternedMap<RefOr<PathItem>>);

impl Callback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the path item invoked at `expression`, e.g. `{$request.body#/url}`
    pub fn with_expression(
        self,
        expression: impl Into<String>,
        item: impl Into<RefOr<PathItem>>,
    ) -> Self {
        Self(self.0.with_entry(expression, item))
    }

    /// Add an `x-` extension field.
    ///
    /// # Panics
    ///
    /// Panics if `key` does not start with `x-`; see [`crate::Extensions::try_with`].
    pub fn with_extension(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(self.0.with_extension(key, value))
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        tree::operation(&raw).map_err(OpenApiError::into_de_error)
    }
}

impl<'de> Deserialize<'de> for Callback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        tree::callback(&raw).map_err(OpenApiError::into_de_error)
    }
}

impl Deref for Callback {
    type Target = PatternedMap<RefOr<PathItem>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
