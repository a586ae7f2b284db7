//! Components Object for OpenAPI.

use crate::node::{Node, impl_node};
use crate::resolve::reference_or;
use crate::schema::{NodeSchema, SchemaDef};
use crate::{
    Callback, Example, Extensions, Header, Link, Parameter, PathItem, RefOr, RequestBody,
    Response, Schema, SecurityScheme,
};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Keys accepted in every Components map.
pub const COMPONENT_KEY_PATTERN: &str = r"^[a-zA-Z0-9\.\-_]+$";

static COMPONENTS: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    let keyed = |value: SchemaDef| SchemaDef::patterned_record(COMPONENT_KEY_PATTERN, value);
    let keyed_ref = |schema: &Arc<NodeSchema>| keyed(reference_or(SchemaDef::node(schema)));

    NodeSchema::define(
        "Components",
        SchemaDef::object()
            .optional("schemas", keyed(SchemaDef::node(Schema::schema())))
            .optional("responses", keyed_ref(Response::schema()))
            .optional("parameters", keyed_ref(Parameter::schema()))
            .optional("examples", keyed_ref(Example::schema()))
            .optional("requestBodies", keyed_ref(RequestBody::schema()))
            .optional("headers", keyed_ref(Header::schema()))
            .optional("securitySchemes", keyed_ref(SecurityScheme::schema()))
            .optional("links", keyed_ref(Link::schema()))
            .optional("callbacks", keyed_ref(Callback::schema()))
            .optional("pathItems", keyed_ref(PathItem::schema()))
            .extensible(),
        vec![
            json!({
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "required": ["id", "name"],
                        "properties": {
                            "id": { "type": "integer", "format": "int64" },
                            "name": { "type": "string" }
                        }
                    },
                    "Error": { "$ref": "#/components/schemas/ErrorModel" }
                },
                "parameters": {
                    "limit": { "name": "limit", "in": "query", "schema": { "type": "integer" } }
                },
                "responses": {
                    "NotFound": { "description": "Entity not found." }
                },
                "securitySchemes": {
                    "api_key": { "type": "apiKey", "name": "api-key", "in": "header" }
                }
            }),
            json!({
                "pathItems": {
                    "Pets": { "get": { "responses": { "200": { "description": "ok" } } } }
                },
                "callbacks": {
                    "Shared": { "{$request.body#/url}": { "$ref": "#/components/pathItems/Pets" } }
                },
                "x-internal": true
            }),
            json!({}),
        ],
    )
});

impl_node!(Components, COMPONENTS);

/// Holds reusable objects for different aspects of the API.
///
/// Nothing defined here affects the API unless it is referenced from outside
/// the components object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct Components {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schemas: Option<IndexMap<String, Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub responses: Option<IndexMap<String, RefOr<Response>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<IndexMap<String, RefOr<Parameter>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub examples: Option<IndexMap<String, RefOr<Example>>>,

    #[serde(rename = "requestBodies", skip_serializing_if = "Option::is_none")]
    pub request_bodies: Option<IndexMap<String, RefOr<RequestBody>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<IndexMap<String, RefOr<Header>>>,

    #[serde(rename = "securitySchemes", skip_serializing_if = "Option::is_none")]
    pub security_schemes: Option<IndexMap<String, RefOr<SecurityScheme>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<IndexMap<String, RefOr<Link>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub callbacks: Option<IndexMap<String, RefOr<Callback>>>,

    #[serde(rename = "pathItems", skip_serializing_if = "Option::is_none")]
    pub path_items: Option<IndexMap<String, RefOr<PathItem>>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

fn insert<T>(map: &mut Option<IndexMap<String, T>>, name: impl Into<String>, value: T) {
    map.get_or_insert_with(IndexMap::new)
        .insert(name.into(), value);
}

impl Components {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, name: impl Into<String>, schema: Schema) -> Self {
        insert(&mut self.schemas, name, schema);
        self
    }

    pub fn with_response(
        mut self,
        name: impl Into<String>,
        response: impl Into<RefOr<Response>>,
    ) -> Self {
        insert(&mut self.responses, name, response.into());
        self
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        parameter: impl Into<RefOr<Parameter>>,
    ) -> Self {
        insert(&mut self.parameters, name, parameter.into());
        self
    }

    pub fn with_example(
        mut self,
        name: impl Into<String>,
        example: impl Into<RefOr<Example>>,
    ) -> Self {
        insert(&mut self.examples, name, example.into());
        self
    }

    pub fn with_request_body(
        mut self,
        name: impl Into<String>,
        request_body: impl Into<RefOr<RequestBody>>,
    ) -> Self {
        insert(&mut self.request_bodies, name, request_body.into());
        self
    }

    pub fn with_header(
        mut self,
        name: impl Into<String>,
        header: impl Into<RefOr<Header>>,
    ) -> Self {
        insert(&mut self.headers, name, header.into());
        self
    }

    pub fn with_security_scheme(
        mut self,
        name: impl Into<String>,
        scheme: impl Into<RefOr<SecurityScheme>>,
    ) -> Self {
        insert(&mut self.security_schemes, name, scheme.into());
        self
    }

    pub fn with_link(mut self, name: impl Into<String>, link: impl Into<RefOr<Link>>) -> Self {
        insert(&mut self.links, name, link.into());
        self
    }

    pub fn with_callback(
        mut self,
        name: impl Into<String>,
        callback: impl Into<RefOr<Callback>>,
    ) -> Self {
        insert(&mut self.callbacks, name, callback.into());
        self
    }

    pub fn with_path_item(
        mut self,
        name: impl Into<String>,
        item: impl Into<RefOr<PathItem>>,
    ) -> Self {
        insert(&mut self.path_items, name, item.into());
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

    /// Check if no component of any kind is defined
    pub fn is_empty(&self) -> bool {
        self.schemas.is_none()
            && self.responses.is_none()
            && self.parameters.is_none()
            && self.examples.is_none()
            && self.request_bodies.is_none()
            && self.headers.is_none()
            && self.security_schemes.is_none()
            && self.links.is_none()
            && self.callbacks.is_none()
            && self.path_items.is_none()
            && self.extensions.is_empty()
    }

    pub fn get_schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.as_ref()?.get(name)
    }

    pub fn get_response(&self, name: &str) -> Option<&RefOr<Response>> {
        self.responses.as_ref()?.get(name)
    }

    pub fn get_parameter(&self, name: &str) -> Option<&RefOr<Parameter>> {
        self.parameters.as_ref()?.get(name)
    }

    pub fn get_security_scheme(&self, name: &str) -> Option<&RefOr<SecurityScheme>> {
        self.security_schemes.as_ref()?.get(name)
    }

    pub fn get_path_item(&self, name: &str) -> Option<&RefOr<PathItem>> {
        self.path_items.as_ref()?.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Operation, ParameterLocation, Reference};

    #[test]
    fn test_components_is_empty() {
        assert!(Components::new().is_empty());
        assert!(!Components::new().with_extension("x-internal", true).is_empty());
        assert!(!Components::new().with_schema("Pet", Schema::object()).is_empty());
    }

    #[test]
    fn test_component_keys_are_restricted() {
        assert!(Components::check(&json!({ "schemas": { "User.v1-beta_2": {} } })));
        assert!(!Components::check(&json!({ "schemas": { "user name": {} } })));
        assert!(!Components::check(&json!({ "responses": { "NotFound": {} } })));
    }

    #[test]
    fn test_components_round_trip() {
        let components = Components::new()
            .with_schema("Pet", Schema::object().with_property("name", Schema::string()))
            .with_response("NotFound", Response::new("Entity not found."))
            .with_parameter("limit", Parameter::query("limit").with_schema(Schema::integer()))
            .with_security_scheme(
                "api_key",
                SecurityScheme::api_key("api-key", ParameterLocation::Header),
            )
            .with_path_item(
                "Pets",
                PathItem::new()
                    .with_get(Operation::new().with_response("200", Response::new("ok"))),
            )
            .with_callback(
                "Shared",
                Callback::new().with_expression(
                    "{$request.body#/url}",
                    Reference::path_item_component("Pets"),
                ),
            );

        let raw = components.json().unwrap();
        let keys: Vec<&str> = raw.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            ["schemas", "responses", "parameters", "securitySchemes", "callbacks", "pathItems"]
        );
        assert_eq!(Components::from_value(&raw).unwrap(), components);
    }

    #[test]
    fn test_getters() {
        let components = Components::from_value(&Components::examples()[0]).unwrap();
        assert!(components.get_schema("Pet").is_some());
        assert!(components.get_response("NotFound").unwrap().as_value().is_some());
        assert_eq!(
            components.get_parameter("limit").and_then(RefOr::as_value).map(|p| p.location),
            Some(ParameterLocation::Query)
        );
        assert!(components.get_path_item("Pets").is_none());
    }
}
