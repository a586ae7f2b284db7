//! The root OpenAPI document.

use crate::error::{OpenApiError, OpenApiResult};
use crate::node::{Node, impl_node};
use crate::resolve::reference_or;
use crate::schema::{NodeSchema, SchemaDef};
use crate::validation::{SchemaViolation, Validate, ValidateUnique, escape_pointer_segment};
use crate::{
    Callback, Components, Encoding, Extensions, ExternalDocumentation, Header, HttpMethod, Info,
    MediaType, Operation, Parameter, PathItem, Paths, RefOr, Reference, RequestBody,
    Response, Schema, SecurityRequirement, Server, Tag,
};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::debug;

/// Accepted values of the `openapi` field.
pub const OPENAPI_VERSION_PATTERN: &str = r"^3\.1\.\d+(-.+)?$";

static OPENAPI: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "OpenApi",
        SchemaDef::object()
            .required("openapi", SchemaDef::pattern(OPENAPI_VERSION_PATTERN))
            .required("info", SchemaDef::node(Info::schema()))
            .optional("jsonSchemaDialect", SchemaDef::string())
            .optional("servers", SchemaDef::array(SchemaDef::node(Server::schema())))
            .optional("paths", SchemaDef::node(Paths::schema()))
            .optional(
                "webhooks",
                SchemaDef::record(reference_or(SchemaDef::node(PathItem::schema()))),
            )
            .optional("components", SchemaDef::node(Components::schema()))
            .optional(
                "security",
                SchemaDef::array(SchemaDef::node(SecurityRequirement::schema())),
            )
            .optional("tags", SchemaDef::array(SchemaDef::node(Tag::schema())))
            .optional("externalDocs", SchemaDef::node(ExternalDocumentation::schema()))
            .extensible(),
        vec![
            json!({
                "openapi": "3.1.0",
                "info": { "title": "Swagger Petstore", "version": "1.0.0" },
                "paths": {
                    "/pets": {
                        "get": {
                            "operationId": "listPets",
                            "parameters": [{ "$ref": "#/components/parameters/limit" }],
                            "responses": {
                                "200": {
                                    "description": "A paged array of pets",
                                    "content": {
                                        "application/json": {
                                            "schema": {
                                                "type": "array",
                                                "items": { "$ref": "#/components/schemas/Pet" }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                },
                "components": {
                    "schemas": { "Pet": { "type": "object" } },
                    "parameters": {
                        "limit": { "name": "limit", "in": "query", "schema": { "type": "integer" } }
                    }
                }
            }),
            json!({
                "openapi": "3.1.1",
                "info": { "title": "Webhook Example", "version": "1.0.0" },
                "webhooks": {
                    "newPet": {
                        "post": {
                            "requestBody": {
                                "content": { "application/json": { "schema": { "type": "object" } } }
                            },
                            "responses": { "200": { "description": "ok" } }
                        }
                    }
                }
            }),
        ],
    )
});

impl_node!(OpenApi, OPENAPI);

/// The root object of an OpenAPI document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct OpenApi {
    /// The version of the OpenAPI Specification the document uses.
    pub openapi: String,

    /// Metadata about the API.
    pub info: Info,

    /// Default `$schema` dialect for Schema Objects in this document.
    #[serde(rename = "jsonSchemaDialect", skip_serializing_if = "Option::is_none")]
    pub json_schema_dialect: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,

    /// The available paths and operations for the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Paths>,

    /// Incoming requests the API provider may initiate, keyed by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhooks: Option<IndexMap<String, RefOr<PathItem>>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,

    /// Security mechanisms applying to every operation unless overridden.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,

    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl OpenApi {
    /// Create a document for the current OpenAPI version
    pub fn new(info: Info) -> Self {
        Self {
            openapi: crate::version::CURRENT.to_string(),
            info,
            json_schema_dialect: None,
            servers: None,
            paths: None,
            webhooks: None,
            components: None,
            security: None,
            tags: None,
            external_docs: None,
            extensions: Extensions::new(),
        }
    }

    pub fn with_json_schema_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.json_schema_dialect = Some(dialect.into());
        self
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.get_or_insert_with(Vec::new).push(server);
        self
    }

    pub fn with_paths(mut self, paths: Paths) -> Self {
        self.paths = Some(paths);
        self
    }

    /// Add one path, creating the Paths object on first use
    pub fn with_path(mut self, path: impl Into<String>, item: PathItem) -> Self {
        let paths = self.paths.take().unwrap_or_default();
        self.paths = Some(paths.with_path(path, item));
        self
    }

    pub fn with_webhook(
        mut self,
        name: impl Into<String>,
        item: impl Into<RefOr<PathItem>>,
    ) -> Self {
        self.webhooks
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), item.into());
        self
    }

    pub fn with_components(mut self, components: Components) -> Self {
        self.components = Some(components);
        self
    }

    pub fn with_security(mut self, requirement: SecurityRequirement) -> Self {
        self.security.get_or_insert_with(Vec::new).push(requirement);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.get_or_insert_with(Vec::new).push(tag);
        self
    }

    pub fn with_external_docs(mut self, external_docs: ExternalDocumentation) -> Self {
        self.external_docs = Some(external_docs);
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

    /// Check if the document declares a supported OpenAPI version
    pub fn is_supported_version(&self) -> bool {
        crate::version::is_supported(&self.openapi)
    }

    /// Every operation under `paths` as (path, method, operation), in
    /// insertion order.
    pub fn operations(&self) -> impl Iterator<Item = (&str, HttpMethod, &Operation)> {
        self.paths
            .iter()
            .flat_map(|paths| paths.iter())
            .flat_map(|(path, item)| {
                item.operations()
                    .map(move |(method, operation)| (path.as_str(), method, operation))
            })
    }

    /// Find an operation by its `operationId`
    pub fn find_operation(&self, operation_id: &str) -> Option<(&str, HttpMethod, &Operation)> {
        self.operations()
            .find(|(_, _, operation)| operation.operation_id.as_deref() == Some(operation_id))
    }

    /// The document as a shareable root for [`Reference::with_root`].
    pub fn to_root(&self) -> OpenApiResult<Arc<Value>> {
        self.json().map(Arc::new)
    }

    /// Follow `reference` inside this document and build the target as `T`.
    pub fn dereference<T: Node>(&self, reference: &Reference) -> OpenApiResult<T> {
        let root = self.json()?;
        reference.dereference_as::<T>(Some(&root))
    }
}

impl Validate for OpenApi {
    /// Structural check of the whole document plus the cross-cutting rules the
    /// node schemas cannot express: internal references resolve, operation
    /// ids and tag names are unique, and parameters are unique per location
    /// within each list.
    fn validate(&self) -> OpenApiResult<()> {
        let raw = self.json()?;
        let mut violations = match Self::type_check(&raw) {
            Ok(()) => Vec::new(),
            Err(OpenApiError::TypeCheck { violations, .. }) => violations,
            Err(other) => return Err(other),
        };

        if self.paths.is_none() && self.components.is_none() && self.webhooks.is_none() {
            violations.push(SchemaViolation::new(
                "",
                "at least one of `paths`, `components` or `webhooks` is required",
            ));
        }

        let mut walker = ReferenceWalker::new(&raw);
        walker.document(self);
        violations.extend(walker.violations);

        let operation_ids: Vec<&str> = self
            .operations()
            .filter_map(|(_, _, operation)| operation.operation_id.as_deref())
            .collect();
        if let Err(err) = operation_ids.validate_unique(|id| id.to_string(), "operationId values") {
            violations.push(SchemaViolation::new("/paths", err.to_string()));
        }

        if let Some(tags) = &self.tags {
            if let Err(err) = tags.validate_unique(|tag| tag.name.clone(), "tag names") {
                violations.push(SchemaViolation::new("/tags", err.to_string()));
            }
        }

        for (path, item) in self.paths.iter().flat_map(|paths| paths.iter()) {
            let item_path = format!("/paths/{}", escape_pointer_segment(path));
            unique_parameters(item.parameters.as_deref(), &item_path, &mut violations);
            for (method, operation) in item.operations() {
                unique_parameters(
                    operation.parameters.as_deref(),
                    &format!("{item_path}/{method}"),
                    &mut violations,
                );
            }
        }

        if violations.is_empty() {
            return Ok(());
        }
        debug!(violations = violations.len(), "document validation failed");
        Err(OpenApiError::type_check(Self::schema().id(), violations))
    }
}

fn unique_parameters(
    parameters: Option<&[RefOr<Parameter>]>,
    owner: &str,
    violations: &mut Vec<SchemaViolation>,
) {
    let inline: Vec<&Parameter> = parameters
        .unwrap_or_default()
        .iter()
        .filter_map(RefOr::as_value)
        .collect();
    if let Err(err) = inline.validate_unique(
        |parameter| format!("{} in {}", parameter.name, parameter.location),
        "parameters",
    ) {
        violations.push(SchemaViolation::new(format!("{owner}/parameters"), err.to_string()));
    }
}

/// Visits every reference in a typed document and records the ones that do
/// not resolve against the document's JSON form.
struct ReferenceWalker<'a> {
    root: &'a Value,
    violations: Vec<SchemaViolation>,
}

fn child(path: &str, segment: &str) -> String {
    format!("{path}/{}", escape_pointer_segment(segment))
}

impl<'a> ReferenceWalker<'a> {
    fn new(root: &'a Value) -> Self {
        Self {
            root,
            violations: Vec::new(),
        }
    }

    fn reference(&mut self, path: &str, reference: &Reference) {
        if let Err(err) = reference.resolve_in(self.root) {
            self.violations
                .push(SchemaViolation::new(child(path, "$ref"), err.to_string()));
        }
    }

    fn ref_or<T>(&mut self, path: &str, item: &RefOr<T>, visit: fn(&mut Self, &str, &T)) {
        match item {
            RefOr::Reference(reference) => self.reference(path, reference),
            RefOr::Value(value) => visit(self, path, value),
        }
    }

    fn map<T>(
        &mut self,
        path: &str,
        items: Option<&IndexMap<String, T>>,
        visit: fn(&mut Self, &str, &T),
    ) {
        for (key, value) in items.into_iter().flatten() {
            visit(self, &child(path, key), value);
        }
    }

    fn ref_map<T>(
        &mut self,
        path: &str,
        items: Option<&IndexMap<String, RefOr<T>>>,
        visit: fn(&mut Self, &str, &T),
    ) {
        for (key, item) in items.into_iter().flatten() {
            self.ref_or(&child(path, key), item, visit);
        }
    }

    fn document(&mut self, document: &OpenApi) {
        if let Some(paths) = &document.paths {
            for (key, item) in paths.iter() {
                self.path_item(&child("/paths", key), item);
            }
        }
        self.ref_map("/webhooks", document.webhooks.as_ref(), Self::path_item);
        if let Some(components) = &document.components {
            self.components("/components", components);
        }
    }

    fn components(&mut self, path: &str, components: &Components) {
        self.map(&child(path, "schemas"), components.schemas.as_ref(), Self::schema);
        self.ref_map(&child(path, "responses"), components.responses.as_ref(), Self::response);
        self.ref_map(&child(path, "parameters"), components.parameters.as_ref(), Self::parameter);
        self.ref_map(&child(path, "examples"), components.examples.as_ref(), |_, _, _| {});
        self.ref_map(
            &child(path, "requestBodies"),
            components.request_bodies.as_ref(),
            Self::request_body,
        );
        self.ref_map(&child(path, "headers"), components.headers.as_ref(), Self::header);
        self.ref_map(
            &child(path, "securitySchemes"),
            components.security_schemes.as_ref(),
            |_, _, _| {},
        );
        self.ref_map(&child(path, "links"), components.links.as_ref(), |_, _, _| {});
        self.ref_map(&child(path, "callbacks"), components.callbacks.as_ref(), Self::callback);
        self.ref_map(&child(path, "pathItems"), components.path_items.as_ref(), Self::path_item);
    }

    fn path_item(&mut self, path: &str, item: &PathItem) {
        if let Some(target) = &item.reference {
            match Reference::new(target.as_str()) {
                Ok(reference) => self.reference(path, &reference),
                Err(err) => self
                    .violations
                    .push(SchemaViolation::new(child(path, "$ref"), err.to_string())),
            }
        }
        self.parameters(&child(path, "parameters"), item.parameters.as_deref());
        for (method, operation) in item.operations() {
            self.operation(&child(path, method.as_str()), operation);
        }
    }

    fn operation(&mut self, path: &str, operation: &Operation) {
        self.parameters(&child(path, "parameters"), operation.parameters.as_deref());
        if let Some(body) = &operation.request_body {
            self.ref_or(&child(path, "requestBody"), body, Self::request_body);
        }
        if let Some(responses) = &operation.responses {
            let responses_path = child(path, "responses");
            for (status, response) in responses.iter() {
                self.ref_or(&child(&responses_path, status), response, Self::response);
            }
        }
        self.ref_map(&child(path, "callbacks"), operation.callbacks.as_ref(), Self::callback);
    }

    fn callback(&mut self, path: &str, callback: &Callback) {
        for (expression, item) in callback.iter() {
            self.ref_or(&child(path, expression), item, Self::path_item);
        }
    }

    fn parameters(&mut self, path: &str, parameters: Option<&[RefOr<Parameter>]>) {
        for (index, parameter) in parameters.unwrap_or_default().iter().enumerate() {
            self.ref_or(&child(path, &index.to_string()), parameter, Self::parameter);
        }
    }

    fn parameter(&mut self, path: &str, parameter: &Parameter) {
        if let Some(schema) = &parameter.schema {
            self.schema(&child(path, "schema"), schema);
        }
        self.ref_map(&child(path, "examples"), parameter.examples.as_ref(), |_, _, _| {});
        self.map(&child(path, "content"), parameter.content.as_ref(), Self::media_type);
    }

    fn header(&mut self, path: &str, header: &Header) {
        if let Some(schema) = &header.schema {
            self.schema(&child(path, "schema"), schema);
        }
        self.ref_map(&child(path, "examples"), header.examples.as_ref(), |_, _, _| {});
        self.map(&child(path, "content"), header.content.as_ref(), Self::media_type);
    }

    fn request_body(&mut self, path: &str, body: &RequestBody) {
        self.map(&child(path, "content"), Some(&body.content), Self::media_type);
    }

    fn response(&mut self, path: &str, response: &Response) {
        self.ref_map(&child(path, "headers"), response.headers.as_ref(), Self::header);
        self.map(&child(path, "content"), response.content.as_ref(), Self::media_type);
        self.ref_map(&child(path, "links"), response.links.as_ref(), |_, _, _| {});
    }

    fn media_type(&mut self, path: &str, media: &MediaType) {
        if let Some(schema) = &media.schema {
            self.schema(&child(path, "schema"), schema);
        }
        self.ref_map(&child(path, "examples"), media.examples.as_ref(), |_, _, _| {});
        self.map(&child(path, "encoding"), media.encoding.as_ref(), Self::encoding);
    }

    fn encoding(&mut self, path: &str, encoding: &Encoding) {
        self.ref_map(&child(path, "headers"), encoding.headers.as_ref(), Self::header);
    }

    /// Internal `$ref` strings anywhere inside a Schema Object. External
    /// references are legal JSON Schema and are left alone.
    fn schema(&mut self, path: &str, schema: &Schema) {
        self.schema_value(path, schema.as_value());
    }

    fn schema_value(&mut self, path: &str, value: &Value) {
        match value {
            Value::Object(object) => {
                for (key, nested) in object {
                    match (key.as_str(), nested) {
                        ("$ref", Value::String(target)) => {
                            if let Ok(reference) = Reference::new(target.as_str()) {
                                self.reference(path, &reference);
                            }
                        }
                        _ => self.schema_value(&child(path, key), nested),
                    }
                }
            }
            Value::Array(items) => {
                for (index, nested) in items.iter().enumerate() {
                    self.schema_value(&child(path, &index.to_string()), nested);
                }
            }
            _ => {}
        }
    }
}
