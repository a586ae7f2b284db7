//! Paths Object and Path Item Object for OpenAPI.

use crate::node::{Node, impl_node};
use crate::operation::operation_shape;
use crate::patterned::PatternedMap;
use crate::resolve::reference_or;
use crate::schema::{NodeSchema, SchemaDef};
use crate::tree;
use crate::{Extensions, OpenApiError, Operation, Parameter, RefOr, Server};
use bon::Builder;
use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Value, json};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

static PATH_ITEM: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::recursive(
        "PathItem",
        vec![
            json!({
                "summary": "Pets",
                "get": {
                    "operationId": "listPets",
                    "responses": { "200": { "description": "A list of pets" } }
                },
                "parameters": [{ "$ref": "#/components/parameters/limit" }]
            }),
            json!({ "$ref": "#/components/pathItems/Pets", "description": "shared" }),
            json!({
                "post": {
                    "callbacks": {
                        "onEvent": {
                            "{$request.body#/callbackUrl}": {
                                "post": { "responses": { "200": { "description": "ok" } } }
                            }
                        }
                    }
                }
            }),
        ],
        |this| path_item_shape(operation_shape(this)),
    )
});

static PATHS: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Paths",
        SchemaDef::patterned_record("^/", SchemaDef::node(PathItem::schema())).extensible(),
        vec![
            json!({
                "/pets": {
                    "get": { "responses": { "200": { "description": "A list of pets." } } }
                }
            }),
            json!({}),
        ],
    )
});

impl_node!(PathItem, PATH_ITEM, tree::path_item);
impl_node!(Paths, PATHS);

/// Path Item body whose HTTP method fields hold the given operation shape.
pub(crate) fn path_item_shape(operation: SchemaDef) -> SchemaDef {
    HttpMethod::ALL
        .iter()
        .fold(
            SchemaDef::object()
                .optional("$ref", SchemaDef::string())
                .optional("summary", SchemaDef::string())
                .optional("description", SchemaDef::string()),
            |def, method| def.optional(method.as_str(), operation.clone()),
        )
        .optional("servers", SchemaDef::array(SchemaDef::node(Server::schema())))
        .optional(
            "parameters",
            SchemaDef::array(reference_or(SchemaDef::node(Parameter::schema()))),
        )
        .extensible()
}

/// HTTP methods a Path Item can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Trace,
}

impl HttpMethod {
    /// Every method, in Path Item field order
    pub const ALL: [HttpMethod; 8] = [
        Self::Get,
        Self::Put,
        Self::Post,
        Self::Delete,
        Self::Options,
        Self::Head,
        Self::Patch,
        Self::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Describes the operations available on a single path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Builder)]
pub struct PathItem {
    /// Reference to another Path Item definition.
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,

    /// Alternative servers for all operations on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servers: Option<Vec<Server>>,

    /// Parameters applicable to all operations on this path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<RefOr<Parameter>>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl PathItem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set or replace the operation for `method`
    pub fn with_operation(mut self, method: HttpMethod, operation: Operation) -> Self {
        *self.slot(method) = Some(operation);
        self
    }

    pub fn with_get(self, operation: Operation) -> Self {
        self.with_operation(HttpMethod::Get, operation)
    }

    pub fn with_post(self, operation: Operation) -> Self {
        self.with_operation(HttpMethod::Post, operation)
    }

    pub fn with_put(self, operation: Operation) -> Self {
        self.with_operation(HttpMethod::Put, operation)
    }

    pub fn with_delete(self, operation: Operation) -> Self {
        self.with_operation(HttpMethod::Delete, operation)
    }

    pub fn with_server(mut self, server: Server) -> Self {
        self.servers.get_or_insert_with(Vec::new).push(server);
        self
    }

    pub fn with_parameter(mut self, parameter: impl Into<RefOr<Parameter>>) -> Self {
        self.parameters
            .get_or_insert_with(Vec::new)
            .push(parameter.into());
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

    /// The operation declared for `method`
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }

    /// Declared operations in method order
    pub fn operations(&self) -> impl Iterator<Item = (HttpMethod, &Operation)> {
        HttpMethod::ALL
            .into_iter()
            .filter_map(|method| self.operation(method).map(|operation| (method, operation)))
    }

    fn slot(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
        }
    }
}

impl<'de> Deserialize<'de> for PathItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        tree::path_item(&raw).map_err(OpenApiError::into_de_error)
    }
}

/// Relative paths to the individual endpoints and their operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Paths(PatternedMap<PathItem>);

impl Paths {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path template such as `/pets/{petId}`
    pub fn with_path(self, path: impl Into<String>, item: PathItem) -> Self {
        Self(self.0.with_entry(path, item))
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

impl Deref for Paths {
    type Target = PatternedMap<PathItem>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
