//! Server Object and related types for OpenAPI.

use crate::Extensions;
use crate::node::impl_node;
use crate::schema::{NodeSchema, SchemaDef};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

static SERVER_VARIABLE: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "ServerVariable",
        SchemaDef::object()
            .optional("enum", SchemaDef::array(SchemaDef::string()))
            .required("default", SchemaDef::string())
            .optional("description", SchemaDef::string())
            .extensible(),
        vec![
            json!({ "default": "8443", "enum": ["8443", "443"] }),
            json!({ "default": "v2", "description": "API version" }),
        ],
    )
});

static SERVER: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Server",
        SchemaDef::object()
            .required("url", SchemaDef::string())
            .optional("description", SchemaDef::string())
            .optional(
                "variables",
                SchemaDef::record(SchemaDef::node(&SERVER_VARIABLE)),
            )
            .extensible(),
        vec![
            json!({ "url": "https://development.gigantic-server.com/v1" }),
            json!({
                "url": "https://{username}.gigantic-server.com:{port}/{basePath}",
                "description": "The production API server",
                "variables": {
                    "username": { "default": "demo" },
                    "port": { "enum": ["8443", "443"], "default": "8443" },
                    "basePath": { "default": "v2" }
                }
            }),
        ],
    )
});

impl_node!(ServerVariable, SERVER_VARIABLE);
impl_node!(Server, SERVER);

/// An object representing a server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Server {
    /// A URL to the target host. Variable substitutions are written in `{braces}`.
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Variables used for substitution in the server's URL template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<IndexMap<String, ServerVariable>>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: None,
            extensions: Extensions::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a URL template variable
    pub fn with_variable(mut self, name: impl Into<String>, variable: ServerVariable) -> Self {
        self.variables
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), variable);
        self
    }

    /// Substitute every variable's default value into the URL template.
    pub fn default_url(&self) -> String {
        let mut url = self.url.clone();
        for (name, variable) in self.variables.iter().flatten() {
            url = url.replace(&format!("{{{name}}}"), &variable.default);
        }
        url
    }
}

/// An object representing a Server Variable for server URL template substitution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ServerVariable {
    /// Allowed substitution values. MUST NOT be empty when present.
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    /// The default value to use for substitution.
    pub default: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl ServerVariable {
    pub fn new(default: impl Into<String>) -> Self {
        Self {
            enum_values: None,
            default: default.into(),
            description: None,
            extensions: Extensions::new(),
        }
    }

    pub fn with_enum(mut self, values: Vec<String>) -> Self {
        self.enum_values = Some(values);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Node;

    #[test]
    fn test_default_url() {
        let server = Server::new("https://{env}.example.com:{port}/v1")
            .with_variable("env", ServerVariable::new("staging"))
            .with_variable(
                "port",
                ServerVariable::new("8443").with_enum(vec!["8443".into(), "443".into()]),
            );

        assert_eq!(server.default_url(), "https://staging.example.com:8443/v1");
        assert_eq!(Server::new("/").default_url(), "/");
    }

    #[test]
    fn test_variables_keep_insertion_order() {
        let server = Server::new("https://{b}.{a}.example.com")
            .with_variable("b", ServerVariable::new("x"))
            .with_variable("a", ServerVariable::new("y"));

        let names: Vec<&String> = server.variables.as_ref().unwrap().keys().collect();
        assert_eq!(names, ["b", "a"]);
        assert_eq!(Server::from_value(&server.json().unwrap()).unwrap(), server);
    }

    #[test]
    fn test_variable_requires_default() {
        assert!(!ServerVariable::check(&json!({ "enum": ["a"] })));
        assert!(!Server::check(&json!({ "url": "/", "variables": { "v": {} } })));
    }
}
