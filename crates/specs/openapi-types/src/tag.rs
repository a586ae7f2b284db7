//! Tag Object and External Documentation Object for OpenAPI.

use crate::Extensions;
use crate::node::impl_node;
use crate::schema::{NodeSchema, SchemaDef};
use bon::Builder;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

static EXTERNAL_DOCS: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "ExternalDocumentation",
        SchemaDef::object()
            .optional("description", SchemaDef::string())
            .required("url", SchemaDef::string())
            .extensible(),
        vec![json!({
            "description": "Find more info here",
            "url": "https://example.com"
        })],
    )
});

static TAG: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Tag",
        SchemaDef::object()
            .required("name", SchemaDef::string())
            .optional("description", SchemaDef::string())
            .optional("externalDocs", SchemaDef::node(&EXTERNAL_DOCS))
            .extensible(),
        vec![
            json!({ "name": "pet", "description": "Pets operations" }),
            json!({
                "name": "store",
                "externalDocs": { "url": "https://example.com/store" }
            }),
        ],
    )
});

impl_node!(ExternalDocumentation, EXTERNAL_DOCS);
impl_node!(Tag, TAG);

/// Adds metadata to a single tag that is used by the Operation Object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Tag {
    /// The name of the tag.
    pub name: String,

    /// A description for the tag. CommonMark syntax MAY be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Additional external documentation for this tag.
    #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocumentation>,

    /// Specification extensions
    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Tag {
    /// Create a new Tag with required name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            external_docs: None,
            extensions: Extensions::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
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
    pub fn with_extension(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extensions.insert(key, value);
        self
    }
}

/// Allows referencing an external resource for extended documentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct ExternalDocumentation {
    /// A description of the target documentation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The URL for the target documentation.
    pub url: String,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl ExternalDocumentation {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            description: None,
            url: url.into(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
