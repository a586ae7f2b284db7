//! Reference Object for OpenAPI.
//!
//! A simple object to allow referencing other components in the same
//! document. Only internal references (`#/...`) are supported.

use crate::error::{OpenApiError, OpenApiResult};
use crate::node::{Node, impl_node};
use crate::schema::{NodeSchema, SchemaDef};
use crate::validation::escape_pointer_segment;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::{Arc, Weak};
use tracing::trace;

const INTERNAL_PREFIX: &str = "#/";

static SCHEMA: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Reference",
        SchemaDef::object()
            .required("$ref", SchemaDef::string())
            .optional("summary", SchemaDef::string())
            .optional("description", SchemaDef::string())
            .open(),
        vec![
            json!({ "$ref": "#/components/schemas/Pet" }),
            json!({
                "$ref": "#/components/responses/NotFound",
                "summary": "Not found",
                "description": "Returned when the resource does not exist"
            }),
        ],
    )
});

impl_node!(Reference, SCHEMA);

/// A pointer to another location in the same document.
///
/// A reference may be bound to a root document for later dereferencing. The
/// binding is a weak lookup aid: it is never serialized, it does not keep the
/// root alive, and it carries over to the copies `with_*` methods return.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawReference")]
pub struct Reference {
    #[serde(rename = "$ref")]
    reference: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,

    #[serde(skip)]
    root: Option<Weak<Value>>,
}

#[derive(Deserialize)]
struct RawReference {
    #[serde(rename = "$ref")]
    reference: String,
    summary: Option<String>,
    description: Option<String>,
}

impl TryFrom<RawReference> for Reference {
    type Error = OpenApiError;

    fn try_from(raw: RawReference) -> OpenApiResult<Self> {
        let mut reference = Reference::new(raw.reference)?;
        reference.summary = raw.summary;
        reference.description = raw.description;
        Ok(reference)
    }
}

impl PartialEq for Reference {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
            && self.summary == other.summary
            && self.description == other.description
    }
}

impl Reference {
    /// Create a reference, rejecting anything but an internal `#/` pointer.
    pub fn new(reference: impl Into<String>) -> OpenApiResult<Self> {
        let reference = reference.into();
        if !reference.starts_with(INTERNAL_PREFIX) {
            return Err(OpenApiError::unsupported_reference(reference));
        }
        Ok(Self {
            reference,
            summary: None,
            description: None,
            root: None,
        })
    }

    /// Create a reference to `#/components/{kind}/{name}`
    pub fn component(kind: &str, name: &str) -> Self {
        Self {
            reference: format!(
                "#/components/{}/{}",
                escape_pointer_segment(kind),
                escape_pointer_segment(name)
            ),
            summary: None,
            description: None,
            root: None,
        }
    }

    pub fn schema_component(name: &str) -> Self {
        Self::component("schemas", name)
    }

    pub fn response_component(name: &str) -> Self {
        Self::component("responses", name)
    }

    pub fn parameter_component(name: &str) -> Self {
        Self::component("parameters", name)
    }

    pub fn path_item_component(name: &str) -> Self {
        Self::component("pathItems", name)
    }

    /// The `$ref` string
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The bound root, if one was attached and is still alive
    pub fn root(&self) -> Option<Arc<Value>> {
        self.root.as_ref().and_then(Weak::upgrade)
    }

    /// Point at a different location, keeping summary, description and root.
    pub fn with_ref(mut self, reference: impl Into<String>) -> OpenApiResult<Self> {
        let reference = reference.into();
        if !reference.starts_with(INTERNAL_PREFIX) {
            return Err(OpenApiError::unsupported_reference(reference));
        }
        self.reference = reference;
        Ok(self)
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Bind a root document for later [`Reference::dereference`] calls.
    pub fn with_root(mut self, root: &Arc<Value>) -> Self {
        self.root = Some(Arc::downgrade(root));
        self
    }

    /// JSON pointer part of the reference, without the leading `#`
    pub fn pointer(&self) -> &str {
        &self.reference[1..]
    }

    /// Locate the referenced value inside `root`.
    pub fn resolve_in<'a>(&self, root: &'a Value) -> OpenApiResult<&'a Value> {
        trace!(reference = %self.reference, "dereferencing");
        root.pointer(self.pointer()).ok_or_else(|| {
            OpenApiError::invalid_reference(
                &self.reference,
                "path does not resolve to a value in the root document",
            )
        })
    }

    /// Resolve against `root`, or the bound root when `root` is `None`.
    pub fn dereference(&self, root: Option<&Value>) -> OpenApiResult<Value> {
        if let Some(root) = root {
            return self.resolve_in(root).cloned();
        }
        let bound = self
            .root()
            .ok_or_else(|| OpenApiError::missing_root(&self.reference))?;
        self.resolve_in(&bound).cloned()
    }

    /// Dereference and build the target as a typed node.
    pub fn dereference_as<T: Node>(&self, root: Option<&Value>) -> OpenApiResult<T> {
        T::from_value(&self.dereference(root)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn petstore_root() -> Value {
        json!({
            "components": {
                "schemas": {
                    "Pet": { "type": "object" },
                    "a/b": { "type": "string" }
                }
            }
        })
    }

    #[test]
    fn test_external_reference_is_rejected() {
        let err = Reference::new("http://example.com/x").unwrap_err();
        assert_eq!(err, OpenApiError::unsupported_reference("http://example.com/x"));

        assert!(Reference::new("other.yaml#/components/schemas/Pet").is_err());
        assert!(Reference::new("#components").is_err());
    }

    #[test]
    fn test_deserialization_enforces_internal_references() {
        let raw = json!({ "$ref": "#/components/schemas/Pet", "summary": "A pet" });
        let reference: Reference = serde_json::from_value(raw).unwrap();
        assert_eq!(reference.summary(), Some("A pet"));

        let err = serde_json::from_value::<Reference>(json!({ "$ref": "https://x.io/s.json" }))
            .unwrap_err();
        assert!(matches!(
            OpenApiError::from_construction(err),
            OpenApiError::UnsupportedReferenceKind { .. }
        ));
    }

    #[test]
    fn test_dereference() {
        let root = petstore_root();
        let pet = Reference::schema_component("Pet");
        assert_eq!(pet.dereference(Some(&root)).unwrap(), json!({ "type": "object" }));

        let missing = Reference::schema_component("Missing");
        assert!(matches!(
            missing.dereference(Some(&root)),
            Err(OpenApiError::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_dereference_escaped_segments() {
        let root = petstore_root();
        let reference = Reference::schema_component("a/b");
        assert_eq!(reference.reference(), "#/components/schemas/a~1b");
        assert_eq!(
            reference.dereference(Some(&root)).unwrap(),
            json!({ "type": "string" })
        );
    }

    #[test]
    fn test_bound_root_and_missing_root() {
        let reference = Reference::schema_component("Pet");
        assert_eq!(
            reference.dereference(None).unwrap_err(),
            OpenApiError::missing_root("#/components/schemas/Pet")
        );

        let root = Arc::new(petstore_root());
        let bound = reference.with_root(&root);
        assert_eq!(bound.dereference(None).unwrap(), json!({ "type": "object" }));

        // Explicit root wins over the bound one.
        let other = json!({ "components": { "schemas": { "Pet": true } } });
        assert_eq!(bound.dereference(Some(&other)).unwrap(), json!(true));

        drop(root);
        assert!(matches!(
            bound.dereference(None),
            Err(OpenApiError::MissingRoot { .. })
        ));
    }

    #[test]
    fn test_with_methods_carry_root_forward() {
        let root = Arc::new(petstore_root());
        let original = Reference::schema_component("Missing").with_root(&root);

        let retargeted = original
            .clone()
            .with_summary("pet")
            .with_ref("#/components/schemas/Pet")
            .unwrap();
        assert!(retargeted.root().is_some());
        assert_eq!(retargeted.dereference(None).unwrap(), json!({ "type": "object" }));

        assert_eq!(original.reference(), "#/components/schemas/Missing");
        assert_eq!(original.summary(), None);
        assert!(original.clone().with_ref("https://elsewhere").is_err());
    }

    #[test]
    fn test_json_excludes_root() {
        let root = Arc::new(petstore_root());
        let reference = Reference::schema_component("Pet")
            .with_description("The pet")
            .with_root(&root);

        assert_eq!(
            reference.json().unwrap(),
            json!({ "$ref": "#/components/schemas/Pet", "description": "The pet" })
        );
        assert_eq!(reference, Reference::schema_component("Pet").with_description("The pet"));
    }

    #[test]
    fn test_from_value_checks_shape() {
        assert!(Reference::from_value(&json!({ "summary": "no ref" })).is_err());
        assert!(Reference::from_value(&json!({ "$ref": 42 })).is_err());

        let reference = Reference::from_value(&json!({ "$ref": "#/paths/~1pets" })).unwrap();
        assert_eq!(reference.pointer(), "/paths/~1pets");
    }
}
