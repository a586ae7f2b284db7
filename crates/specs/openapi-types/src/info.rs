//! Info Object and related types for OpenAPI.
//!
//! The Info object provides metadata about the API.

use crate::Extensions;
use crate::node::impl_node;
use crate::schema::{NodeSchema, SchemaDef};
use bon::Builder;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

static CONTACT: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Contact",
        SchemaDef::object()
            .optional("name", SchemaDef::string())
            .optional("url", SchemaDef::string())
            .optional("email", SchemaDef::string())
            .extensible(),
        vec![
            json!({
                "name": "API Support",
                "url": "https://www.example.com/support",
                "email": "support@example.com"
            }),
            json!({}),
        ],
    )
});

static LICENSE: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "License",
        SchemaDef::object()
            .required("name", SchemaDef::string())
            .optional("identifier", SchemaDef::string())
            .optional("url", SchemaDef::string())
            .exclusive("identifier", "url")
            .extensible(),
        vec![
            json!({ "name": "Apache 2.0", "identifier": "Apache-2.0" }),
            json!({ "name": "MIT", "url": "https://opensource.org/licenses/MIT" }),
        ],
    )
});

static INFO: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "Info",
        SchemaDef::object()
            .required("title", SchemaDef::string())
            .optional("summary", SchemaDef::string())
            .optional("description", SchemaDef::string())
            .optional("termsOfService", SchemaDef::string())
            .optional("contact", SchemaDef::node(&CONTACT))
            .optional("license", SchemaDef::node(&LICENSE))
            .required("version", SchemaDef::string())
            .extensible(),
        vec![
            json!({ "title": "Sample Pet Store App", "version": "1.0.1" }),
            json!({
                "title": "Sample Pet Store App",
                "summary": "A pet store manager.",
                "description": "This is a sample server for a pet store.",
                "termsOfService": "https://example.com/terms/",
                "contact": { "name": "API Support", "email": "support@example.com" },
                "license": { "name": "Apache 2.0", "identifier": "Apache-2.0" },
                "version": "1.0.1"
            }),
        ],
    )
});

impl_node!(Contact, CONTACT);
impl_node!(License, LICENSE);
impl_node!(Info, INFO);

/// The object provides metadata about the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct Info {
    /// The title of the API.
    pub title: String,

    /// A short summary of the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    /// A description of the API. CommonMark syntax MAY be used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// A URL to the Terms of Service for the API.
    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    /// The contact information for the exposed API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    /// The license information for the exposed API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,

    /// The version of the OpenAPI document (distinct from the OpenAPI
    /// Specification version or the API implementation version).
    pub version: String,

    /// Specification extensions
    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Info {
    /// Create a new Info object with required fields
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            summary: None,
            description: None,
            terms_of_service: None,
            contact: None,
            license: None,
            version: version.into(),
            extensions: Extensions::new(),
        }
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_terms_of_service(mut self, terms_of_service: impl Into<String>) -> Self {
        self.terms_of_service = Some(terms_of_service.into());
        self
    }

    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    pub fn with_license(mut self, license: License) -> Self {
        self.license = Some(license);
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

/// Contact information for the exposed API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct Contact {
    /// The identifying name of the contact person/organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// The URL pointing to the contact information.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// The email address of the contact person/organization.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl Contact {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// License information for the exposed API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct License {
    /// The license name used for the API.
    pub name: String,

    /// An SPDX license expression. Mutually exclusive with `url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// A URL to the license used for the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl License {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            url: None,
            extensions: Extensions::new(),
        }
    }

    /// Set the SPDX identifier, dropping any `url`
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self.url = None;
        self
    }

    /// Set the license URL, dropping any `identifier`
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self.identifier = None;
        self
    }

    pub fn mit() -> Self {
        Self::new("MIT").with_identifier("MIT")
    }

    pub fn apache2() -> Self {
        Self::new("Apache 2.0").with_identifier("Apache-2.0")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Node, OpenApiError};

    #[test]
    fn test_info_builder_methods() {
        let info = Info::new("Test API", "1.0.0")
            .with_description("A test API")
            .with_contact(Contact::new().with_name("John Doe").with_email("john@example.com"))
            .with_license(License::mit())
            .with_extension("x-audience", "internal");

        assert_eq!(info.title, "Test API");
        assert_eq!(info.contact.as_ref().unwrap().name.as_deref(), Some("John Doe"));
        assert_eq!(info.license.as_ref().unwrap().identifier.as_deref(), Some("MIT"));
        assert!(info.revalidate().is_ok());
    }

    #[test]
    fn test_json_keeps_declaration_order_and_omits_absent_fields() {
        let info = Info::new("Pets", "2.0.0").with_summary("Pet store");
        assert_eq!(
            serde_json::to_string(&info.json().unwrap()).unwrap(),
            r#"{"title":"Pets","summary":"Pet store","version":"2.0.0"}"#
        );
    }

    #[test]
    fn test_info_from_value_reports_every_missing_field() {
        let err = Info::from_value(&json!({ "description": "no title" })).unwrap_err();
        assert!(matches!(err, OpenApiError::TypeCheck { .. }));
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn test_unknown_keys_are_rejected_but_extensions_pass() {
        assert!(!Info::check(&json!({ "title": "t", "version": "1", "color": "red" })));

        let info =
            Info::from_value(&json!({ "title": "t", "version": "1", "x-logo": { "url": "l.png" } }))
                .unwrap();
        assert_eq!(info.extensions.get("x-logo"), Some(&json!({ "url": "l.png" })));
    }

    #[test]
    fn test_bon_builder() {
        let license = License::builder()
            .name("Apache 2.0".to_string())
            .url("https://www.apache.org/licenses/LICENSE-2.0.html".to_string())
            .build();
        assert!(license.identifier.is_none());
        assert!(license.revalidate().is_ok());

        let switched = license.clone().with_identifier("Apache-2.0");
        assert_eq!(switched.url, None);
        assert!(license.url.is_some());
    }
}
