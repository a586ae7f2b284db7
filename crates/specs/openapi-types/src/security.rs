//! Security Scheme, OAuth Flows and Security Requirement Objects for OpenAPI.

use crate::node::impl_node;
use crate::schema::{NodeSchema, SchemaDef};
use crate::{Extensions, ParameterLocation};
use bon::Builder;
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::ops::Deref;
use std::sync::Arc;

static OAUTH_FLOW: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "OAuthFlow",
        SchemaDef::object()
            .optional("authorizationUrl", SchemaDef::string())
            .optional("tokenUrl", SchemaDef::string())
            .optional("refreshUrl", SchemaDef::string())
            .required("scopes", SchemaDef::record(SchemaDef::string()))
            .extensible(),
        vec![
            json!({
                "authorizationUrl": "https://example.com/api/oauth/dialog",
                "scopes": {
                    "write:pets": "modify pets in your account",
                    "read:pets": "read your pets"
                }
            }),
            json!({ "tokenUrl": "https://example.com/api/oauth/token", "scopes": {} }),
        ],
    )
});

static OAUTH_FLOWS: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "OAuthFlows",
        SchemaDef::object()
            .optional("implicit", SchemaDef::node(&OAUTH_FLOW))
            .optional("password", SchemaDef::node(&OAUTH_FLOW))
            .optional("clientCredentials", SchemaDef::node(&OAUTH_FLOW))
            .optional("authorizationCode", SchemaDef::node(&OAUTH_FLOW))
            .extensible(),
        vec![
            json!({
                "implicit": {
                    "authorizationUrl": "https://example.com/api/oauth/dialog",
                    "scopes": { "write:pets": "modify pets in your account" }
                },
                "authorizationCode": {
                    "authorizationUrl": "https://example.com/api/oauth/dialog",
                    "tokenUrl": "https://example.com/api/oauth/token",
                    "scopes": { "read:pets": "read your pets" }
                }
            }),
            json!({}),
        ],
    )
});

static SECURITY_SCHEME: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    let described = |kind: &str| {
        SchemaDef::object()
            .required("type", SchemaDef::literal(kind))
            .optional("description", SchemaDef::string())
    };

    NodeSchema::define(
        "SecurityScheme",
        SchemaDef::union(vec![
            described("apiKey")
                .required("name", SchemaDef::string())
                .required("in", SchemaDef::one_of_str(&["query", "header", "cookie"]))
                .extensible(),
            described("http")
                .required("scheme", SchemaDef::string())
                .optional("bearerFormat", SchemaDef::string())
                .extensible(),
            described("mutualTLS").extensible(),
            described("oauth2")
                .required("flows", SchemaDef::node(&OAUTH_FLOWS))
                .extensible(),
            described("openIdConnect")
                .required("openIdConnectUrl", SchemaDef::string())
                .extensible(),
        ]),
        vec![
            json!({ "type": "http", "scheme": "basic" }),
            json!({ "type": "apiKey", "name": "api-key", "in": "header" }),
            json!({ "type": "http", "scheme": "bearer", "bearerFormat": "JWT" }),
            json!({ "type": "mutualTLS", "description": "Client certificate required" }),
            json!({
                "type": "oauth2",
                "flows": {
                    "implicit": {
                        "authorizationUrl": "https://example.com/api/oauth/dialog",
                        "scopes": { "write:pets": "modify pets in your account" }
                    }
                }
            }),
            json!({
                "type": "openIdConnect",
                "openIdConnectUrl": "https://example.com/.well-known/openid-configuration"
            }),
        ],
    )
});

static SECURITY_REQUIREMENT: Lazy<Arc<NodeSchema>> = Lazy::new(|| {
    NodeSchema::define(
        "SecurityRequirement",
        SchemaDef::record(SchemaDef::array(SchemaDef::string())),
        vec![
            json!({ "api_key": [] }),
            json!({ "petstore_auth": ["write:pets", "read:pets"] }),
            json!({}),
        ],
    )
});

impl_node!(OAuthFlow, OAUTH_FLOW);
impl_node!(OAuthFlows, OAUTH_FLOWS);
impl_node!(SecurityScheme, SECURITY_SCHEME);
impl_node!(SecurityRequirement, SECURITY_REQUIREMENT);

/// Kind of security scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecuritySchemeType {
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "http")]
    Http,
    #[serde(rename = "mutualTLS")]
    MutualTls,
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "openIdConnect")]
    OpenIdConnect,
}

/// Defines a security scheme that can be used by the operations.
///
/// Which of the optional fields are required depends on `scheme_type`; the
/// node schema enforces the combinations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: SecuritySchemeType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Name of the header, query or cookie parameter (`apiKey`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Location of the API key (`apiKey`).
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<ParameterLocation>,

    /// HTTP Authorization scheme name (`http`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,

    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,

    /// Supported flow configuration (`oauth2`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows: Option<OAuthFlows>,

    #[serde(rename = "openIdConnectUrl", skip_serializing_if = "Option::is_none")]
    pub open_id_connect_url: Option<String>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl SecurityScheme {
    fn of(scheme_type: SecuritySchemeType) -> Self {
        Self {
            scheme_type,
            description: None,
            name: None,
            location: None,
            scheme: None,
            bearer_format: None,
            flows: None,
            open_id_connect_url: None,
            extensions: Extensions::new(),
        }
    }

    pub fn api_key(name: impl Into<String>, location: ParameterLocation) -> Self {
        Self {
            name: Some(name.into()),
            location: Some(location),
            ..Self::of(SecuritySchemeType::ApiKey)
        }
    }

    pub fn http(scheme: impl Into<String>) -> Self {
        Self {
            scheme: Some(scheme.into()),
            ..Self::of(SecuritySchemeType::Http)
        }
    }

    /// HTTP bearer authentication with a format hint such as `JWT`
    pub fn bearer(format: impl Into<String>) -> Self {
        Self {
            bearer_format: Some(format.into()),
            ..Self::http("bearer")
        }
    }

    pub fn mutual_tls() -> Self {
        Self::of(SecuritySchemeType::MutualTls)
    }

    pub fn oauth2(flows: OAuthFlows) -> Self {
        Self {
            flows: Some(flows),
            ..Self::of(SecuritySchemeType::OAuth2)
        }
    }

    pub fn open_id_connect(url: impl Into<String>) -> Self {
        Self {
            open_id_connect_url: Some(url.into()),
            ..Self::of(SecuritySchemeType::OpenIdConnect)
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
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

/// Configuration of the supported OAuth flows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct OAuthFlows {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implicit: Option<OAuthFlow>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<OAuthFlow>,

    #[serde(rename = "clientCredentials", skip_serializing_if = "Option::is_none")]
    pub client_credentials: Option<OAuthFlow>,

    #[serde(rename = "authorizationCode", skip_serializing_if = "Option::is_none")]
    pub authorization_code: Option<OAuthFlow>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl OAuthFlows {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_implicit(mut self, flow: OAuthFlow) -> Self {
        self.implicit = Some(flow);
        self
    }

    pub fn with_password(mut self, flow: OAuthFlow) -> Self {
        self.password = Some(flow);
        self
    }

    pub fn with_client_credentials(mut self, flow: OAuthFlow) -> Self {
        self.client_credentials = Some(flow);
        self
    }

    pub fn with_authorization_code(mut self, flow: OAuthFlow) -> Self {
        self.authorization_code = Some(flow);
        self
    }
}

/// Configuration details for one OAuth flow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
pub struct OAuthFlow {
    #[serde(rename = "authorizationUrl", skip_serializing_if = "Option::is_none")]
    pub authorization_url: Option<String>,

    #[serde(rename = "tokenUrl", skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,

    #[serde(rename = "refreshUrl", skip_serializing_if = "Option::is_none")]
    pub refresh_url: Option<String>,

    /// Available scopes mapped to a short description. May be empty.
    #[builder(default)]
    pub scopes: IndexMap<String, String>,

    #[serde(flatten, skip_serializing_if = "Extensions::is_empty")]
    #[builder(default)]
    pub extensions: Extensions,
}

impl OAuthFlow {
    /// Flow with an authorization endpoint (`implicit`)
    pub fn implicit(authorization_url: impl Into<String>) -> Self {
        Self {
            authorization_url: Some(authorization_url.into()),
            ..Self::default()
        }
    }

    /// Flow with only a token endpoint (`password`, `clientCredentials`)
    pub fn token(token_url: impl Into<String>) -> Self {
        Self {
            token_url: Some(token_url.into()),
            ..Self::default()
        }
    }

    pub fn authorization_code(
        authorization_url: impl Into<String>,
        token_url: impl Into<String>,
    ) -> Self {
        Self {
            token_url: Some(token_url.into()),
            ..Self::implicit(authorization_url)
        }
    }

    pub fn with_refresh_url(mut self, refresh_url: impl Into<String>) -> Self {
        self.refresh_url = Some(refresh_url.into());
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>, description: impl Into<String>) -> Self {
        self.scopes.insert(scope.into(), description.into());
        self
    }
}

/// Security schemes required to execute an operation, mapped to the scopes
/// they need. An empty requirement makes security optional.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityRequirement(IndexMap<String, Vec<String>>);

impl SecurityRequirement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requirement on a single scheme
    pub fn scheme<S: Into<String>>(
        name: impl Into<String>,
        scopes: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::new().with_scheme(name, scopes)
    }

    pub fn with_scheme<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        scopes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.0
            .insert(name.into(), scopes.into_iter().map(Into::into).collect());
        self
    }
}

impl Deref for SecurityRequirement {
    type Target = IndexMap<String, Vec<String>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
