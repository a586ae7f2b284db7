//! Error types for OpenAPI document construction, validation and dereferencing.

use crate::validation::SchemaViolation;
use serde_json::Value;
use thiserror::Error;

const UNSUPPORTED_REFERENCE_PREFIX: &str = "Unsupported reference kind: ";

/// Errors that can occur when working with OpenAPI documents.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpenApiError {
    /// A `$ref` value is not an internal (`#/`-prefixed) pointer
    #[error(
        "Unsupported reference kind: {} (only internal `#/` references are supported)",
        quoted(.reference)
    )]
    UnsupportedReferenceKind {
        /// The rejected reference string
        reference: String,
    },

    /// A `$ref` path does not resolve against the supplied root
    #[error("Invalid reference `{reference}`: {message}")]
    InvalidReference {
        /// The reference string that failed to resolve
        reference: String,
        /// Why resolution failed
        message: String,
    },

    /// Dereference attempted with no root bound and none supplied
    #[error("Cannot dereference `{reference}`: no root document bound or supplied")]
    MissingRoot {
        /// The reference that could not be followed
        reference: String,
    },

    /// Raw input does not conform to a node's compiled schema
    #[error(
        "{node} failed type check with {} violation(s): {}",
        .violations.len(),
        summarize(.violations)
    )]
    TypeCheck {
        /// Schema identifier of the node being checked
        node: String,
        /// Every structural violation found, in validator order
        violations: Vec<SchemaViolation>,
    },

    /// Two distinct schemas in one reference closure share an identifier
    #[error(
        "Schema identifier collision: `{id}` is defined twice in the reference closure of `{root}`"
    )]
    SchemaIdentifierCollision {
        /// The shared identifier
        id: String,
        /// The schema whose closure was being assembled
        root: String,
    },

    /// The rendered schema was rejected by the validation engine
    #[error("Failed to compile validator for `{id}`: {message}")]
    SchemaCompile {
        /// Schema identifier of the root being compiled
        id: String,
        /// Engine error message
        message: String,
    },

    /// Error when parsing or serializing JSON
    #[error("JSON error: {message}")]
    JsonError {
        /// JSON parsing/serialization error message
        message: String,
    },

    /// Error when an object has duplicate keys that should be unique
    #[error("Duplicate key '{key}' found in {context}")]
    DuplicateKey {
        /// The duplicate key name
        key: String,
        /// Context where the duplicate was found
        context: String,
    },
}

/// JSON string literal for `text`, so it can be read back unambiguously.
fn quoted(text: &str) -> String {
    Value::from(text).to_string()
}

fn summarize(violations: &[SchemaViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl OpenApiError {
    /// Create a new unsupported reference kind error
    pub fn unsupported_reference(reference: impl Into<String>) -> Self {
        Self::UnsupportedReferenceKind {
            reference: reference.into(),
        }
    }

    /// Create a new invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            message: message.into(),
        }
    }

    /// Create a new missing root error
    pub fn missing_root(reference: impl Into<String>) -> Self {
        Self::MissingRoot {
            reference: reference.into(),
        }
    }

    /// Create a new type check error carrying every violation
    pub fn type_check(node: impl Into<String>, violations: Vec<SchemaViolation>) -> Self {
        Self::TypeCheck {
            node: node.into(),
            violations,
        }
    }

    /// Create a new identifier collision error
    pub fn collision(id: impl Into<String>, root: impl Into<String>) -> Self {
        Self::SchemaIdentifierCollision {
            id: id.into(),
            root: root.into(),
        }
    }

    /// Create a new schema compilation error
    pub fn schema_compile(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SchemaCompile {
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a new JSON error
    pub fn json(message: impl Into<String>) -> Self {
        Self::JsonError {
            message: message.into(),
        }
    }

    /// Create a new duplicate key error
    pub fn duplicate_key(key: impl Into<String>, context: impl Into<String>) -> Self {
        Self::DuplicateKey {
            key: key.into(),
            context: context.into(),
        }
    }

    /// Violations carried by a type check error, empty for every other kind.
    pub fn violations(&self) -> &[SchemaViolation] {
        match self {
            Self::TypeCheck { violations, .. } => violations,
            _ => &[],
        }
    }

    /// Map a serde error raised while materializing a node.
    ///
    /// The resolver runs inside `Deserialize`, where only a message survives;
    /// reference kind failures are recovered here so callers still see
    /// [`OpenApiError::UnsupportedReferenceKind`]. The reference is written
    /// as a JSON string literal, which is read back with its escapes.
    pub fn from_construction(err: serde_json::Error) -> Self {
        let message = err.to_string();
        message
            .strip_prefix(UNSUPPORTED_REFERENCE_PREFIX)
            .and_then(|rest| {
                serde_json::Deserializer::from_str(rest)
                    .into_iter::<String>()
                    .next()
            })
            .and_then(Result::ok)
            .map(Self::unsupported_reference)
            .unwrap_or_else(|| Self::json(message))
    }

    /// Convert into a serde error raised from inside a `Deserialize` impl.
    ///
    /// JSON errors pass their message through unwrapped so nested failures
    /// do not stack prefixes.
    pub(crate) fn into_de_error<E: serde::de::Error>(self) -> E {
        match self {
            Self::JsonError { message } => E::custom(message),
            other => E::custom(other),
        }
    }
}

impl From<serde_json::Error> for OpenApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err.to_string())
    }
}

/// Result type for OpenAPI operations
pub type OpenApiResult<T> = Result<T, OpenApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::Error as _;

    #[test]
    fn test_error_display() {
        let err = OpenApiError::unsupported_reference("http://example.com/x");
        assert_eq!(
            err.to_string(),
            r#"Unsupported reference kind: "http://example.com/x" (only internal `#/` references are supported)"#
        );

        let err = OpenApiError::missing_root("#/components/schemas/Pet");
        assert!(err.to_string().contains("#/components/schemas/Pet"));
    }

    #[test]
    fn test_type_check_lists_every_violation() {
        let err = OpenApiError::type_check(
            "Parameter",
            vec![
                SchemaViolation::new("", "\"name\" is a required property"),
                SchemaViolation::new("/in", "\"body\" is not one of the allowed values"),
            ],
        );

        assert_eq!(err.violations().len(), 2);
        let message = err.to_string();
        assert!(message.contains("2 violation(s)"));
        assert!(message.contains("/in"));
    }

    #[test]
    fn test_construction_error_recovers_reference_kind() {
        let inner = OpenApiError::unsupported_reference("other.yaml#/Pet");
        let serde_err = serde_json::Error::custom(inner.clone());

        assert_eq!(OpenApiError::from_construction(serde_err), inner);
    }

    #[test]
    fn test_construction_error_keeps_awkward_references_intact() {
        for reference in ["other.yaml#/`Pet`", "x\" (quoted)", "spaces and `ticks` `"] {
            let inner = OpenApiError::unsupported_reference(reference);
            let serde_err = serde_json::Error::custom(inner.clone());
            assert_eq!(OpenApiError::from_construction(serde_err), inner);
        }
    }

    #[test]
    fn test_construction_error_falls_back_to_json() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            OpenApiError::from_construction(serde_err),
            OpenApiError::JsonError { .. }
        ));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json");
        let err: OpenApiError = json_err.unwrap_err().into();
        assert!(matches!(err, OpenApiError::JsonError { .. }));
    }
}
