//! Validation traits and structured violation records.

use crate::error::{OpenApiError, OpenApiResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A single structural violation reported by a compiled validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaViolation {
    /// JSON pointer to the offending value inside the checked input
    pub path: String,
    /// Human-readable description of the violation
    pub message: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "(root): {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Trait for validating OpenAPI objects beyond their structural schema.
pub trait Validate {
    /// Validate this object against OpenAPI specification constraints.
    ///
    /// Returns `Ok(())` if valid, or an `OpenApiError` describing every problem found.
    fn validate(&self) -> OpenApiResult<()>;
}

/// Trait for validating collections with uniqueness constraints.
pub trait ValidateUnique<T> {
    /// Validate that all items in this collection have unique keys according to
    /// the provided key function.
    fn validate_unique<K, F>(&self, key_fn: F, context: &str) -> OpenApiResult<()>
    where
        K: std::hash::Hash + Eq + Clone + std::fmt::Display,
        F: Fn(&T) -> K;
}

impl<T> ValidateUnique<T> for [T] {
    fn validate_unique<K, F>(&self, key_fn: F, context: &str) -> OpenApiResult<()>
    where
        K: std::hash::Hash + Eq + Clone + std::fmt::Display,
        F: Fn(&T) -> K,
    {
        let mut seen = HashSet::new();
        for item in self {
            let key = key_fn(item);
            if !seen.insert(key.clone()) {
                return Err(OpenApiError::duplicate_key(key.to_string(), context));
            }
        }
        Ok(())
    }
}

/// Escape a single JSON pointer segment (`~` and `/`).
pub(crate) fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_display() {
        let violation = SchemaViolation::new("/paths/~1pets/get", "\"responses\" is invalid");
        assert_eq!(
            violation.to_string(),
            "/paths/~1pets/get: \"responses\" is invalid"
        );

        let violation = SchemaViolation::new("", "\"info\" is a required property");
        assert_eq!(
            violation.to_string(),
            "(root): \"info\" is a required property"
        );
    }

    #[test]
    fn test_validate_unique() {
        let items = vec!["a", "b", "c"];
        assert!(items.validate_unique(|s| *s, "test context").is_ok());

        let items = vec!["a", "b", "a"];
        let err = items.validate_unique(|s| *s, "test context").unwrap_err();
        assert_eq!(err, OpenApiError::duplicate_key("a", "test context"));
    }

    #[test]
    fn test_escape_pointer_segment() {
        assert_eq!(escape_pointer_segment("/pets/{id}"), "~1pets~1{id}");
        assert_eq!(escape_pointer_segment("a~b"), "a~0b");
    }
}
