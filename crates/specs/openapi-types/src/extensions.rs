//! Specification Extensions support for OpenAPI.
//!
//! Most OpenAPI objects may be extended with patterned fields whose names
//! begin with `x-`. Extensions keep their insertion order.

use crate::error::{OpenApiError, OpenApiResult};
use crate::validation::{SchemaViolation, Validate};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix every extension key must carry.
pub const EXTENSION_PREFIX: &str = "x-";

/// Whether `key` names a specification extension
pub fn is_extension_key(key: &str) -> bool {
    key.starts_with(EXTENSION_PREFIX)
}

/// A map of extension fields that can be added to any extensible OpenAPI object.
///
/// The value can be null, a primitive, an array or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Extensions(IndexMap<String, Value>);

impl Extensions {
    /// Create a new empty extensions map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an extension field
    ///
    /// # Panics
    ///
    /// Panics if `key` does not start with `x-`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let key = key.into();
        if !is_extension_key(&key) {
            panic!("Extension keys must start with 'x-': {}", key);
        }
        self.0.insert(key, value.into());
        self
    }

    /// Insert an extension field, failing on a key without the `x-` prefix
    pub fn try_insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> OpenApiResult<&mut Self> {
        let key = key.into();
        if !is_extension_key(&key) {
            return Err(OpenApiError::type_check(
                "Extensions",
                vec![SchemaViolation::new(
                    format!("/{}", crate::validation::escape_pointer_segment(&key)),
                    format!("Extension key must start with 'x-': {key}"),
                )],
            ));
        }
        self.0.insert(key, value.into());
        Ok(self)
    }

    /// Extension fields of a raw object, every other key skipped
    pub(crate) fn of_object(object: &Map<String, Value>) -> Self {
        Self(
            object
                .iter()
                .filter(|(key, _)| is_extension_key(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        )
    }

    /// Get an extension field value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove an extension field, keeping the order of the others
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge another extensions map into this one
    pub fn merge(&mut self, other: Extensions) {
        self.0.extend(other.0);
    }

    /// Create an Extensions map from an ordered map, rejecting non-`x-` keys
    pub fn from_map(map: IndexMap<String, Value>) -> OpenApiResult<Self> {
        let extensions = Self(map);
        extensions.validate()?;
        Ok(extensions)
    }

    pub fn into_map(self) -> IndexMap<String, Value> {
        self.0
    }

    /// Builder pattern for adding extensions
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Fallible form of [`Extensions::with`]
    pub fn try_with(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> OpenApiResult<Self> {
        self.try_insert(key, value)?;
        Ok(self)
    }
}

impl Validate for Extensions {
    fn validate(&self) -> OpenApiResult<()> {
        let violations: Vec<SchemaViolation> = self
            .0
            .keys()
            .filter(|key| !is_extension_key(key) || key.len() <= EXTENSION_PREFIX.len())
            .map(|key| {
                SchemaViolation::new(
                    format!("/{}", crate::validation::escape_pointer_segment(key)),
                    format!("Extension key must start with 'x-' and have content: {key}"),
                )
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(OpenApiError::type_check("Extensions", violations))
        }
    }
}

impl IntoIterator for Extensions {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Extensions {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Helper macro for creating extensions
#[macro_export]
macro_rules! extensions {
    () => {
        $crate::Extensions::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut ext = $crate::Extensions::new();
        $(
            ext.insert($key, $value);
        )+
        ext
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    #[should_panic(expected = "Extension keys must start with 'x-'")]
    fn test_invalid_extension_key() {
        let mut ext = Extensions::new();
        ext.insert("invalid-key", "value");
    }

    #[test]
    fn test_try_insert_rejects_without_panicking() {
        let mut ext = Extensions::new();
        let err = ext.try_insert("invalid-key", "value").unwrap_err();
        assert_eq!(err.violations()[0].path, "/invalid-key");
        assert!(ext.is_empty());

        let ext = Extensions::new().try_with("x-ok", 1).unwrap();
        assert_eq!(ext.get("x-ok"), Some(&json!(1)));
        assert!(Extensions::new().try_with("nope", 1).is_err());
    }

    #[test]
    fn test_extensions_validation() {
        let ext = Extensions::new().with("x-valid", "value");
        assert!(ext.validate().is_ok());

        let invalid = Extensions(IndexMap::from([("invalid".to_string(), json!("value"))]));
        assert_eq!(invalid.validate().unwrap_err().violations().len(), 1);

        let short = Extensions(IndexMap::from([("x-".to_string(), json!("value"))]));
        assert!(short.validate().is_err());
    }

    #[test]
    fn test_extensions_keep_insertion_order() {
        let ext = extensions![
            "x-zeta" => 1,
            "x-alpha" => 2,
            "x-mid" => 3,
        ];

        let keys: Vec<&String> = ext.keys().collect();
        assert_eq!(keys, ["x-zeta", "x-alpha", "x-mid"]);
        assert_eq!(
            serde_json::to_string(&ext).unwrap(),
            r#"{"x-zeta":1,"x-alpha":2,"x-mid":3}"#
        );
    }

    #[test]
    fn test_extensions_from_map() {
        let map = IndexMap::from([
            ("x-custom".to_string(), json!("value")),
            ("x-number".to_string(), json!(42)),
        ]);
        assert_eq!(Extensions::from_map(map).unwrap().len(), 2);

        let invalid = IndexMap::from([("invalid".to_string(), json!("value"))]);
        assert!(Extensions::from_map(invalid).is_err());
    }

    #[test]
    fn test_extensions_merge_and_remove() {
        let mut ext = Extensions::new().with("x-first", "value1");
        ext.merge(Extensions::new().with("x-second", "value2"));
        assert_eq!(ext.len(), 2);

        assert_eq!(ext.remove("x-first"), Some(json!("value1")));
        assert!(!ext.contains_key("x-first"));
        assert!(ext.contains_key("x-second"));
    }
}
