//! Reference-or-value fields.
//!
//! Wherever an OpenAPI field may hold either a `$ref` pointer or an inline
//! object, the raw value is resolved by checking the Reference shape first.
//! An object that carries `$ref` therefore always becomes a [`Reference`],
//! even when its other keys would also make a valid inline node.

use crate::error::{OpenApiError, OpenApiResult};
use crate::node::{Node, construct};
use crate::reference::Reference;
use crate::schema::{CompiledValidator, SchemaDef};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::trace;

/// Either a [`Reference`] or an inline `T`.
#[derive(Debug, Clone, PartialEq)]
pub enum RefOr<T> {
    Reference(Reference),
    Value(T),
}

impl<T> RefOr<T> {
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Self::Reference(reference) => Some(reference),
            Self::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Reference(_) => None,
            Self::Value(value) => Some(value),
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Reference(_) => None,
            Self::Value(value) => Some(value),
        }
    }
}

impl<T: Node + Clone> RefOr<T> {
    /// The inline value, or the referenced value looked up in `root` and
    /// checked against `T`'s schema.
    pub fn resolve(&self, root: &Value) -> OpenApiResult<T> {
        match self {
            Self::Reference(reference) => T::from_value(reference.resolve_in(root)?),
            Self::Value(value) => Ok(value.clone()),
        }
    }
}

impl<T> From<Reference> for RefOr<T> {
    fn from(reference: Reference) -> Self {
        Self::Reference(reference)
    }
}

/// `From<T> for RefOr<T>` for each node type usable in reference position.
macro_rules! ref_or_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for RefOr<$ty> {
                fn from(value: $ty) -> Self {
                    Self::Value(value)
                }
            }
        )+
    };
}

ref_or_from!(
    crate::Callback,
    crate::Example,
    crate::Header,
    crate::Link,
    crate::Parameter,
    crate::PathItem,
    crate::RequestBody,
    crate::Response,
    crate::SecurityScheme,
);

/// Resolve `raw` using an explicit Reference validator.
///
/// When `reference_check` accepts `raw` a [`Reference`] is built (and may
/// still fail as an unsupported kind); otherwise `build` produces the
/// inline value.
pub fn resolve_with<T, F>(
    raw: &Value,
    reference_check: &CompiledValidator,
    build: F,
) -> OpenApiResult<RefOr<T>>
where
    F: FnOnce(&Value) -> OpenApiResult<T>,
{
    if reference_check.check(raw) {
        trace!("resolved as reference");
        return construct::<Reference>(raw).map(RefOr::Reference);
    }
    trace!("resolved as inline value");
    build(raw).map(RefOr::Value)
}

/// Resolve `raw` against the cached Reference validator.
pub fn resolve<T, F>(raw: &Value, build: F) -> OpenApiResult<RefOr<T>>
where
    F: FnOnce(&Value) -> OpenApiResult<T>,
{
    let reference_check = Reference::validator()?;
    resolve_with(raw, &reference_check, build)
}

/// Union of the Reference schema and `def`, Reference first.
pub(crate) fn reference_or(def: SchemaDef) -> SchemaDef {
    SchemaDef::union(vec![SchemaDef::node(Reference::schema()), def])
}

impl<T: Serialize> Serialize for RefOr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Reference(reference) => reference.serialize(serializer),
            Self::Value(value) => value.serialize(serializer),
        }
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for RefOr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        resolve(&raw, construct::<T>).map_err(OpenApiError::into_de_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Parameter, ParameterLocation, PathItem, Response};
    use serde_json::json;

    #[test]
    fn test_reference_takes_precedence() {
        // Valid both as a Reference and as an inline PathItem.
        let raw = json!({
            "$ref": "#/components/pathItems/Pets",
            "description": "shared pet routes"
        });
        assert!(PathItem::check(&raw));

        let resolved: RefOr<PathItem> = resolve(&raw, construct).unwrap();
        let reference = resolved.as_reference().unwrap();
        assert_eq!(reference.reference(), "#/components/pathItems/Pets");
        assert_eq!(reference.description(), Some("shared pet routes"));
    }

    #[test]
    fn test_unrelated_keys_do_not_defeat_reference() {
        let raw = json!({
            "$ref": "#/components/schemas/X",
            "name": "limit",
            "in": "query",
            "x-extra": true
        });
        let resolved: RefOr<Parameter> = serde_json::from_value(raw).unwrap();
        assert!(resolved.is_reference());
    }

    #[test]
    fn test_inline_value() {
        let raw = json!({ "name": "limit", "in": "query" });
        let resolved: RefOr<Parameter> = resolve(&raw, construct).unwrap();
        let parameter = resolved.as_value().unwrap();
        assert_eq!(parameter.name, "limit");
        assert_eq!(parameter.location, ParameterLocation::Query);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let raw = json!({ "$ref": "#/components/parameters/limit" });
        let validator = Reference::validator().unwrap();
        for _ in 0..3 {
            let resolved: RefOr<Parameter> = resolve_with(&raw, &validator, construct).unwrap();
            assert!(resolved.is_reference());
        }
    }

    #[test]
    fn test_external_reference_fails_instead_of_falling_through() {
        let raw = json!({ "$ref": "https://example.com/params.json#/limit" });
        let err = resolve::<Parameter, _>(&raw, construct).unwrap_err();
        assert!(matches!(err, OpenApiError::UnsupportedReferenceKind { .. }));

        let err = serde_json::from_value::<RefOr<Parameter>>(raw).unwrap_err();
        assert!(matches!(
            OpenApiError::from_construction(err),
            OpenApiError::UnsupportedReferenceKind { .. }
        ));
    }

    #[test]
    fn test_resolve_against_root() {
        let root = json!({
            "components": {
                "responses": { "NotFound": { "description": "Not found" } }
            }
        });
        let item: RefOr<Response> = Reference::response_component("NotFound").into();
        assert_eq!(item.resolve(&root).unwrap().description, "Not found");

        let inline: RefOr<Response> = Response::new("ok").into();
        assert_eq!(inline.resolve(&root).unwrap().description, "ok");
    }

    #[test]
    fn test_serializes_untagged() {
        let item: RefOr<Response> = Reference::response_component("NotFound").into();
        assert_eq!(
            serde_json::to_value(&item).unwrap(),
            json!({ "$ref": "#/components/responses/NotFound" })
        );
    }
}
