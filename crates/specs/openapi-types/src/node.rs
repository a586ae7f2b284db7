//! The capability shared by every OpenAPI node type.

use crate::error::{OpenApiError, OpenApiResult};
use crate::schema::{CompiledValidator, NodeSchema, SchemaCompiler};
use serde::Serialize;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use serde_json::Value;
use std::sync::Arc;

/// A typed OpenAPI node with a registered structural schema.
///
/// Values are produced either from untrusted input through [`Node::from_value`],
/// which checks the input against the compiled schema before building the
/// typed tree, or from builder chains. Builder methods take `self` by value
/// and return the updated node, so a node observed through a shared reference
/// never changes.
pub trait Node: Serialize + DeserializeOwned {
    /// The node's schema, shared for the life of the process.
    fn schema() -> &'static Arc<NodeSchema>;

    /// Illustrative payloads that must satisfy the schema.
    fn examples() -> &'static [Value] {
        Self::schema().examples()
    }

    /// Compiled validator from the process-wide cache.
    fn validator() -> OpenApiResult<Arc<CompiledValidator>> {
        SchemaCompiler::global().compile(Self::schema())
    }

    /// Whether `raw` conforms to the node schema
    fn check(raw: &Value) -> bool {
        Self::validator().is_ok_and(|validator| validator.check(raw))
    }

    /// Check `raw`, failing with every violation found.
    fn type_check(raw: &Value) -> OpenApiResult<()> {
        Self::validator()?.type_check(raw)
    }

    /// Validate `raw` and build the typed node from it.
    fn from_value(raw: &Value) -> OpenApiResult<Self> {
        Self::type_check(raw)?;
        construct(raw)
    }

    /// Parse JSON text, then behave like [`Node::from_value`].
    fn from_json_str(text: &str) -> OpenApiResult<Self> {
        let raw: Value = serde_json::from_str(text)?;
        Self::from_value(&raw)
    }

    /// Project the node to its plain JSON value.
    fn json(&self) -> OpenApiResult<Value> {
        json(self)
    }

    /// Re-run the structural check on the current contents.
    fn revalidate(&self) -> OpenApiResult<()> {
        Self::type_check(&self.json()?)
    }
}

/// Project any serializable value to JSON.
pub fn json<T: Serialize + ?Sized>(value: &T) -> OpenApiResult<Value> {
    serde_json::to_value(value).map_err(OpenApiError::from)
}

/// Build a typed value from `raw` without checking it first.
pub(crate) fn construct<T: DeserializeOwned>(raw: &Value) -> OpenApiResult<T> {
    T::deserialize(raw).map_err(OpenApiError::from_construction)
}

/// Keep a present `null` as `Some(Value::Null)`.
///
/// Used with `#[serde(default)]` on literal-value fields, so only an absent
/// key becomes `None`.
pub(crate) fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Declare the `Node` impl of a type whose schema lives in a `Lazy` static.
///
/// The three-argument form builds checked input with `$build` instead of
/// going through `Deserialize`.
macro_rules! impl_node {
    ($ty:ty, $schema:expr) => {
        impl $crate::node::Node for $ty {
            fn schema() -> &'static ::std::sync::Arc<$crate::schema::NodeSchema> {
                &$schema
            }
        }
    };
    ($ty:ty, $schema:expr, $build:path) => {
        impl $crate::node::Node for $ty {
            fn schema() -> &'static ::std::sync::Arc<$crate::schema::NodeSchema> {
                &$schema
            }

            fn from_value(raw: &::serde_json::Value) -> $crate::error::OpenApiResult<Self> {
                Self::type_check(raw)?;
                $build(raw)
            }
        }
    };
}

pub(crate) use impl_node;
