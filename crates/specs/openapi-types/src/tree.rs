//! Construction of Operation, PathItem and Callback trees.
//!
//! Operations hold callbacks, callbacks hold path items and path items hold
//! operations, with no bound on the nesting. Building them through nested
//! `Deserialize` impls costs several stack frames per level, so the raw tree
//! is walked with an explicit stack instead: inline path items are gathered
//! parents first, then built children first, each parent taking its already
//! built children. Only the nodes outside the cycle go through serde, from
//! borrowed values.

use crate::error::{OpenApiError, OpenApiResult};
use crate::extensions::is_extension_key;
use crate::node::{Node, construct};
use crate::patterned::PatternedMap;
use crate::reference::Reference;
use crate::resolve::resolve_with;
use crate::schema::CompiledValidator;
use crate::{Callback, Extensions, HttpMethod, Operation, PathItem};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::trace;

/// Build a path item and everything nested below it.
pub(crate) fn path_item(raw: &Value) -> OpenApiResult<PathItem> {
    let mut builder = TreeBuilder::new()?;
    builder.prepare(vec![raw])?;
    builder.take(raw)
}

/// Build an operation and everything nested below it.
pub(crate) fn operation(raw: &Value) -> OpenApiResult<Operation> {
    let mut builder = TreeBuilder::new()?;
    let nested = builder.nested_in_operation(raw);
    builder.prepare(nested)?;
    builder.operation(raw)
}

/// Build a callback and everything nested below it.
pub(crate) fn callback(raw: &Value) -> OpenApiResult<Callback> {
    let mut builder = TreeBuilder::new()?;
    let nested = builder.nested_in_callback(raw);
    builder.prepare(nested)?;
    builder.callback(raw)
}

/// Read an optional field of `object` without copying its value.
fn field<T: DeserializeOwned>(
    object: &Map<String, Value>,
    key: &str,
) -> OpenApiResult<Option<T>> {
    match object.get(key) {
        Some(raw) => construct::<Option<T>>(raw),
        None => Ok(None),
    }
}

fn as_object<'v>(raw: &'v Value, node: &str) -> OpenApiResult<&'v Map<String, Value>> {
    raw.as_object()
        .ok_or_else(|| OpenApiError::json(format!("invalid type: expected {node} object")))
}

struct TreeBuilder {
    reference_check: Arc<CompiledValidator>,
    // Keyed by the address of the raw path item, which outlives the build.
    built: HashMap<*const Value, PathItem>,
}

impl TreeBuilder {
    fn new() -> OpenApiResult<Self> {
        Ok(Self {
            reference_check: Reference::validator()?,
            built: HashMap::new(),
        })
    }

    fn is_reference(&self, raw: &Value) -> bool {
        self.reference_check.check(raw)
    }

    /// Inline path items held by the entries of a callback.
    fn nested_in_callback<'v>(&self, raw: &'v Value) -> Vec<&'v Value> {
        raw.as_object()
            .into_iter()
            .flatten()
            .filter(|(key, value)| !is_extension_key(key) && !self.is_reference(value))
            .map(|(_, value)| value)
            .collect()
    }

    /// Inline path items held by the inline callbacks of an operation.
    fn nested_in_operation<'v>(&self, raw: &'v Value) -> Vec<&'v Value> {
        raw.get("callbacks")
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .filter(|(_, callback)| !self.is_reference(callback))
            .flat_map(|(_, callback)| self.nested_in_callback(callback))
            .collect()
    }

    /// Build every path item reachable from `roots`, deepest first.
    fn prepare(&mut self, roots: Vec<&Value>) -> OpenApiResult<()> {
        let mut pending = roots;
        let mut order = Vec::new();
        while let Some(item) = pending.pop() {
            order.push(item);
            for method in HttpMethod::ALL {
                if let Some(operation) = item.get(method.as_str()) {
                    pending.extend(self.nested_in_operation(operation));
                }
            }
        }

        trace!(path_items = order.len(), "building path item tree");
        for item in order.into_iter().rev() {
            let built = self.path_item(item)?;
            self.built.insert(item as *const Value, built);
        }
        Ok(())
    }

    fn take(&mut self, raw: &Value) -> OpenApiResult<PathItem> {
        self.built
            .remove(&(raw as *const Value))
            .ok_or_else(|| OpenApiError::json("path item was not prepared before use"))
    }

    fn path_item(&mut self, raw: &Value) -> OpenApiResult<PathItem> {
        let object = as_object(raw, "PathItem")?;
        let mut item = PathItem {
            reference: field(object, "$ref")?,
            summary: field(object, "summary")?,
            description: field(object, "description")?,
            servers: field(object, "servers")?,
            parameters: field(object, "parameters")?,
            extensions: Extensions::of_object(object),
            ..PathItem::default()
        };
        for method in HttpMethod::ALL {
            if let Some(operation) = object.get(method.as_str()) {
                item = item.with_operation(method, self.operation(operation)?);
            }
        }
        Ok(item)
    }

    fn operation(&mut self, raw: &Value) -> OpenApiResult<Operation> {
        let object = as_object(raw, "Operation")?;
        let reference_check = Arc::clone(&self.reference_check);
        let callbacks = match object.get("callbacks") {
            Some(callbacks) => {
                let mut resolved = IndexMap::new();
                for (name, callback) in as_object(callbacks, "callbacks")? {
                    let callback =
                        resolve_with(callback, &reference_check, |raw| self.callback(raw))?;
                    resolved.insert(name.clone(), callback);
                }
                Some(resolved)
            }
            None => None,
        };

        Ok(Operation {
            tags: field(object, "tags")?,
            summary: field(object, "summary")?,
            description: field(object, "description")?,
            external_docs: field(object, "externalDocs")?,
            operation_id: field(object, "operationId")?,
            parameters: field(object, "parameters")?,
            request_body: field(object, "requestBody")?,
            responses: field(object, "responses")?,
            callbacks,
            deprecated: field(object, "deprecated")?,
            security: field(object, "security")?,
            servers: field(object, "servers")?,
            extensions: Extensions::of_object(object),
        })
    }

    fn callback(&mut self, raw: &Value) -> OpenApiResult<Callback> {
        let object = as_object(raw, "Callback")?;
        let reference_check = Arc::clone(&self.reference_check);
        let mut entries = IndexMap::new();
        for (expression, item) in object {
            if is_extension_key(expression) {
                continue;
            }
            let item = resolve_with(item, &reference_check, |raw| self.take(raw))?;
            entries.insert(expression.clone(), item);
        }
        Ok(Callback(PatternedMap::from_parts(
            entries,
            Extensions::of_object(object),
        )))
    }
}
