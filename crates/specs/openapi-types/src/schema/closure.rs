//! Reference closure of a node schema.

use super::{NodeSchema, SchemaDef};
use crate::error::{OpenApiError, OpenApiResult};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Collect every schema `root` transitively references through [`SchemaDef::Ref`].
///
/// Members are deduplicated by identity and returned in discovery order. A
/// schema is marked visited before its own body is walked, so cycles through
/// references terminate. Two distinct schemas sharing an identifier (the root
/// included) fail with [`OpenApiError::SchemaIdentifierCollision`].
pub fn references(root: &Arc<NodeSchema>) -> OpenApiResult<Vec<Arc<NodeSchema>>> {
    let mut walk = ClosureWalk {
        root: root.id(),
        visited: HashSet::from([Arc::as_ptr(root)]),
        ids: HashMap::from([(root.id().to_string(), Arc::as_ptr(root))]),
        members: Vec::new(),
    };
    walk.visit(root.body())?;
    Ok(walk.members)
}

struct ClosureWalk<'a> {
    root: &'a str,
    visited: HashSet<*const NodeSchema>,
    ids: HashMap<String, *const NodeSchema>,
    members: Vec<Arc<NodeSchema>>,
}

impl ClosureWalk<'_> {
    fn visit(&mut self, def: &SchemaDef) -> OpenApiResult<()> {
        match def {
            SchemaDef::Ref(node) => self.enter(node),
            SchemaDef::Array(items) => self.visit(items),
            SchemaDef::Object(object) => object
                .properties
                .iter()
                .try_for_each(|property| self.visit(&property.schema)),
            SchemaDef::Record(record) => self.visit(&record.value),
            SchemaDef::Union(variants) => variants.iter().try_for_each(|v| self.visit(v)),
            SchemaDef::Any
            | SchemaDef::String { .. }
            | SchemaDef::Boolean
            | SchemaDef::Number
            | SchemaDef::Integer
            | SchemaDef::Literal(_)
            | SchemaDef::Enum(_)
            | SchemaDef::This(_) => Ok(()),
        }
    }

    fn enter(&mut self, node: &Arc<NodeSchema>) -> OpenApiResult<()> {
        let ptr = Arc::as_ptr(node);
        if !self.visited.insert(ptr) {
            return Ok(());
        }

        match self.ids.get(node.id()) {
            Some(existing) if *existing != ptr => {
                return Err(OpenApiError::collision(node.id(), self.root));
            }
            _ => {
                self.ids.insert(node.id().to_string(), ptr);
            }
        }

        self.members.push(Arc::clone(node));
        self.visit(node.body())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(id: &str) -> Arc<NodeSchema> {
        NodeSchema::define(id, SchemaDef::string(), vec![json!("x")])
    }

    #[test]
    fn test_closure_is_transitive_and_deduplicated() {
        let shared = leaf("Shared");
        let left = NodeSchema::define(
            "Left",
            SchemaDef::object().optional("s", SchemaDef::node(&shared)),
            vec![json!({})],
        );
        let right = NodeSchema::define(
            "Right",
            SchemaDef::array(SchemaDef::node(&shared)),
            vec![json!([])],
        );
        let root = NodeSchema::define(
            "Root",
            SchemaDef::union(vec![SchemaDef::node(&left), SchemaDef::node(&right)]),
            vec![json!({})],
        );

        let closure = references(&root).unwrap();
        let ids: Vec<&str> = closure.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["Left", "Shared", "Right"]);
    }

    #[test]
    fn test_closure_excludes_root_and_placeholders() {
        let shared = leaf("Shared");
        let tree = NodeSchema::recursive("Tree", vec![json!({})], |this| {
            SchemaDef::object()
                .optional("children", SchemaDef::array(this))
                .optional("label", SchemaDef::node(&shared))
        });

        let closure = references(&tree).unwrap();
        assert_eq!(closure.len(), 1);
        assert_eq!(closure[0].id(), "Shared");
    }

    #[test]
    fn test_same_identifier_distinct_schemas_collide() {
        let first = NodeSchema::recursive("Loop", vec![json!({})], |this| {
            SchemaDef::object().optional("next", this)
        });
        let second = NodeSchema::recursive("Loop", vec![json!({})], |this| {
            SchemaDef::object().optional("next", this)
        });
        let root = NodeSchema::define(
            "Root",
            SchemaDef::object()
                .optional("a", SchemaDef::node(&first))
                .optional("b", SchemaDef::node(&second)),
            vec![json!({})],
        );

        let err = references(&root).unwrap_err();
        assert_eq!(err, OpenApiError::collision("Loop", "Root"));
    }

    #[test]
    fn test_member_colliding_with_root_identifier() {
        let impostor = leaf("Root");
        let root = NodeSchema::define(
            "Root",
            SchemaDef::object().optional("a", SchemaDef::node(&impostor)),
            vec![json!({})],
        );

        assert!(matches!(
            references(&root),
            Err(OpenApiError::SchemaIdentifierCollision { .. })
        ));
    }

    #[test]
    fn test_same_schema_through_many_paths_is_not_a_collision() {
        let shared = leaf("Shared");
        let root = NodeSchema::define(
            "Root",
            SchemaDef::object()
                .optional("a", SchemaDef::node(&shared))
                .optional("b", SchemaDef::record(SchemaDef::node(&shared)))
                .optional("c", SchemaDef::array(SchemaDef::node(&shared))),
            vec![json!({})],
        );

        assert_eq!(references(&root).unwrap().len(), 1);
    }
}
