//! Listing of every node schema defined by this crate.

use super::NodeSchema;
use crate::{
    Callback, Components, Contact, Encoding, Example, ExternalDocumentation, Header, Info,
    License, Link, MediaType, Node, OAuthFlow, OAuthFlows, OpenApi, Operation, Parameter,
    PathItem, Paths, Reference, RequestBody, Response, Responses, Schema, SecurityRequirement,
    SecurityScheme, Server, ServerVariable, Tag,
};
use std::sync::Arc;

/// Every node schema, leaves first.
pub fn all() -> Vec<Arc<NodeSchema>> {
    [
        Reference::schema(),
        Schema::schema(),
        ExternalDocumentation::schema(),
        Contact::schema(),
        License::schema(),
        Info::schema(),
        ServerVariable::schema(),
        Server::schema(),
        Tag::schema(),
        Example::schema(),
        Link::schema(),
        Header::schema(),
        MediaType::schema(),
        Encoding::schema(),
        Parameter::schema(),
        RequestBody::schema(),
        Response::schema(),
        Responses::schema(),
        OAuthFlow::schema(),
        OAuthFlows::schema(),
        SecurityScheme::schema(),
        SecurityRequirement::schema(),
        Operation::schema(),
        PathItem::schema(),
        Callback::schema(),
        Paths::schema(),
        Components::schema(),
        OpenApi::schema(),
    ]
    .into_iter()
    .map(Arc::clone)
    .collect()
}

/// Look up a registered schema by identifier.
pub fn find(id: &str) -> Option<Arc<NodeSchema>> {
    all().into_iter().find(|schema| schema.id() == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identifiers_are_unique() {
        let schemas = all();
        let ids: HashSet<&str> = schemas.iter().map(|s| s.id()).collect();
        assert_eq!(ids.len(), schemas.len());
    }

    #[test]
    fn test_every_schema_has_examples() {
        for schema in all() {
            assert!(!schema.examples().is_empty(), "{} has no examples", schema.id());
        }
    }

    #[test]
    fn test_find() {
        let found = find("PathItem").unwrap();
        assert!(Arc::ptr_eq(&found, PathItem::schema()));
        assert!(find("Nope").is_none());
    }
}
