use openapi_types::schema::{SchemaCompiler, references, registry};
use openapi_types::{
    Callback, Components, Contact, Encoding, Example, ExternalDocumentation, Header, Info,
    License, Link, MediaType, Node, OAuthFlow, OAuthFlows, OpenApi, OpenApiError, Operation,
    Parameter, PathItem, Paths, RefOr, Reference, RequestBody, Response, Responses, Schema,
    SecurityRequirement, SecurityScheme, Server, ServerVariable, Tag, Validate, resolve,
};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

/// Parse every example of `T`, project it back to JSON and parse it again.
fn assert_round_trip<T: Node + PartialEq + std::fmt::Debug>() {
    for example in T::examples() {
        let first = T::from_value(example)
            .unwrap_or_else(|e| panic!("{} example rejected: {e}", T::schema().id()));
        let projected = first.json().unwrap();
        let second = T::from_value(&projected).unwrap();
        assert_eq!(second.json().unwrap(), projected, "{}", T::schema().id());
        assert_eq!(second, first, "{}", T::schema().id());
    }
}

#[test]
fn test_every_node_round_trips_its_examples() {
    assert_round_trip::<Reference>();
    assert_round_trip::<Schema>();
    assert_round_trip::<ExternalDocumentation>();
    assert_round_trip::<Contact>();
    assert_round_trip::<License>();
    assert_round_trip::<Info>();
    assert_round_trip::<ServerVariable>();
    assert_round_trip::<Server>();
    assert_round_trip::<Tag>();
    assert_round_trip::<Example>();
    assert_round_trip::<Link>();
    assert_round_trip::<Header>();
    assert_round_trip::<MediaType>();
    assert_round_trip::<Encoding>();
    assert_round_trip::<Parameter>();
    assert_round_trip::<RequestBody>();
    assert_round_trip::<Response>();
    assert_round_trip::<Responses>();
    assert_round_trip::<OAuthFlow>();
    assert_round_trip::<OAuthFlows>();
    assert_round_trip::<SecurityScheme>();
    assert_round_trip::<SecurityRequirement>();
    assert_round_trip::<Operation>();
    assert_round_trip::<PathItem>();
    assert_round_trip::<Callback>();
    assert_round_trip::<Paths>();
    assert_round_trip::<Components>();
    assert_round_trip::<OpenApi>();
}

#[test]
fn test_every_example_passes_its_validator() {
    let compiler = SchemaCompiler::global();
    for schema in registry::all() {
        let validator = compiler.compile(&schema).unwrap();
        assert!(!schema.examples().is_empty(), "{} has no examples", schema.id());
        for example in schema.examples() {
            assert!(
                validator.check(example),
                "{} rejected its own example {example}: {:?}",
                schema.id(),
                validator.errors(example).collect::<Vec<_>>()
            );
        }
    }
}

#[test]
fn test_warm_up_compiles_every_schema_once() {
    let compiler = SchemaCompiler::global();
    let count = compiler.warm_up().unwrap();
    assert_eq!(count, registry::all().len());

    for schema in registry::all() {
        assert!(compiler.is_cached(&schema), "{} not cached", schema.id());
    }
    let first = Operation::validator().unwrap();
    let second = Operation::validator().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_concurrent_validator_access() {
    let raw = json!({ "get": { "responses": { "200": { "description": "ok" } } } });
    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..16 {
                    assert!(PathItem::check(&raw));
                }
            });
        }
    });
}

#[test]
fn test_builders_never_mutate_the_receiver() {
    let operation = Operation::new().with_operation_id("listPets");
    let before = operation.json().unwrap();

    let tagged = operation.clone().with_tag("pets");
    let deprecated = operation.clone().with_deprecated(true);
    let answered = operation.clone().with_response("200", Response::new("ok"));

    assert_eq!(operation.json().unwrap(), before);
    for changed in [&tagged, &deprecated, &answered] {
        assert_ne!(changed, &operation);
        assert_eq!(changed.operation_id, operation.operation_id);
    }

    let reference = Reference::schema_component("Pet");
    let summarized = reference.clone().with_summary("A pet");
    assert_eq!(reference.summary(), None);
    assert_eq!(summarized.summary(), Some("A pet"));
    assert_eq!(summarized.reference(), reference.reference());
}

#[test]
fn test_reference_takes_precedence_over_inline_shape() {
    let raw = json!({
        "$ref": "#/components/schemas/X",
        "name": "id",
        "in": "query",
        "required": true
    });
    assert!(!Parameter::check(&raw));
    assert!(Reference::check(&raw));

    let resolved = resolve(&raw, Parameter::from_value).unwrap();
    assert_eq!(
        resolved.as_reference().map(Reference::reference),
        Some("#/components/schemas/X")
    );

    let operation = Operation::from_value(&json!({ "parameters": [raw] })).unwrap();
    assert!(operation.parameters.unwrap()[0].is_reference());
}

#[test]
fn test_external_references_are_unsupported() {
    let err = Reference::new("http://example.com/x").unwrap_err();
    assert_eq!(
        err,
        OpenApiError::UnsupportedReferenceKind {
            reference: "http://example.com/x".into()
        }
    );

    let err = Reference::from_value(&json!({ "$ref": "http://example.com/x" })).unwrap_err();
    assert!(matches!(err, OpenApiError::UnsupportedReferenceKind { .. }));

    let err = Response::from_value(&json!({
        "description": "ok",
        "headers": { "X-Rate": { "$ref": "other.yaml#/components/headers/Rate" } }
    }))
    .unwrap_err();
    assert!(matches!(err, OpenApiError::UnsupportedReferenceKind { .. }));
}

#[test]
fn test_dereference_against_root() {
    let root = json!({ "components": { "schemas": { "Pet": { "type": "object" } } } });

    let pet = Reference::from_value(&json!({ "$ref": "#/components/schemas/Pet" })).unwrap();
    assert_eq!(pet.dereference(Some(&root)).unwrap(), json!({ "type": "object" }));

    let missing = Reference::schema_component("Missing");
    assert!(matches!(
        missing.dereference(Some(&root)),
        Err(OpenApiError::InvalidReference { .. })
    ));
    assert!(matches!(
        missing.dereference(None),
        Err(OpenApiError::MissingRoot { .. })
    ));

    let shared = Arc::new(root);
    let bound = Reference::schema_component("Pet").with_root(&shared);
    let typed: Schema = bound.dereference_as(None).unwrap();
    assert_eq!(typed, Schema::object());
}

#[test]
fn test_ref_or_resolve_validates_target() {
    let root = json!({
        "components": {
            "responses": {
                "NotFound": { "description": "Entity not found." },
                "Broken": { "headers": {} }
            }
        }
    });

    let found: RefOr<Response> = Reference::response_component("NotFound").into();
    assert_eq!(found.resolve(&root).unwrap(), Response::new("Entity not found."));

    let broken: RefOr<Response> = Reference::response_component("Broken").into();
    assert!(matches!(broken.resolve(&root), Err(OpenApiError::TypeCheck { .. })));
}

#[test]
fn test_four_level_callback_nesting_validates() {
    let raw = json!({
        "get": {
            "callbacks": {
                "myCb": {
                    "{$request.query.url}": {
                        "post": { "responses": { "200": { "description": "ok" } } }
                    }
                }
            }
        }
    });
    assert!(PathItem::check(&raw));
    assert!(PathItem::from_value(&raw).is_ok());
}

/// A path item whose operation nests `depth` callbacks.
fn nested_path_item(depth: usize) -> Value {
    let mut item = json!({ "post": { "responses": { "200": { "description": "leaf" } } } });
    for level in 0..depth {
        item = json!({
            "post": {
                "operationId": format!("level{level}"),
                "callbacks": { "cb": { "{$request.body#/url}": item } }
            }
        });
    }
    item
}

#[test]
fn test_recursion_depth_has_no_fixed_limit() {
    let deep = nested_path_item(12);
    assert!(PathItem::check(&deep));
    let item = PathItem::from_value(&deep).unwrap();
    assert_eq!(item.json().unwrap(), deep);

    let mut broken = nested_path_item(12);
    let mut cursor = &mut broken;
    for _ in 0..12 {
        cursor = &mut cursor["post"]["callbacks"]["cb"]["{$request.body#/url}"];
    }
    cursor["post"]["responses"]["200"] = json!({});
    assert!(!PathItem::check(&broken));
}

/// Count the callback levels below `item` by following the `cb` callbacks.
fn callback_depth(item: &PathItem) -> usize {
    let mut depth = 0;
    let mut current = item;
    while let Some(next) = current
        .post
        .as_ref()
        .and_then(|operation| operation.callbacks.as_ref())
        .and_then(|callbacks| callbacks.get("cb"))
        .and_then(RefOr::as_value)
        .and_then(|callback| callback.get("{$request.body#/url}"))
        .and_then(RefOr::as_value)
    {
        depth += 1;
        current = next;
    }
    depth
}

#[test]
fn test_construction_depth_is_not_bounded_by_the_stack() {
    let deep = nested_path_item(64);
    let item = PathItem::from_value(&deep).unwrap();
    assert_eq!(callback_depth(&item), 64);
    assert_eq!(item.post.as_ref().unwrap().operation_id.as_deref(), Some("level63"));

    let operation = Operation::from_value(&deep["post"]).unwrap();
    assert_eq!(operation.callbacks.as_ref().unwrap().len(), 1);

    let callback = Callback::from_value(&deep["post"]["callbacks"]["cb"]).unwrap();
    let below = callback.get("{$request.body#/url}").and_then(RefOr::as_value);
    assert_eq!(below.map(callback_depth), Some(63));

    let parsed: PathItem = serde_json::from_value(deep.clone()).unwrap();
    assert_eq!(parsed, item);
}

#[test]
fn test_document_closure_has_unique_identifiers() {
    let closure = references(OpenApi::schema()).unwrap();
    let ids: Vec<&str> = closure.iter().map(|schema| schema.id()).collect();
    let unique: HashSet<&str> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());

    for expected in ["Info", "Paths", "PathItem", "Callback", "Components", "Reference", "Schema"] {
        assert!(unique.contains(expected), "closure is missing {expected}");
    }
    assert!(!unique.contains("OpenApi"));

    let validator = OpenApi::validator().unwrap();
    assert_eq!(validator.closure().len(), closure.len());
}

#[test]
fn test_independent_violations_are_all_reported() {
    let err = Parameter::from_value(&json!({ "in": "body" })).unwrap_err();
    let violations = err.violations();
    assert_eq!(violations.len(), 2, "{violations:?}");
    assert!(violations.iter().any(|v| v.path.is_empty() && v.message.contains("name")));
    assert!(violations.iter().any(|v| v.path == "/in"));
}

#[test]
fn test_from_json_str() {
    let info = Info::from_json_str(r#"{ "title": "Petstore", "version": "1.0.0" }"#).unwrap();
    assert_eq!(info, Info::new("Petstore", "1.0.0"));

    assert!(matches!(
        Info::from_json_str("{ not json"),
        Err(OpenApiError::JsonError { .. })
    ));
}

#[test]
fn test_full_document_validation() {
    let document = OpenApi::new(Info::new("Petstore", "1.0.0").with_license(License::apache2()))
        .with_path(
            "/pets",
            PathItem::new().with_post(
                Operation::new()
                    .with_operation_id("createPet")
                    .with_request_body(Reference::component("requestBodies", "NewPet"))
                    .with_callback(
                        "onAdopted",
                        Callback::new().with_expression(
                            "{$request.body#/callbackUrl}",
                            Reference::path_item_component("Adopted"),
                        ),
                    )
                    .with_response("201", Response::new("Created"))
                    .with_security(SecurityRequirement::scheme("oauth", ["write:pets"])),
            ),
        )
        .with_components(
            Components::new()
                .with_request_body("NewPet", RequestBody::application_json(Schema::object()))
                .with_path_item(
                    "Adopted",
                    PathItem::new()
                        .with_post(Operation::new().with_response("200", Response::new("ok"))),
                )
                .with_security_scheme(
                    "oauth",
                    SecurityScheme::oauth2(OAuthFlows::new().with_client_credentials(
                        OAuthFlow::token("https://example.com/token")
                            .with_scope("write:pets", "write"),
                    )),
                ),
        );

    assert!(document.validate().is_ok());
    let raw = document.json().unwrap();
    assert_eq!(OpenApi::from_value(&raw).unwrap(), document);

    let pruned = OpenApi {
        components: None,
        ..document
    };
    let err = pruned.validate().unwrap_err();
    assert_eq!(err.violations().len(), 2);
}

/// `from_value(x).json()` must reproduce `x` exactly.
fn assert_projection_stable<T: Node>(raw: Value) {
    let parsed = T::from_value(&raw).unwrap();
    assert_eq!(parsed.json().unwrap(), raw, "{}", T::schema().id());
}

#[test]
fn test_null_literal_values_survive_round_trip() {
    let parameter = Parameter::query("q").with_example(Value::Null);
    assert_eq!(
        parameter.json().unwrap(),
        json!({ "name": "q", "in": "query", "example": null })
    );
    assert_projection_stable::<Parameter>(parameter.json().unwrap());

    assert_projection_stable::<Header>(Header::new().with_example(Value::Null).json().unwrap());
    assert_projection_stable::<MediaType>(json!({ "example": null }));
    assert_projection_stable::<Example>(json!({ "summary": "nothing", "value": null }));
    assert_projection_stable::<Link>(json!({ "operationId": "getPet", "requestBody": null }));

    let absent = MediaType::from_value(&json!({})).unwrap();
    assert_eq!(absent.example, None);
    assert_eq!(absent.json().unwrap(), json!({}));
}

#[test]
fn test_mutually_exclusive_fields_are_rejected() {
    let both = json!({ "name": "MIT", "identifier": "MIT", "url": "https://x" });
    assert!(!License::check(&both));
    assert!(matches!(License::from_value(&both), Err(OpenApiError::TypeCheck { .. })));
    assert!(License::check(&json!({ "name": "MIT", "identifier": "MIT" })));

    let both = json!({ "value": 1, "externalValue": "https://x" });
    assert!(!Example::check(&both));
    assert!(Example::from_value(&both).is_err());
    assert!(Example::check(&json!({ "value": null })));

    let both = json!({ "operationId": "a", "operationRef": "#/paths/~1a/get" });
    assert!(!Link::check(&both));
}
