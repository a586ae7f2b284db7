//! Builds, validates and round-trips a small petstore document.
//!
//! Run with `RUST_LOG=openapi_types=debug` to see validator compilation.

use openapi_types::schema::SchemaCompiler;
use openapi_types::{
    Callback, Components, Info, License, MediaType, Node, OAuthFlow, OAuthFlows, OpenApi,
    Operation, Parameter, PathItem, Reference, RequestBody, Response, Schema, SecurityRequirement,
    SecurityScheme, Server, Tag, Validate,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "openapi_types=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let compiled = SchemaCompiler::global().warm_up()?;
    println!("Compiled {compiled} node validators");

    let pet = Schema::object()
        .with_title("Pet")
        .with_property("id", Schema::integer().with_format("int64"))
        .with_property("name", Schema::string())
        .require_property("id")
        .require_property("name");

    let components = Components::new()
        .with_schema("Pet", pet)
        .with_parameter(
            "petId",
            Parameter::path("petId")
                .with_description("The id of the pet to retrieve")
                .with_schema(Schema::string()),
        )
        .with_response("NotFound", Response::new("Pet not found"))
        .with_security_scheme(
            "petstore_auth",
            SecurityScheme::oauth2(
                OAuthFlows::new().with_implicit(
                    OAuthFlow::implicit("https://petstore.example.com/oauth/authorize")
                        .with_scope("write:pets", "modify pets in your account")
                        .with_scope("read:pets", "read your pets"),
                ),
            ),
        );

    let pets_json = MediaType::new().with_schema(Schema::array(Schema::component("Pet")));

    let adopted = Callback::new().with_expression(
        "{$request.body#/callbackUrl}",
        PathItem::new().with_post(
            Operation::new()
                .with_request_body(RequestBody::application_json(Schema::component("Pet")))
                .with_response("200", Response::new("Callback received")),
        ),
    );

    let document = OpenApi::new(
        Info::new("Swagger Petstore", "1.0.0")
            .with_description("A sample API that uses a petstore as an example")
            .with_license(License::mit()),
    )
    .with_server(Server::new("https://petstore.example.com/v1"))
    .with_tag(Tag::new("pets").with_description("Everything about your pets"))
    .with_path(
        "/pets",
        PathItem::new()
            .with_get(
                Operation::new()
                    .with_tag("pets")
                    .with_operation_id("listPets")
                    .with_parameter(
                        Parameter::query("limit")
                            .with_description("How many items to return at one time")
                            .with_schema(Schema::integer()),
                    )
                    .with_response(
                        "200",
                        Response::new("A paged array of pets")
                            .with_content("application/json", pets_json),
                    ),
            )
            .with_post(
                Operation::new()
                    .with_tag("pets")
                    .with_operation_id("createPet")
                    .with_request_body(
                        RequestBody::application_json(Schema::component("Pet")).with_required(true),
                    )
                    .with_callback("onAdopted", adopted)
                    .with_response("201", Response::new("Null response"))
                    .with_security(SecurityRequirement::scheme("petstore_auth", ["write:pets"])),
            ),
    )
    .with_path(
        "/pets/{petId}",
        PathItem::new()
            .with_parameter(Reference::parameter_component("petId"))
            .with_get(
                Operation::new()
                    .with_tag("pets")
                    .with_operation_id("showPetById")
                    .with_response(
                        "200",
                        Response::new("Expected response to a valid request").with_content(
                            "application/json",
                            MediaType::new().with_schema(Schema::component("Pet")),
                        ),
                    )
                    .with_response("404", Reference::response_component("NotFound")),
            ),
    )
    .with_components(components);

    document.validate()?;

    for (path, method, operation) in document.operations() {
        println!(
            "{:>6} {path} ({})",
            method.as_str(),
            operation.operation_id.as_deref().unwrap_or("-")
        );
    }

    let raw = document.json()?;
    println!("\nGenerated OpenAPI document:");
    println!("{}", serde_json::to_string_pretty(&raw)?);

    let parsed = OpenApi::from_value(&raw)?;
    assert_eq!(parsed, document);
    println!("\nSuccessfully round-tripped the document!");

    let pet: Schema = document.dereference(&Reference::schema_component("Pet"))?;
    println!("Pet schema: {}", pet.as_value());

    Ok(())
}
