//! OpenAPI Types
//!
//! Typed builders and structural validators for OpenAPI 3.1 documents.
//!
//! This crate provides:
//! - Rust types for every OpenAPI 3.1 object with serde support and bon builders
//! - A structural schema per node type, compiled once per process into a validator
//! - Reference-or-value fields resolved with `$ref` taking precedence
//! - Recursive node schemas (Operation, PathItem, Callback) that validate at any depth
//! - Internal `#/` reference dereferencing against a root document
//! - Specification extensions support for `x-` fields
//!
//! # Example
//!
//! ```rust
//! use openapi_types::{
//!     Info, MediaType, Node, OpenApi, Operation, PathItem, Response, Schema, Validate,
//! };
//!
//! let document = OpenApi::new(Info::new("Petstore", "1.0.0")).with_path(
//!     "/pets",
//!     PathItem::new().with_get(
//!         Operation::new().with_operation_id("listPets").with_response(
//!             "200",
//!             Response::new("A list of pets").with_content(
//!                 "application/json",
//!                 MediaType::new().with_schema(Schema::array(Schema::object())),
//!             ),
//!         ),
//!     ),
//! );
//!
//! assert!(document.validate().is_ok());
//!
//! let raw = document.json().unwrap();
//! let parsed = OpenApi::from_value(&raw).unwrap();
//! assert_eq!(parsed, document);
//! ```

pub mod error;
pub mod schema;
pub mod validation;

mod extensions;
mod node;
mod patterned;
mod reference;
mod resolve;
mod tree;

// OpenAPI object types
mod components;
mod document;
mod example;
mod info;
mod media;
mod operation;
mod parameter;
mod paths;
mod response;
mod schema_object;
mod security;
mod server;
mod tag;

pub use components::*;
pub use document::*;
pub use example::*;
pub use extensions::*;
pub use info::*;
pub use media::*;
pub use node::{Node, json};
pub use operation::*;
pub use parameter::*;
pub use paths::*;
pub use patterned::PatternedMap;
pub use reference::*;
pub use resolve::{RefOr, resolve, resolve_with};
pub use response::*;
pub use schema_object::*;
pub use security::*;
pub use server::*;
pub use tag::*;

pub use error::*;
pub use validation::*;

/// OpenAPI specification version constants
pub mod version {
    /// Version written by [`crate::OpenApi::new`]
    pub const CURRENT: &str = "3.1.0";

    /// OpenAPI versions this crate models
    pub const SUPPORTED: &[&str] = &["3.1.0", "3.1.1"];

    /// Check if a version string is supported
    pub fn is_supported(version: &str) -> bool {
        SUPPORTED.contains(&version)
    }
}
