#![deny(missing_docs)]

//! # Schemagen Core
//!
//! Converts declarative serialization schemas (named, typed fields with
//! validators and nested references) into JSON Schema draft-07 documents.
//!
//! ```
//! use schemagen_core::{FieldDescriptor, JsonSchemaGenerator, Schema};
//!
//! let schema = Schema::new("Pet").with_field(FieldDescriptor::string("name").with_required(true));
//! let doc = JsonSchemaGenerator::new().dump(&schema).unwrap();
//! assert_eq!(doc["$ref"], "#/definitions/Pet");
//! assert_eq!(doc["definitions"]["Pet"]["required"][0], "name");
//! ```

/// Shared error types.
pub mod error;

/// Field, validator and schema descriptors.
pub mod model;

/// Type mapping logic (field kind -> JSON Schema fragment).
pub mod type_mapping;

/// Validator translation.
pub mod validation;

/// Caller-supplied kind mappers and validator translators.
pub mod extensions;

/// Name -> schema lookup.
pub mod registry;

/// JSON Schema generation.
pub mod schema_generator;

/// YAML / JSON schema document loading.
pub mod loader;

/// react-jsonschema-form uiSchema generation.
pub mod uischema;

pub use error::{AppError, AppResult};
pub use extensions::Extensions;
pub use loader::{load_registry_path, load_registry_str};
pub use model::{
    CustomValidator, FieldDescriptor, FieldKind, Fragment, Length, NestedField, NestedTarget,
    OneOf, Partial, Range, Regexp, Schema, SchemaOptions, TypeOverride, UnknownFields, Validator,
};
pub use registry::SchemaRegistry;
pub use schema_generator::{GeneratorOptions, JsonSchemaGenerator, DRAFT_07};
pub use type_mapping::{JsonType, KindMapper, TypeMapper};
pub use uischema::{dump_with_uischema, ui_schema};
