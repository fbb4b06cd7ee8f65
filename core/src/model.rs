//! # Model
//!
//! Plain-data view of a declarative schema: field descriptors, attached validators
//! and the schema that groups them. The generator only ever reads these types.

/// Field descriptors and kinds.
pub mod fields;

/// Schemas and schema-level options.
pub mod schema;

/// Declarative field validators.
pub mod validators;

pub use fields::{FieldDescriptor, FieldKind, NestedField, NestedTarget, TypeOverride};
pub use schema::{Partial, Schema, SchemaOptions, UnknownFields};
pub use validators::{CustomValidator, Length, OneOf, Range, Regexp, Validator};

/// One node of the output document: a property schema or a full definition.
pub type Fragment = serde_json::Map<String, serde_json::Value>;
