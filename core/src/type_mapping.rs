#![deny(missing_docs)]

//! # Type Mapping
//!
//! Converts a field's declared kind into a JSON Schema compatible representation.
//! Handles scalars, formats, enums, nullability and field-level decoration
//! (title, `readonly`, `default`, metadata). Composite kinds (lists, dicts,
//! unions, nested references) get their base type here; their inner schemas are
//! filled in by the schema generator.

use crate::error::{AppError, AppResult};
use crate::extensions::Extensions;
use crate::model::fields::TYPE_MAPPING_KEY;
use crate::model::{FieldDescriptor, FieldKind, Fragment, TypeOverride};
use serde_json::{json, Value};
use std::fmt::Display;

/// Represents the simplified JSON types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonType {
    /// A string type.
    String,
    /// A number (JSON makes no integer/float split; `format` carries it).
    Number,
    /// A boolean type.
    Boolean,
    /// An object type.
    Object,
    /// An array type.
    Array,
    /// The null type.
    Null,
}

impl Display for JsonType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsonType::String => write!(f, "string"),
            JsonType::Number => write!(f, "number"),
            JsonType::Boolean => write!(f, "boolean"),
            JsonType::Object => write!(f, "object"),
            JsonType::Array => write!(f, "array"),
            JsonType::Null => write!(f, "null"),
        }
    }
}

/// Trait for converting a field's kind to its base fragment.
pub trait TypeMapper {
    /// Maps the kind of `field` to a fragment holding `type` and, where the kind
    /// carries one, `format` (or `enum` for enum kinds).
    fn map(&self, field: &FieldDescriptor) -> AppResult<Fragment>;
}

/// The standard implementation of `TypeMapper`: the built-in kind table with a
/// fallback to extension mappers for custom kinds.
pub struct KindMapper<'a> {
    extensions: &'a Extensions,
}

impl<'a> KindMapper<'a> {
    /// Creates a mapper backed by the given extensions.
    pub fn new(extensions: &'a Extensions) -> Self {
        Self { extensions }
    }
}

impl TypeMapper for KindMapper<'_> {
    fn map(&self, field: &FieldDescriptor) -> AppResult<Fragment> {
        match &field.kind {
            // Strings
            FieldKind::String | FieldKind::Email | FieldKind::Url | FieldKind::Raw => {
                Ok(simple(JsonType::String))
            }
            FieldKind::TimeDelta => Ok(simple(JsonType::String)),
            FieldKind::Boolean => Ok(simple(JsonType::Boolean)),

            // Numbers
            FieldKind::Integer => Ok(formatted(JsonType::Number, "integer")),
            FieldKind::Float => Ok(formatted(JsonType::Number, "float")),
            FieldKind::Number | FieldKind::Decimal => Ok(formatted(JsonType::Number, "decimal")),

            // Formats
            FieldKind::Date => Ok(formatted(JsonType::String, "date")),
            FieldKind::Time => Ok(formatted(JsonType::String, "time")),
            FieldKind::DateTime => Ok(formatted(JsonType::String, "date-time")),
            FieldKind::Uuid => Ok(formatted(JsonType::String, "uuid")),

            FieldKind::Enum(members) => {
                let mut fragment = simple(JsonType::String);
                fragment.insert("enum".to_string(), json!(members));
                Ok(fragment)
            }

            // Containers
            FieldKind::Dict(_) => Ok(simple(JsonType::Object)),
            FieldKind::List(_) => Ok(simple(JsonType::Array)),
            FieldKind::Nested(_) => Ok(simple(JsonType::Object)),
            FieldKind::Union(_) => Ok(Fragment::new()),

            // Fallback: extension kinds
            FieldKind::Custom(name) => match self.extensions.kind(name) {
                Some(mapper) => mapper(field),
                None => Err(AppError::unsupported(
                    &field.name,
                    format!("no JSON Schema mapping for kind '{}'", name),
                )),
            },
        }
    }
}

/// Returns the fragment a field supplies for itself, if any.
///
/// The `type_override` hook wins over a literal fragment stored under the
/// `_jsonschema_type_mapping` metadata key.
pub fn type_override(field: &FieldDescriptor) -> AppResult<Option<Fragment>> {
    if let Some(over) = &field.type_override {
        return match over {
            TypeOverride::Literal(fragment) => Ok(Some(fragment.clone())),
            TypeOverride::Handler(hook) => hook(field).map(Some),
        };
    }

    match field.metadata_value(TYPE_MAPPING_KEY) {
        None => Ok(None),
        Some(Value::Object(fragment)) => Ok(Some(fragment.clone())),
        Some(other) => Err(AppError::unsupported(
            &field.name,
            format!("`{}` must be an object, got {}", TYPE_MAPPING_KEY, other),
        )),
    }
}

/// Wraps a base fragment with the field-level keys.
///
/// Key order: `title`, the base keys, then `readonly`, `default` and metadata.
/// A nullable field gets `[type, "null"]`, or a null candidate for unions.
pub fn decorate(base: Fragment, field: &FieldDescriptor) -> Fragment {
    let mut fragment = Fragment::new();
    fragment.insert("title".to_string(), json!(field.title()));
    fragment.extend(base);

    if field.nullable {
        make_nullable(&mut fragment);
    }

    if field.read_only {
        fragment.insert("readonly".to_string(), json!(true));
    }

    if let Some(default) = &field.default {
        fragment.insert("default".to_string(), default.clone());
    }

    for (key, value) in field.schema_metadata() {
        fragment.insert(key, value);
    }

    fragment
}

fn make_nullable(fragment: &mut Fragment) {
    if let Some(Value::Array(any_of)) = fragment.get_mut("anyOf") {
        any_of.push(json!({ "type": JsonType::Null.to_string() }));
        return;
    }
    match fragment.get_mut("type") {
        Some(Value::Array(types)) => {
            let null = json!(JsonType::Null.to_string());
            if !types.contains(&null) {
                types.push(null);
            }
        }
        Some(ty) => {
            let previous = ty.take();
            *ty = json!([previous, JsonType::Null.to_string()]);
        }
        None => {}
    }
}

// Helpers for cleaner construction
fn simple(t: JsonType) -> Fragment {
    let mut fragment = Fragment::new();
    fragment.insert("type".to_string(), json!(t.to_string()));
    fragment
}

fn formatted(t: JsonType, fmt: &str) -> Fragment {
    let mut fragment = simple(t);
    fragment.insert("format".to_string(), json!(fmt));
    fragment
}
