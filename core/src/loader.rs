#![deny(missing_docs)]

//! # Schema Document Loader
//!
//! Reads schema definitions from YAML or JSON into a [`SchemaRegistry`].
//!
//! The shims below are an intermediate deserialization layer mirroring the
//! document format; they are converted into model types after parsing.
//!
//! ```yaml
//! schemas:
//!   Address:
//!     options: { unknown: exclude }
//!     fields:
//!       - name: street
//!         type: string
//!         required: true
//!         validate:
//!           - length: { min: 1, max: 255 }
//!   User:
//!     fields:
//!       - { name: addresses, type: nested, schema: Address, many: true }
//! ```

use crate::error::{AppError, AppResult};
use crate::model::{
    CustomValidator, FieldDescriptor, FieldKind, Length, NestedField, NestedTarget, OneOf,
    Partial, Range, Regexp, Schema, SchemaOptions, TypeOverride, UnknownFields, Validator,
};
use crate::registry::SchemaRegistry;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Root of a schema definition document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShimDocument {
    /// Schemas keyed by name.
    #[serde(default)]
    pub schemas: IndexMap<String, ShimSchema>,
}

/// One schema definition.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShimSchema {
    /// Schema-level options.
    #[serde(default)]
    pub options: ShimOptions,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<ShimField>,
}

/// Schema-level options. Unrecognized keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct ShimOptions {
    /// `raise`, `exclude` or `include`.
    pub unknown: Option<UnknownFields>,
    /// Explicit `additionalProperties`.
    pub additional_properties: Option<Value>,
    /// Definition title.
    pub title: Option<Value>,
    /// Definition description.
    pub description: Option<Value>,
    /// `true` for all fields, or a list of field names.
    pub partial: Option<ShimPartial>,
    /// Extra uiSchema entries.
    #[serde(default)]
    pub ui: IndexMap<String, Value>,
}

/// Either every field or a named subset.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ShimPartial {
    /// `true` exempts every field, `false` none.
    All(bool),
    /// Exempted field names.
    Fields(Vec<String>),
}

/// One field definition.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShimField {
    /// Declared name (may be empty for list items and union variants).
    #[serde(default)]
    pub name: String,
    /// Kind name.
    #[serde(rename = "type")]
    pub kind: String,
    /// Required flag.
    #[serde(default)]
    pub required: bool,
    /// Nullable flag.
    #[serde(default)]
    pub nullable: bool,
    /// Read-only flag.
    #[serde(default)]
    pub read_only: bool,
    /// Default value; an explicit `null` is a present default.
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,
    /// Public name.
    pub data_key: Option<String>,
    /// Source attribute.
    pub attribute: Option<String>,
    /// Metadata copied into the fragment.
    #[serde(default)]
    pub metadata: IndexMap<String, Value>,
    /// Validators.
    #[serde(default)]
    pub validate: Vec<ShimValidator>,
    /// Literal fragment replacing the mapped type.
    pub type_mapping: Option<Map<String, Value>>,
    /// `list`: element field.
    pub items: Option<Box<ShimField>>,
    /// `dict`: value field.
    pub values: Option<Box<ShimField>>,
    /// `nested`: referenced schema name.
    pub schema: Option<String>,
    /// `nested`: collection flag.
    #[serde(default)]
    pub many: bool,
    /// `nested`: allow-list.
    pub only: Option<Vec<String>>,
    /// `nested`: deny-list.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// `enum`: member names.
    pub members: Option<Vec<String>>,
    /// `union`: candidate fields.
    pub variants: Option<Vec<ShimField>>,
}

/// One validator, keyed by kind.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum ShimValidator {
    /// Length bounds.
    Length {
        /// Lower bound.
        #[serde(default)]
        min: Option<u64>,
        /// Upper bound.
        #[serde(default)]
        max: Option<u64>,
        /// Exact length.
        #[serde(default)]
        equal: Option<u64>,
    },
    /// Membership.
    OneOf {
        /// Allowed values.
        choices: Vec<Value>,
        /// Labels parallel to `choices`.
        #[serde(default)]
        labels: Option<Vec<String>>,
    },
    /// Numeric bounds.
    Range {
        /// Lower bound.
        #[serde(default)]
        min: Option<Number>,
        /// Upper bound.
        #[serde(default)]
        max: Option<Number>,
        /// Lower bound inclusivity.
        #[serde(default = "inclusive")]
        min_inclusive: bool,
        /// Upper bound inclusivity.
        #[serde(default = "inclusive")]
        max_inclusive: bool,
    },
    /// Pattern source text.
    Regexp(String),
    /// Extension validator.
    Custom {
        /// Extension name.
        name: String,
        /// Built-in validator to fall back to.
        #[serde(default)]
        base: Option<Box<ShimValidator>>,
        /// Parameters for the extension translator.
        #[serde(default)]
        params: Map<String, Value>,
    },
}

fn inclusive() -> bool {
    true
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Parses a YAML (or JSON) schema document.
pub fn load_registry_str(text: &str) -> AppResult<SchemaRegistry> {
    let raw: Value = serde_yaml::from_str(text)
        .map_err(|e| AppError::General(format!("Failed to parse schema document: {}", e)))?;
    load_registry_value(raw)
}

/// Reads and parses a schema document from disk.
pub fn load_registry_path(path: &Path) -> AppResult<SchemaRegistry> {
    let text = fs::read_to_string(path)?;
    load_registry_str(&text).map_err(|e| match e {
        AppError::General(msg) => AppError::General(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Converts an already-parsed schema document.
pub fn load_registry_value(raw: Value) -> AppResult<SchemaRegistry> {
    let doc: ShimDocument = serde_json::from_value(raw)
        .map_err(|e| AppError::General(format!("Invalid schema document: {}", e)))?;

    let mut registry = SchemaRegistry::new();
    for (name, shim) in doc.schemas {
        let schema = convert_schema(name, shim)?;
        debug!(schema = %schema.name, fields = schema.fields.len(), "loaded schema");
        registry.register(schema);
    }
    Ok(registry)
}

fn convert_schema(name: String, shim: ShimSchema) -> AppResult<Schema> {
    let fields = shim
        .fields
        .into_iter()
        .map(|field| convert_field(&name, field))
        .collect::<AppResult<Vec<_>>>()?;

    let partial = match shim.options.partial {
        None | Some(ShimPartial::All(false)) => Partial::None,
        Some(ShimPartial::All(true)) => Partial::All,
        Some(ShimPartial::Fields(names)) => Partial::Fields(names),
    };

    let options = SchemaOptions {
        unknown: shim.options.unknown,
        additional_properties: shim.options.additional_properties,
        title: shim.options.title,
        description: shim.options.description,
        partial,
        ui_extra: shim.options.ui,
    };

    Ok(Schema {
        name,
        fields,
        options,
    })
}

fn convert_field(schema: &str, shim: ShimField) -> AppResult<FieldDescriptor> {
    let context = format!("{}.{}", schema, shim.name);
    let missing = |key: &str| {
        AppError::General(format!(
            "Field '{}' of type '{}' needs `{}`",
            context, shim.kind, key
        ))
    };

    let kind = match shim.kind.as_str() {
        "list" => {
            let items = shim.items.ok_or_else(|| missing("items"))?;
            FieldKind::List(Box::new(convert_inner(schema, &shim.name, *items)?))
        }
        "dict" => {
            let values = match shim.values {
                Some(values) => Some(Box::new(convert_inner(schema, &shim.name, *values)?)),
                None => None,
            };
            FieldKind::Dict(values)
        }
        "nested" => {
            let target = shim.schema.ok_or_else(|| missing("schema"))?;
            FieldKind::Nested(NestedField {
                target: NestedTarget::Named(target),
                many: shim.many,
                only: shim.only,
                exclude: shim.exclude,
            })
        }
        "enum" => FieldKind::Enum(shim.members.ok_or_else(|| missing("members"))?),
        "union" => {
            let variants = shim.variants.ok_or_else(|| missing("variants"))?;
            FieldKind::Union(
                variants
                    .into_iter()
                    .map(|v| convert_inner(schema, &shim.name, v))
                    .collect::<AppResult<Vec<_>>>()?,
            )
        }
        other => FieldKind::scalar(other).unwrap_or_else(|| FieldKind::Custom(other.to_string())),
    };

    let validators = shim.validate.into_iter().map(convert_validator).collect();

    Ok(FieldDescriptor {
        name: shim.name,
        data_key: shim.data_key,
        attribute: shim.attribute,
        kind,
        required: shim.required,
        nullable: shim.nullable,
        read_only: shim.read_only,
        default: shim.default,
        metadata: shim.metadata,
        validators,
        type_override: shim.type_mapping.map(TypeOverride::Literal),
    })
}

/// Inner fields (list items, dict values, union variants) without a name of
/// their own take the name of the field that holds them.
fn convert_inner(schema: &str, parent: &str, mut shim: ShimField) -> AppResult<FieldDescriptor> {
    if shim.name.is_empty() {
        shim.name = parent.to_string();
    }
    convert_field(schema, shim)
}

fn convert_validator(shim: ShimValidator) -> Validator {
    match shim {
        ShimValidator::Length { min, max, equal } => Validator::Length(Length { min, max, equal }),
        ShimValidator::OneOf { choices, labels } => Validator::OneOf(OneOf { choices, labels }),
        ShimValidator::Range {
            min,
            max,
            min_inclusive,
            max_inclusive,
        } => Validator::Range(Range {
            min,
            max,
            min_inclusive,
            max_inclusive,
        }),
        ShimValidator::Regexp(pattern) => Validator::Regexp(Regexp::new(pattern)),
        ShimValidator::Custom { name, base, params } => Validator::Custom(CustomValidator {
            name,
            base: base.map(|base| Box::new(convert_validator(*base))),
            params,
        }),
    }
}
