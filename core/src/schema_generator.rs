#![deny(missing_docs)]

//! # Schema Generator
//!
//! Walks a schema's fields and produces a draft-07 JSON Schema document:
//!
//! ```json
//! {
//!   "$schema": "http://json-schema.org/draft-07/schema#",
//!   "definitions": { "User": { "type": "object", "properties": { ... } } },
//!   "$ref": "#/definitions/User"
//! }
//! ```
//!
//! Nested schemas are emitted once into `definitions` and referenced with `$ref`,
//! which also terminates self- and mutually-recursive schemas.

mod definitions;

pub use definitions::Definitions;

use crate::error::{AppError, AppResult};
use crate::extensions::Extensions;
use crate::model::{
    FieldDescriptor, FieldKind, Fragment, NestedField, NestedTarget, Schema, UnknownFields,
};
use crate::registry::SchemaRegistry;
use crate::type_mapping::{decorate, type_override, KindMapper, TypeMapper};
use crate::validation::{apply_validators, TranslateOptions};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, trace};

/// The JSON Schema dialect of generated documents.
pub const DRAFT_07: &str = "http://json-schema.org/draft-07/schema#";

/// Construction-time configuration of a [`JsonSchemaGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Emit properties in declaration order instead of sorted by public name.
    pub preserve_declaration_order: bool,
    /// Let a field's `name` metadata override its public name.
    pub prefer_public_name_override: bool,
    /// Fail on validators that have no translation (otherwise skip them).
    pub strict_validators: bool,
    /// Treat range bounds of exactly zero as absent.
    pub legacy_range_zero: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            preserve_declaration_order: false,
            prefer_public_name_override: false,
            strict_validators: true,
            legacy_range_zero: false,
        }
    }
}

impl GeneratorOptions {
    /// Sets [`GeneratorOptions::preserve_declaration_order`].
    pub fn with_preserve_declaration_order(mut self, value: bool) -> Self {
        self.preserve_declaration_order = value;
        self
    }

    /// Sets [`GeneratorOptions::prefer_public_name_override`].
    pub fn with_prefer_public_name_override(mut self, value: bool) -> Self {
        self.prefer_public_name_override = value;
        self
    }

    /// Sets [`GeneratorOptions::strict_validators`].
    pub fn with_strict_validators(mut self, value: bool) -> Self {
        self.strict_validators = value;
        self
    }

    /// Sets [`GeneratorOptions::legacy_range_zero`].
    pub fn with_legacy_range_zero(mut self, value: bool) -> Self {
        self.legacy_range_zero = value;
        self
    }
}

/// Converts schemas into JSON Schema documents.
///
/// The generator only holds configuration; every [`JsonSchemaGenerator::dump`]
/// starts from an empty [`Definitions`] cache, so one generator can serve any
/// number of dumps, including from several threads.
#[derive(Debug, Clone, Default)]
pub struct JsonSchemaGenerator<'r> {
    options: GeneratorOptions,
    registry: Option<&'r SchemaRegistry>,
    extensions: Extensions,
}

impl<'r> JsonSchemaGenerator<'r> {
    /// A generator with default options, no registry and no extensions.
    pub fn new() -> Self {
        Self {
            options: GeneratorOptions::default(),
            registry: None,
            extensions: Extensions::default(),
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: GeneratorOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the registry used for nested fields that reference schemas by name.
    pub fn with_registry(mut self, registry: &'r SchemaRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the extension capability table.
    pub fn with_extensions(mut self, extensions: Extensions) -> Self {
        self.extensions = extensions;
        self
    }

    /// The active options.
    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Dumps `schema` as the root of a new document.
    pub fn dump(&self, schema: &Schema) -> AppResult<Value> {
        debug!(schema = %schema.name, "dumping root schema");
        let mut definitions = Definitions::new();
        definitions.reserve(&schema.name);

        let definition = self.definition(schema, &mut definitions)?;
        definitions.resolve(&schema.name, definition);
        debug!(schema = %schema.name, definitions = definitions.len(), "dump complete");

        let mut root = Fragment::new();
        root.insert("$schema".to_string(), json!(DRAFT_07));
        root.insert(
            "definitions".to_string(),
            Value::Object(definitions.finish()?),
        );
        root.insert("$ref".to_string(), json!(definition_ref(&schema.name)));
        Ok(Value::Object(root))
    }

    /// Dumps the registered schema called `name`.
    pub fn dump_named(&self, name: &str) -> AppResult<Value> {
        let schema = self
            .registry
            .and_then(|r| r.get(name))
            .ok_or_else(|| AppError::UnresolvedReference {
                name: name.to_string(),
                field: "<root>".to_string(),
            })?;
        self.dump(&schema)
    }

    /// Fields of `schema` in emission order.
    pub(crate) fn ordered_fields<'s>(&self, schema: &'s Schema) -> Vec<&'s FieldDescriptor> {
        let mut fields: Vec<&FieldDescriptor> = schema.fields.iter().collect();
        if !self.options.preserve_declaration_order {
            let prefer = self.options.prefer_public_name_override;
            fields.sort_by(|a, b| a.public_name(prefer).cmp(b.public_name(prefer)));
        }
        fields
    }

    /// Builds the full definition of one schema (root or nested).
    fn definition(&self, schema: &Schema, definitions: &mut Definitions) -> AppResult<Fragment> {
        let mut out = Fragment::new();

        if let Some(title) = string_option(schema, "title", schema.options.title.as_ref())? {
            out.insert("title".to_string(), json!(title));
        }
        if let Some(description) =
            string_option(schema, "description", schema.options.description.as_ref())?
        {
            out.insert("description".to_string(), json!(description));
        }

        out.insert("type".to_string(), json!("object"));

        let prefer = self.options.prefer_public_name_override;
        let mut properties = Fragment::new();
        let mut required = Vec::new();

        for field in self.ordered_fields(schema) {
            let key = field.public_name(prefer).to_string();
            let fragment = self.field_fragment(field, definitions)?;
            properties.insert(key.clone(), Value::Object(fragment));

            if field.required && !schema.is_partial(&field.name) {
                required.push(Value::String(key));
            }
        }

        out.insert("properties".to_string(), Value::Object(properties));
        if !required.is_empty() {
            out.insert("required".to_string(), Value::Array(required));
        }
        out.insert(
            "additionalProperties".to_string(),
            json!(additional_properties(schema)?),
        );

        Ok(out)
    }

    /// Fragment of one field, validators applied.
    fn field_fragment(
        &self,
        field: &FieldDescriptor,
        definitions: &mut Definitions,
    ) -> AppResult<Fragment> {
        let fragment = match type_override(field)? {
            Some(fragment) => fragment,
            None => match &field.kind {
                FieldKind::Nested(nested) => self.nested_fragment(field, nested, definitions)?,
                _ => self.mapped_fragment(field, definitions)?,
            },
        };

        apply_validators(fragment, field, &self.extensions, self.translate_options())
    }

    fn mapped_fragment(
        &self,
        field: &FieldDescriptor,
        definitions: &mut Definitions,
    ) -> AppResult<Fragment> {
        let mut base = KindMapper::new(&self.extensions).map(field)?;

        match &field.kind {
            FieldKind::Dict(values) => {
                let values = match values {
                    Some(inner) => Value::Object(self.field_fragment(inner, definitions)?),
                    None => json!({}),
                };
                base.insert("additionalProperties".to_string(), values);
            }
            FieldKind::Union(candidates) => {
                let any_of = candidates
                    .iter()
                    .map(|c| self.field_fragment(c, definitions).map(Value::Object))
                    .collect::<AppResult<Vec<_>>>()?;
                base.insert("anyOf".to_string(), Value::Array(any_of));
            }
            _ => {}
        }

        let mut fragment = decorate(base, field);

        if let FieldKind::List(inner) = &field.kind {
            let items = self.field_fragment(inner, definitions)?;
            fragment.insert("items".to_string(), Value::Object(items));
        }

        Ok(fragment)
    }

    /// Emits the referenced schema into `definitions` (once) and returns a `$ref`
    /// fragment pointing at it.
    fn nested_fragment(
        &self,
        field: &FieldDescriptor,
        nested: &NestedField,
        definitions: &mut Definitions,
    ) -> AppResult<Fragment> {
        let target = self.resolve_target(field, nested)?;
        let name = target.name.as_str();

        if definitions.reserve(name) {
            debug!(schema = %name, field = %field.name, "walking nested schema");
            let visible = target.restrict(nested.only.as_deref(), &nested.exclude)?;
            let definition = self.definition(&visible, definitions)?;
            definitions.resolve(name, definition);
        } else {
            trace!(schema = %name, field = %field.name, "nested schema already defined");
        }

        let mut reference = Fragment::new();
        reference.insert("type".to_string(), json!("object"));
        reference.insert("$ref".to_string(), json!(definition_ref(name)));
        for (key, value) in field.schema_metadata() {
            reference.insert(key, value);
        }

        if !nested.many {
            return Ok(reference);
        }

        let array_type = if field.required {
            json!(["array"])
        } else {
            json!(["array", "null"])
        };
        let mut wrapper = Fragment::new();
        wrapper.insert("type".to_string(), array_type);
        wrapper.insert("items".to_string(), Value::Object(reference));
        Ok(wrapper)
    }

    fn resolve_target(
        &self,
        field: &FieldDescriptor,
        nested: &NestedField,
    ) -> AppResult<Arc<Schema>> {
        match &nested.target {
            NestedTarget::Instance(schema) => Ok(Arc::clone(schema)),
            NestedTarget::Named(name) => self
                .registry
                .and_then(|registry| registry.get(name))
                .ok_or_else(|| AppError::UnresolvedReference {
                    name: name.clone(),
                    field: field.name.clone(),
                }),
        }
    }

    fn translate_options(&self) -> TranslateOptions {
        TranslateOptions {
            strict: self.options.strict_validators,
            legacy_range_zero: self.options.legacy_range_zero,
        }
    }
}

/// `#/definitions/<name>`.
pub fn definition_ref(name: &str) -> String {
    format!("#/definitions/{}", name)
}

/// Resolves `additionalProperties` for a schema.
///
/// An explicit boolean override wins. Otherwise only `unknown = include` allows
/// additional properties.
pub fn additional_properties(schema: &Schema) -> AppResult<bool> {
    match &schema.options.additional_properties {
        Some(Value::Bool(allowed)) => Ok(*allowed),
        Some(other) => Err(AppError::unsupported(
            &schema.name,
            format!("`additional_properties` must be either true or false, got {}", other),
        )),
        None => Ok(matches!(schema.options.unknown, Some(UnknownFields::Include))),
    }
}

fn string_option<'s>(
    schema: &Schema,
    option: &str,
    value: Option<&'s Value>,
) -> AppResult<Option<&'s str>> {
    match value {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(AppError::unsupported(
            &schema.name,
            format!("`{}` must be a string, got {}", option, other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Length, Partial, SchemaOptions};

    fn dump(schema: &Schema) -> Value {
        JsonSchemaGenerator::new().dump(schema).unwrap()
    }

    fn inner() -> Schema {
        Schema::new("Inner").with_field(FieldDescriptor::integer("foo").with_required(true))
    }

    #[test]
    fn test_scenario_required_and_default() {
        let schema = Schema::new("Person")
            .with_field(FieldDescriptor::string("name").with_required(true))
            .with_field(FieldDescriptor::integer("age").with_default(0));

        let doc = dump(&schema);
        let def = &doc["definitions"]["Person"];
        assert_eq!(def["required"], json!(["name"]));
        assert_eq!(def["properties"]["age"]["default"], 0);
        assert_eq!(doc["$schema"], DRAFT_07);
        assert_eq!(doc["$ref"], "#/definitions/Person");
    }

    #[test]
    fn test_scenario_nested_reference() {
        let outer = Schema::new("Outer")
            .with_field(FieldDescriptor::nested("bar", NestedField::to(inner())));

        let doc = dump(&outer);
        let defs = doc["definitions"].as_object().unwrap();
        assert_eq!(defs.len(), 2);
        assert!(defs.contains_key("Inner"));
        assert_eq!(
            doc["definitions"]["Outer"]["properties"]["bar"],
            json!({"type": "object", "$ref": "#/definitions/Inner"})
        );
    }

    #[test]
    fn test_scenario_many_required() {
        let outer = Schema::new("Outer").with_field(
            FieldDescriptor::nested("items", NestedField::to(inner()).with_many(true))
                .with_required(true),
        );
        assert_eq!(
            dump(&outer)["definitions"]["Outer"]["properties"]["items"],
            json!({"type": ["array"], "items": {"type": "object", "$ref": "#/definitions/Inner"}})
        );
    }

    #[test]
    fn test_many_optional_is_nullable_array() {
        let outer = Schema::new("Outer")
            .with_field(FieldDescriptor::nested("items", NestedField::to(inner()).with_many(true)));
        assert_eq!(
            dump(&outer)["definitions"]["Outer"]["properties"]["items"]["type"],
            json!(["array", "null"])
        );
    }

    #[test]
    fn test_required_omitted_when_empty() {
        let schema = Schema::new("T").with_field(FieldDescriptor::string("optional_value"));
        let doc = dump(&schema);
        assert!(doc["definitions"]["T"].get("required").is_none());
    }

    #[test]
    fn test_partial_exempts_fields() {
        let schema = Schema::new("T")
            .with_field(FieldDescriptor::string("a").with_required(true))
            .with_field(FieldDescriptor::string("b").with_required(true))
            .with_options(SchemaOptions {
                partial: Partial::Fields(vec!["a".into()]),
                ..SchemaOptions::default()
            });
        assert_eq!(dump(&schema)["definitions"]["T"]["required"], json!(["b"]));
    }

    #[test]
    fn test_self_reference_terminates() {
        let registry = SchemaRegistry::new().with_schema(
            Schema::new("RecursiveSchema")
                .with_field(FieldDescriptor::integer("foo").with_required(true))
                .with_field(FieldDescriptor::nested(
                    "children",
                    NestedField::to("RecursiveSchema").with_many(true),
                )),
        );
        let doc = JsonSchemaGenerator::new()
            .with_registry(&registry)
            .dump_named("RecursiveSchema")
            .unwrap();
        let defs = doc["definitions"].as_object().unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(
            doc["definitions"]["RecursiveSchema"]["properties"]["children"]["items"]["$ref"],
            "#/definitions/RecursiveSchema"
        );
    }

    #[test]
    fn test_unresolved_reference() {
        let schema = Schema::new("T")
            .with_field(FieldDescriptor::nested("n", NestedField::to("Missing")));
        match JsonSchemaGenerator::new().dump(&schema) {
            Err(AppError::UnresolvedReference { name, field }) => {
                assert_eq!(name, "Missing");
                assert_eq!(field, "n");
            }
            other => panic!("expected UnresolvedReference, got {:?}", other),
        }
    }

    #[test]
    fn test_sorted_and_declared_order() {
        let schema = Schema::new("T")
            .with_field(FieldDescriptor::string("d"))
            .with_field(FieldDescriptor::string("c"))
            .with_field(FieldDescriptor::string("a"));

        let sorted = dump(&schema);
        let keys: Vec<&String> = sorted["definitions"]["T"]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["a", "c", "d"]);

        let ordered = JsonSchemaGenerator::new()
            .with_options(GeneratorOptions::default().with_preserve_declaration_order(true))
            .dump(&schema)
            .unwrap();
        let keys: Vec<&String> = ordered["definitions"]["T"]["properties"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(keys, vec!["d", "c", "a"]);
    }

    #[test]
    fn test_additional_properties_resolution() {
        let mut schema = Schema::new("T");
        assert!(!additional_properties(&schema).unwrap());

        schema.options.unknown = Some(UnknownFields::Include);
        assert!(additional_properties(&schema).unwrap());

        schema.options.unknown = Some(UnknownFields::Exclude);
        assert!(!additional_properties(&schema).unwrap());

        schema.options.additional_properties = Some(json!(true));
        assert!(additional_properties(&schema).unwrap());

        schema.options.additional_properties = Some(json!("foo"));
        assert!(matches!(
            additional_properties(&schema),
            Err(AppError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_title_and_description_options() {
        let mut schema = Schema::new("T").with_field(FieldDescriptor::integer("foo"));
        schema.options.title = Some(json!("A title"));
        schema.options.description = Some(json!("desc1"));
        let doc = dump(&schema);
        assert_eq!(doc["definitions"]["T"]["title"], "A title");
        assert_eq!(doc["definitions"]["T"]["description"], "desc1");

        schema.options.description = Some(json!(4));
        assert!(JsonSchemaGenerator::new().dump(&schema).is_err());
    }

    #[test]
    fn test_misspelled_only_fails_dump() {
        let outer = Schema::new("Outer").with_field(FieldDescriptor::nested(
            "bar",
            NestedField::to(inner()).with_only(["fooo"]),
        ));
        match JsonSchemaGenerator::new().dump(&outer) {
            Err(AppError::UnsupportedType { subject, reason }) => {
                assert_eq!(subject, "Inner");
                assert!(reason.contains("fooo"), "{}", reason);
            }
            other => panic!("expected UnsupportedType, got {:?}", other),
        }
    }

    #[test]
    fn test_validators_apply_after_nested_wrap() {
        let outer = Schema::new("Outer").with_field(
            FieldDescriptor::nested("addresses", NestedField::to(inner()).with_many(true))
                .with_validator(Length::new(Some(1), Some(3))),
        );
        let prop = &dump(&outer)["definitions"]["Outer"]["properties"]["addresses"];
        assert_eq!(prop["minItems"], 1);
        assert_eq!(prop["maxItems"], 3);
    }
}
