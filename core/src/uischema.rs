//! # react-jsonschema-form uiSchema
//!
//! Companion document for react-jsonschema-form: every `ui:*` metadata entry of a
//! field is collected under the field's public name, and the schema's
//! `ui_extra` options are merged in at the top level.

use crate::error::AppResult;
use crate::model::Schema;
use crate::schema_generator::JsonSchemaGenerator;
use serde_json::{Map, Value};

const UI_PREFIX: &str = "ui:";

/// Dumps `schema` together with its uiSchema.
pub fn dump_with_uischema(
    generator: &JsonSchemaGenerator<'_>,
    schema: &Schema,
) -> AppResult<(Value, Value)> {
    let json_schema = generator.dump(schema)?;
    Ok((json_schema, ui_schema(generator, schema)))
}

/// Builds the uiSchema of `schema` using the generator's naming and ordering.
pub fn ui_schema(generator: &JsonSchemaGenerator<'_>, schema: &Schema) -> Value {
    let prefer = generator.options().prefer_public_name_override;
    let mut ui = Map::new();

    for field in generator.ordered_fields(schema) {
        let entries: Map<String, Value> = field
            .schema_metadata()
            .into_iter()
            .filter(|(key, _)| key.starts_with(UI_PREFIX))
            .collect();
        ui.insert(field.public_name(prefer).to_string(), Value::Object(entries));
    }

    for (key, value) in &schema.options.ui_extra {
        ui.insert(key.clone(), value.clone());
    }

    Value::Object(ui)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FieldDescriptor, SchemaOptions};
    use serde_json::json;

    #[test]
    fn test_can_dump_react_jsonschema_form() {
        let mut options = SchemaOptions::default();
        options
            .ui_extra
            .insert("ui:order".into(), json!(["first_name", "last_name"]));
        let schema = Schema::new("MySchema")
            .with_field(FieldDescriptor::string("first_name").with_metadata("ui:autofocus", true))
            .with_field(FieldDescriptor::string("last_name"))
            .with_options(options);

        let generator = JsonSchemaGenerator::new();
        let (json_schema, uischema) = dump_with_uischema(&generator, &schema).unwrap();

        assert_eq!(
            uischema,
            json!({
                "first_name": {"ui:autofocus": true},
                "last_name": {},
                "ui:order": ["first_name", "last_name"]
            })
        );
        assert_eq!(json_schema["$ref"], "#/definitions/MySchema");
    }

    #[test]
    fn test_non_ui_metadata_ignored() {
        let schema = Schema::new("S")
            .with_field(FieldDescriptor::string("a").with_metadata("description", "not ui"));
        let ui = ui_schema(&JsonSchemaGenerator::new(), &schema);
        assert_eq!(ui, json!({"a": {}}));
    }
}
