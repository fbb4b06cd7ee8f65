#![deny(missing_docs)]

//! # Dump Command
//!
//! Loads a schema definition document and writes the JSON Schema of one of
//! its schemas.

use crate::error::{CliError, CliResult};
use schemagen_core::{load_registry_path, GeneratorOptions, JsonSchemaGenerator};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Output encodings.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

/// Arguments for the dump command.
#[derive(clap::Args, Debug, Clone)]
pub struct DumpArgs {
    /// Schema definition document (YAML or JSON).
    pub input: PathBuf,

    /// Name of the schema to dump.
    #[clap(long)]
    pub schema: String,

    /// Keep declaration order instead of sorting properties by name.
    #[clap(long)]
    pub ordered: bool,

    /// Let a field's `name` metadata override its public name.
    #[clap(long)]
    pub prefer_name_override: bool,

    /// Skip validators without a translation instead of failing.
    #[clap(long)]
    pub lenient_validators: bool,

    /// Treat range bounds of exactly zero as absent.
    #[clap(long)]
    pub legacy_range_zero: bool,

    /// Output encoding.
    #[clap(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Output path. Prints to stdout when omitted.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

impl DumpArgs {
    fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions::default()
            .with_preserve_declaration_order(self.ordered)
            .with_prefer_public_name_override(self.prefer_name_override)
            .with_strict_validators(!self.lenient_validators)
            .with_legacy_range_zero(self.legacy_range_zero)
    }
}

/// Executes the dump command.
pub fn execute(args: &DumpArgs) -> CliResult<()> {
    let registry = load_registry_path(&args.input)?;
    let generator = JsonSchemaGenerator::new()
        .with_options(args.generator_options())
        .with_registry(&registry);

    let document = generator.dump_named(&args.schema)?;
    let rendered = render(&document, args.format)?;
    emit(&rendered, args.output.as_deref())?;

    info!(schema = %args.schema, "schema dumped");
    Ok(())
}

/// Serializes a document in the requested format.
pub fn render(document: &Value, format: OutputFormat) -> CliResult<String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .map_err(|e| CliError::General(format!("JSON serialization failed: {}", e))),
        OutputFormat::Yaml => serde_yaml::to_string(document)
            .map_err(|e| CliError::General(format!("YAML serialization failed: {}", e))),
    }
}

/// Writes `content` to `output`, creating parent directories, or prints it.
pub fn emit(content: &str, output: Option<&Path>) -> CliResult<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(path, content)?;
            println!("Schema written to {:?}", path);
        }
        None => println!("{}", content),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const DOC: &str = r#"
schemas:
  Pet:
    fields:
      - { name: name, type: string, required: true }
      - name: age
        type: integer
        validate:
          - range: { min: 0, max: 30 }
      - { name: owner, type: nested, schema: Owner }
  Owner:
    fields:
      - { name: email, type: email }
"#;

    fn make_args(input: PathBuf, output: PathBuf) -> DumpArgs {
        DumpArgs {
            input,
            schema: "Pet".to_string(),
            ordered: false,
            prefer_name_override: false,
            lenient_validators: false,
            legacy_range_zero: false,
            format: OutputFormat::Json,
            output: Some(output),
        }
    }

    #[test]
    fn test_dump_to_json_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("pets.yaml");
        let output = dir.path().join("out/pet.json");
        fs::write(&input, DOC).unwrap();

        execute(&make_args(input, output.clone())).unwrap();

        let written: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["$ref"], "#/definitions/Pet");
        assert_eq!(written["definitions"]["Pet"]["properties"]["age"]["minimum"], 0);
        assert!(written["definitions"]["Owner"].is_object());
    }

    #[test]
    fn test_dump_yaml_with_legacy_zero() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("pets.yaml");
        let output = dir.path().join("pet.yaml");
        fs::write(&input, DOC).unwrap();

        let mut args = make_args(input, output.clone());
        args.format = OutputFormat::Yaml;
        args.legacy_range_zero = true;
        execute(&args).unwrap();

        let written: Value = serde_yaml::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let age = written["definitions"]["Pet"]["properties"]["age"]
            .as_object()
            .unwrap();
        assert!(!age.contains_key("minimum"));
        assert_eq!(age["maximum"], 30);
    }

    #[test]
    fn test_dump_unknown_schema_fails() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("pets.yaml");
        fs::write(&input, DOC).unwrap();

        let mut args = make_args(input, dir.path().join("x.json"));
        args.schema = "Cat".to_string();
        assert!(matches!(execute(&args), Err(CliError::Core(_))));
    }
}
