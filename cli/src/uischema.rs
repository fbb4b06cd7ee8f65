#![deny(missing_docs)]

//! # uiSchema Command
//!
//! Writes the react-jsonschema-form uiSchema of a schema.

use crate::dump::{emit, render, OutputFormat};
use crate::error::{CliError, CliResult};
use schemagen_core::{load_registry_path, ui_schema, JsonSchemaGenerator};
use std::path::PathBuf;

/// Arguments for the uischema command.
#[derive(clap::Args, Debug, Clone)]
pub struct UiSchemaArgs {
    /// Schema definition document (YAML or JSON).
    pub input: PathBuf,

    /// Name of the schema.
    #[clap(long)]
    pub schema: String,

    /// Output path. Prints to stdout when omitted.
    #[clap(long)]
    pub output: Option<PathBuf>,
}

/// Executes the uischema command.
pub fn execute(args: &UiSchemaArgs) -> CliResult<()> {
    let registry = load_registry_path(&args.input)?;
    let schema = registry
        .get(&args.schema)
        .ok_or_else(|| CliError::General(format!("No schema named '{}'", args.schema)))?;

    let generator = JsonSchemaGenerator::new().with_registry(&registry);
    let ui = ui_schema(&generator, &schema);
    emit(&render(&ui, OutputFormat::Json)?, args.output.as_deref())
}
