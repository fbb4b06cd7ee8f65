#![deny(missing_docs)]

//! # Schemagen CLI
//!
//! Command Line Interface over schema definition documents.
//!
//! Supported Commands:
//! - `dump`: Writes the draft-07 JSON Schema of a named schema.
//! - `uischema`: Writes the react-jsonschema-form uiSchema of a named schema.
//! - `list`: Prints the schema names a document defines.

use clap::{Parser, Subcommand};
use schemagen_core::load_registry_path;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::error::CliResult;

mod dump;
mod error;
mod uischema;

#[derive(Parser, Debug)]
#[clap(author, version, about = "JSON Schema generator for declarative schemas")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dump the JSON Schema of one schema.
    Dump(dump::DumpArgs),
    /// Dump the react-jsonschema-form uiSchema of one schema.
    Uischema(uischema::UiSchemaArgs),
    /// List the schemas a document defines.
    List {
        /// Schema definition document (YAML or JSON).
        input: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Dump(args) => dump::execute(args)?,
        Commands::Uischema(args) => uischema::execute(args)?,
        Commands::List { input } => {
            let registry = load_registry_path(input)?;
            for name in registry.names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_dump_flags() {
        let cli = Cli::try_parse_from([
            "schemagen",
            "dump",
            "schemas.yaml",
            "--schema",
            "User",
            "--ordered",
            "--format",
            "yaml",
        ])
        .unwrap();
        match cli.command {
            Commands::Dump(args) => {
                assert_eq!(args.schema, "User");
                assert!(args.ordered);
                assert!(!args.lenient_validators);
                assert_eq!(args.format, dump::OutputFormat::Yaml);
            }
            other => panic!("expected dump, got {:?}", other),
        }
    }
}
