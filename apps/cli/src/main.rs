//! `tessera` - validate, convert and inspect schema-driven records
//!
//! Usage:
//!   tessera validate appointment.xml --outcome
//!   tessera convert appointment.xml --to json
//!   tessera --schemas ./definitions schemas Appointment

mod commands;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::Format;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "tessera", version, about)]
struct Cli {
    /// Extra schema definition file or directory (repeatable)
    #[arg(long = "schemas", global = true, value_name = "PATH")]
    schemas: Vec<PathBuf>,

    /// Do not register the built-in definitions
    #[arg(long, global = true)]
    no_builtin: bool,

    /// Validator configuration (YAML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input format; detected from the extension or content when omitted
    #[arg(long, global = true, value_enum)]
    format: Option<Format>,

    /// Log level for tessera crates (RUST_LOG takes precedence)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate records against their schemas; exits 1 when any has errors
    Validate {
        /// Record documents (`-` reads stdin)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print an OperationOutcome per record instead of issue lines
        #[arg(long)]
        outcome: bool,
    },
    /// Re-encode a record in another wire format
    Convert {
        file: PathBuf,

        #[arg(long, value_enum)]
        to: Format,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List registered record types, or describe one
    Schemas {
        #[arg(value_name = "TYPE")]
        type_name: Option<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    logging::init_logging(&logging::LoggingConfig {
        level: cli.log_level.clone(),
        json: cli.log_json,
    });

    let registry = commands::load_registry(!cli.no_builtin, &cli.schemas)?;
    tracing::debug!(types = registry.len(), "Schema registry ready");

    match cli.command {
        Commands::Validate { files, outcome } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::validate(&files, cli.format, outcome, Arc::new(registry), &config)
        }
        Commands::Convert { file, to, output } => {
            commands::convert(&file, cli.format, to, output.as_deref(), &registry)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Schemas { type_name } => {
            commands::schemas(type_name.as_deref(), &registry)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
