//! # sszvet CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sszvet_cli::config::CliConfig;
use sszvet_cli::inspect::{run_inspect, InspectArgs};
use sszvet_cli::vet::{run_vet, VetArgs};

/// Validator for SSZ schema documents.
///
/// Checks that every definition obeys its type's attribute rules, that
/// every reference resolves, and that no type refers back to itself.
#[derive(Parser, Debug)]
#[command(name = "sszvet", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate schema documents and print a verdict per file.
    Vet(VetArgs),

    /// Print every definition of a valid schema with its size class.
    Inspect(InspectArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "sszvet starting");

    let result = CliConfig::resolve(cli.config.as_deref()).and_then(|config| match &cli.command {
        Commands::Vet(args) => run_vet(args, &config),
        Commands::Inspect(args) => run_inspect(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}
