//! # Inspect Subcommand
//!
//! Validates one schema document, then lists every top-level definition
//! with its wire tag and whether its encoded size is fixed or variable.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use sszvet_schema::{decode, SchemaValidator, ShapeChecker};

use crate::config::CliConfig;

/// Arguments for the `sszvet inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Schema document to inspect (.json, .yaml, .yml).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Emit a JSON array instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// One row of the inspect output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    pub size_class: String,
    pub children: usize,
}

/// Execute the inspect subcommand, writing to stdout.
pub fn run_inspect(args: &InspectArgs, config: &CliConfig) -> Result<u8> {
    let stdout = std::io::stdout();
    inspect(args, config, &mut stdout.lock())
}

/// Execute the inspect subcommand with an explicit output stream.
///
/// Returns 1 without a listing when the document is invalid.
pub fn inspect(args: &InspectArgs, config: &CliConfig, out: &mut dyn Write) -> Result<u8> {
    let label = args.file.display().to_string();
    let value = decode::read_value(&args.file)
        .with_context(|| format!("failed to load {label}"))?;

    let decoded = if config.shape_check {
        let shape = ShapeChecker::new().context("failed to compile shape schema")?;
        shape.decode(&value)
    } else {
        decode::from_value(&value)
    };
    let schema = match decoded {
        Ok(schema) => schema,
        Err(e) => {
            writeln!(out, "✗ {label}: {e}")?;
            return Ok(1);
        }
    };

    let validator = SchemaValidator::with_limits(config.limits);
    let classes = match validator.size_classes(&schema) {
        Ok(classes) => classes,
        Err(e) => {
            tracing::warn!(file = %label, error = %e, "schema rejected");
            writeln!(out, "✗ {label}: {e}")?;
            return Ok(1);
        }
    };

    let summaries: Vec<DefinitionSummary> = schema
        .definitions
        .iter()
        .flatten()
        .map(|(name, def)| DefinitionSummary {
            name: name.clone(),
            type_tag: def.variant.to_string(),
            size_class: classes
                .get(name)
                .map(|c| c.to_string())
                .unwrap_or_default(),
            children: def.children.len(),
        })
        .collect();

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&summaries).context("failed to render JSON output")?;
        writeln!(out, "{rendered}")?;
        return Ok(0);
    }

    writeln!(
        out,
        "{label}: version {}, {} definition(s)",
        if schema.version.is_empty() { "-" } else { schema.version.as_str() },
        summaries.len()
    )?;
    let width = summaries.iter().map(|s| s.name.len()).max().unwrap_or(0);
    for s in &summaries {
        writeln!(
            out,
            "  {:<width$}  {:<21}  {}",
            s.name, s.type_tag, s.size_class
        )?;
    }
    Ok(0)
}
