//! # Vet Subcommand
//!
//! Validates one or more schema documents and prints a verdict per file,
//! followed by a summary line:
//!
//! ```text
//! ✓ beacon.json: valid
//! ✗ broken.yaml: recursive type reference: Node -> Node
//! 1 of 2 file(s) failed validation
//! ```
//!
//! Exit code 0 when every file is valid, 1 otherwise. A file that cannot be
//! read or parsed counts as a failed file, not an operational error.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use sszvet_schema::decode::{self, Format};
use sszvet_schema::{SchemaValidator, ShapeChecker};

use crate::config::CliConfig;

/// Path that selects standard input.
pub const STDIN_PATH: &str = "-";

/// Arguments for the `sszvet vet` subcommand.
#[derive(Args, Debug)]
pub struct VetArgs {
    /// Schema documents to validate (.json, .yaml, .yml). `-` reads JSON
    /// from standard input.
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<PathBuf>,

    /// Skip the shape pre-filter.
    #[arg(long)]
    pub no_shape: bool,

    /// Report every failing definition instead of stopping at the first.
    #[arg(long)]
    pub all_errors: bool,
}

/// Execute the vet subcommand against the process's stdin and stdout.
pub fn run_vet(args: &VetArgs, config: &CliConfig) -> Result<u8> {
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    vet(args, config, &mut stdin.lock(), &mut stdout.lock())
}

/// Execute the vet subcommand with explicit streams.
///
/// Returns 0 when every file is valid, 1 otherwise.
///
/// # Errors
///
/// Only operational failures: the shape schema does not compile, or
/// writing to `out` fails.
pub fn vet(
    args: &VetArgs,
    config: &CliConfig,
    stdin: &mut dyn Read,
    out: &mut dyn Write,
) -> Result<u8> {
    let shape = if config.shape_check && !args.no_shape {
        Some(ShapeChecker::new().context("failed to compile shape schema")?)
    } else {
        None
    };
    let checker = FileChecker {
        shape: shape.as_ref(),
        validator: SchemaValidator::with_limits(config.limits),
        all_errors: args.all_errors,
    };

    let total = args.files.len();
    let mut failed = 0usize;

    for file in &args.files {
        let label = file.display().to_string();
        let problems = checker.check(file, stdin);
        if problems.is_empty() {
            writeln!(out, "✓ {label}: valid")?;
            continue;
        }

        failed += 1;
        tracing::warn!(file = %label, problems = problems.len(), "validation failed");
        for problem in &problems {
            writeln!(out, "✗ {label}: {problem}")?;
        }
    }

    if failed == 0 {
        writeln!(out, "All {total} file(s) valid")?;
        Ok(0)
    } else {
        writeln!(out, "{failed} of {total} file(s) failed validation")?;
        Ok(1)
    }
}

struct FileChecker<'a> {
    shape: Option<&'a ShapeChecker>,
    validator: SchemaValidator,
    all_errors: bool,
}

impl FileChecker<'_> {
    /// Every problem found in `file`; empty when it is valid.
    fn check(&self, file: &Path, stdin: &mut dyn Read) -> Vec<String> {
        let value = match read_document(file, stdin) {
            Ok(value) => value,
            Err(e) => return vec![e.to_string()],
        };

        let decoded = match self.shape {
            Some(shape) => shape.decode(&value),
            None => decode::from_value(&value),
        };
        let schema = match decoded {
            Ok(schema) => schema,
            Err(e) => return vec![e.to_string()],
        };

        if self.all_errors {
            self.validator
                .validate_each(&schema)
                .failures
                .into_iter()
                .map(|f| f.error.to_string())
                .collect()
        } else {
            match self.validator.validate(&schema) {
                Ok(()) => Vec::new(),
                Err(e) => vec![e.to_string()],
            }
        }
    }
}

/// Read `file` (or stdin for `-`) into a JSON value tree.
fn read_document(file: &Path, stdin: &mut dyn Read) -> Result<Value> {
    if file.as_os_str() == STDIN_PATH {
        let mut text = String::new();
        stdin
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        return Ok(decode::parse_value(&text, Format::Json)?);
    }
    Ok(decode::read_value(file)?)
}
