//! # sszvet-cli — CLI Tool for SSZ Schema Documents
//!
//! Provides the `sszvet` command-line interface over the `sszvet-schema`
//! validation engine.
//!
//! ## Subcommands
//!
//! - `sszvet vet`: Validate one or more documents, one verdict per file.
//! - `sszvet inspect`: List a valid document's definitions with their
//!   size classes.
//!
//! ```bash
//! sszvet vet beacon.json altair.yaml
//! cat beacon.json | sszvet vet -
//! sszvet --config sszvet.yaml inspect beacon.json --json
//! ```
//!
//! Verdicts go to stdout. Logs go to stderr, filtered by `-v` count.

pub mod config;
pub mod inspect;
pub mod vet;
