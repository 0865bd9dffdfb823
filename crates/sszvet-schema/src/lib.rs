//! # sszvet-schema — Validation Engine for SSZ Schema Documents
//!
//! Decides whether a decoded [`Schema`](sszvet_core::Schema) is well formed:
//! every definition obeys its variant's attribute rules, every reference
//! resolves, and the reference graph is acyclic.
//!
//! ## Pipeline
//!
//! - [`decode`] turns JSON or YAML text into the canonical model.
//! - [`shape`] is an optional pre-filter over the raw document, backed by an
//!   embedded JSON Schema.
//! - [`validate`] orchestrates the engine: [`graph`] for reference existence
//!   and cycles, [`structural`] for per-definition rules.
//! - [`variability`] classifies definitions as fixed or variable size.
//!
//! ## Crate Policy
//!
//! - Depends only on `sszvet-core` internally.
//! - The engine performs no I/O. Only [`decode::read_value`] and
//!   [`decode::load_path`] touch the filesystem.
//! - Every traversal is bounded by [`ValidationLimits`](sszvet_core::ValidationLimits),
//!   so adversarial input cannot recurse without limit.

mod budget;
pub mod decode;
pub mod graph;
pub mod shape;
pub mod structural;
pub mod validate;
pub mod variability;

pub use decode::{from_json_slice, from_json_str, from_value, from_yaml_str, load_path, Format, LoadError};
pub use graph::{ReferenceGraph, RefSite};
pub use shape::{ShapeChecker, ShapeViolation, ShapeViolations};
pub use structural::{attribute_rules, AttributeRules, Presence, StructuralValidator};
pub use validate::{validate, DefinitionFailure, SchemaValidator, ValidationReport};
pub use variability::{is_variable, SizeResolver};
