//! # sszvet-core — Type Model for SSZ Schema Documents
//!
//! This crate defines the data model checked by the `sszvet` validation
//! engine: the closed set of SSZ type variants, the definition and field
//! records, and the error taxonomy every check reports through. It
//! contains no traversal logic beyond classification predicates.
//!
//! ## Key Design Principles
//!
//! 1. **Single `TypeVariant` enum.** One definition, 15 variants,
//!    exhaustive `match` everywhere. Adding a variant forces the resolver
//!    and the structural validator to classify it at compile time.
//!
//! 2. **One canonical model.** Legacy and current wire layouts decode into
//!    the same `Schema` / `Definition` / `Field` structures.
//!
//! 3. **Located errors.** Every `SchemaError` names the referring type and
//!    the field trail inside it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `sszvet-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod limits;
pub mod model;
pub mod variant;

// Re-export primary types for ergonomic imports.
pub use error::{Attribute, AttributeRule, BitsetRule, ErrorKind, SchemaError, Stage};
pub use limits::{ValidationLimits, MAX_ACTIVE_FIELDS, MAX_CONFIGURED_LIMIT};
pub use model::{Catalog, Definition, Field, FieldPath, Metadata, PathSegment, Schema};
pub use variant::{EncodedSize, SizeClass, TypeVariant, TYPE_VARIANT_COUNT};
