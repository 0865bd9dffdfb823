//! # Shape Pre-Filter
//!
//! A cheap first pass over the raw document, before it is decoded into the
//! model. The embedded JSON Schema (Draft 2020-12) checks attribute JSON
//! types, the closed set of type tags, unknown keys and non-negative
//! counts, and reports every violation at once.
//!
//! Passing this filter proves nothing about the semantic rules. The
//! validation engine re-derives every invariant and never assumes the
//! filter ran.
//!
//! A bad `type` tag inside a child only surfaces here as a failed `oneOf`
//! on the child. [`ShapeChecker::decode`] reports such documents with the
//! decoder's `UnknownTypeVariant` error instead, which names the owning
//! definition, the field trail and the legal tags.

use std::fmt;

use jsonschema::Validator;
use serde_json::Value;

use sszvet_core::{Schema, SchemaError};

use crate::decode::{self, LoadError};

/// The embedded shape schema.
pub const SHAPE_SCHEMA: &str = include_str!("../schemas/ssz-schema.schema.json");

/// A single shape violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViolation {
    /// JSON Pointer to the violating value in the document.
    pub instance_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for ShapeViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Every shape violation found in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeViolations {
    violations: Vec<ShapeViolation>,
}

impl ShapeViolations {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[ShapeViolation] {
        &self.violations
    }

    pub fn into_inner(self) -> Vec<ShapeViolation> {
        self.violations
    }
}

impl fmt::Display for ShapeViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// Compiled shape schema. Build once, check many documents.
///
/// `ShapeChecker` is `Send + Sync`.
pub struct ShapeChecker {
    validator: Validator,
}

impl fmt::Debug for ShapeChecker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeChecker").finish_non_exhaustive()
    }
}

impl ShapeChecker {
    /// Compile the embedded shape schema.
    ///
    /// # Errors
    ///
    /// `LoadError::ShapeSchema` if the embedded schema does not parse or
    /// compile.
    pub fn new() -> Result<Self, LoadError> {
        let schema: Value =
            serde_json::from_str(SHAPE_SCHEMA).map_err(|e| LoadError::ShapeSchema {
                reason: format!("invalid JSON: {e}"),
            })?;

        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        let validator = opts.build(&schema).map_err(|e| LoadError::ShapeSchema {
            reason: e.to_string(),
        })?;

        Ok(Self { validator })
    }

    /// Check a raw document.
    ///
    /// # Errors
    ///
    /// Every violation found, in the order the validator reports them.
    pub fn check(&self, instance: &Value) -> Result<(), ShapeViolations> {
        let violations: Vec<ShapeViolation> = self
            .validator
            .iter_errors(instance)
            .map(|e| ShapeViolation {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ShapeViolations { violations })
        }
    }

    /// Shape-check `instance`, then decode it.
    ///
    /// # Errors
    ///
    /// - `LoadError::Schema(UnknownTypeVariant)` when the document fails
    ///   the shape check and names a type tag outside the closed set.
    /// - `LoadError::Shape` for every other shape failure.
    /// - Any decode error for a document that passes the shape check.
    pub fn decode(&self, instance: &Value) -> Result<Schema, LoadError> {
        if let Err(violations) = self.check(instance) {
            return Err(match decode::from_value(instance) {
                Err(LoadError::Schema(e)) if names_unknown_tag(&e) => LoadError::Schema(e),
                _ => LoadError::Shape(violations),
            });
        }
        decode::from_value(instance)
    }
}

/// An `UnknownTypeVariant` carrying an actual tag. A missing `type` key is
/// left to the shape violation, which says the key is required.
fn names_unknown_tag(error: &SchemaError) -> bool {
    matches!(error, SchemaError::UnknownTypeVariant { found, .. } if !found.is_empty())
}
