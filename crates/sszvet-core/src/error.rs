//! # Error Types — Schema Verdicts
//!
//! Every way a schema can be rejected by the validation engine. All errors
//! use `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Each variant carries the referring type name and the nested field
//!   path, so a caller can render a located diagnostic without re-walking
//!   the schema.
//! - [`SchemaError::kind`] maps every variant onto the closed
//!   [`ErrorKind`] taxonomy.
//! - Nothing here is fatal. Every error is a reportable verdict.

use std::fmt;

use thiserror::Error;

use crate::model::FieldPath;
use crate::variant::TypeVariant;

/// A schema verdict other than success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Missing or ill-typed top-level map, or a name/key mismatch.
    #[error("malformed schema: {reason}")]
    MalformedSchema {
        /// What is wrong with the document as a whole.
        reason: String,
    },

    /// A `type` tag outside the closed variant set.
    #[error(
        "{}unknown type '{found}' - must be one of: {legal}",
        location(.definition, .path),
        legal = TypeVariant::legal_tags()
    )]
    UnknownTypeVariant {
        /// Top-level definition containing the tag (empty when unknown).
        definition: String,
        /// Field trail inside that definition.
        path: FieldPath,
        /// The offending tag.
        found: String,
    },

    /// A required attribute is missing/zero/empty, or a forbidden one is set.
    #[error(
        "{}attribute '{attribute}' {rule} for type '{variant}'",
        location(.definition, .path)
    )]
    AttributeViolation {
        /// Top-level definition containing the offending node.
        definition: String,
        /// Field trail inside that definition.
        path: FieldPath,
        /// Variant of the offending node.
        variant: TypeVariant,
        /// The attribute that broke its rule.
        attribute: Attribute,
        /// The rule that was broken.
        rule: AttributeRule,
    },

    /// Progressive-container active-field bitset is inconsistent.
    #[error("{}active_fields {rule}", location(.definition, .path))]
    BitsetViolation {
        /// Top-level definition containing the container.
        definition: String,
        /// Field trail to the container.
        path: FieldPath,
        /// Which bitset rule failed.
        rule: BitsetRule,
    },

    /// A `ref` target is not a top-level definition.
    #[error(
        "type '{from}' has invalid reference to '{to}' (at {}) - referenced type is not defined in schema defs",
        reference_site(.path)
    )]
    UnknownReference {
        /// Top-level definition holding the reference.
        from: String,
        /// The missing target name.
        to: String,
        /// Field trail to the `ref` node.
        path: FieldPath,
    },

    /// A reference cycle, rendered from the repeated node back to itself.
    #[error("recursive type reference: {}", .cycle.join(" -> "))]
    RecursiveType {
        /// Names along the cycle; first and last entries are equal.
        cycle: Vec<String>,
    },

    /// The defensive iteration ceiling was hit.
    #[error(
        "max iterations ({limit}) reached during {stage} of type '{definition}' - possible circular reference"
    )]
    RecursionLimitExceeded {
        /// Which traversal hit the ceiling.
        stage: Stage,
        /// Type being traversed when the ceiling was hit.
        definition: String,
        /// The ceiling in effect.
        limit: usize,
    },
}

impl SchemaError {
    /// Returns the taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedSchema { .. } => ErrorKind::MalformedSchema,
            Self::UnknownTypeVariant { .. } => ErrorKind::UnknownTypeVariant,
            Self::AttributeViolation { .. } => ErrorKind::AttributeViolation,
            Self::BitsetViolation { .. } => ErrorKind::BitsetViolation,
            Self::UnknownReference { .. } => ErrorKind::UnknownReference,
            Self::RecursiveType { .. } => ErrorKind::RecursiveType,
            Self::RecursionLimitExceeded { .. } => ErrorKind::RecursionLimitExceeded,
        }
    }

    /// Attach the owning definition and field path to an error raised
    /// before the location was known (e.g. by `TypeVariant::from_str`).
    pub fn located(self, owner: &str, at: &FieldPath) -> Self {
        match self {
            Self::UnknownTypeVariant { found, .. } => Self::UnknownTypeVariant {
                definition: owner.to_string(),
                path: at.clone(),
                found,
            },
            other => other,
        }
    }
}

/// Closed set of error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedSchema,
    UnknownTypeVariant,
    AttributeViolation,
    BitsetViolation,
    UnknownReference,
    RecursiveType,
    RecursionLimitExceeded,
}

impl ErrorKind {
    /// Stable identifier for reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedSchema => "malformed_schema",
            Self::UnknownTypeVariant => "unknown_type_variant",
            Self::AttributeViolation => "attribute_violation",
            Self::BitsetViolation => "bitset_violation",
            Self::UnknownReference => "unknown_reference",
            Self::RecursiveType => "recursive_type",
            Self::RecursionLimitExceeded => "recursion_limit_exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional attributes of a definition, plus the child `name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Size,
    Limit,
    Ref,
    Children,
    ActiveFields,
    Name,
}

impl Attribute {
    /// The attribute's key in the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Size => "size",
            Self::Limit => "limit",
            Self::Ref => "ref",
            Self::Children => "children",
            Self::ActiveFields => "active_fields",
            Self::Name => "name",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rule an attribute was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeRule {
    /// Must be present, non-zero and non-empty.
    Required,
    /// Must be absent, zero or empty.
    Forbidden,
    /// Must not repeat among siblings.
    Unique,
}

impl fmt::Display for AttributeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("must be present and non-zero/non-empty"),
            Self::Forbidden => f.write_str("must not be specified"),
            Self::Unique => f.write_str("must be unique among siblings"),
        }
    }
}

/// Progressive-container bitset failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitsetRule {
    #[error("has length {len} but max is {max}")]
    TooLong { len: usize, max: usize },

    #[error("has invalid entry [{index}]={value} (must be 0 or 1)")]
    NonBinary { index: usize, value: i64 },

    #[error("ends in 0 (illegal)")]
    TrailingZero,

    #[error("has {active} active fields (1s) but {children} children")]
    PopulationMismatch { active: usize, children: usize },
}

/// Traversals that share the iteration ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    SizeClassification,
    StructuralValidation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SizeClassification => f.write_str("size classification"),
            Self::StructuralValidation => f.write_str("structural validation"),
        }
    }
}

fn location(definition: &str, path: &FieldPath) -> String {
    match (definition.is_empty(), path.is_root()) {
        (true, true) => String::new(),
        (true, false) => format!("{path}: "),
        (false, true) => format!("type '{definition}': "),
        (false, false) => format!("type '{definition}' at {path}: "),
    }
}

fn reference_site(path: &FieldPath) -> String {
    if path.is_root() {
        "type reference".to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_violation_names_variant_and_attribute() {
        let err = SchemaError::AttributeViolation {
            definition: "Header".into(),
            path: FieldPath::root().child("slot"),
            variant: TypeVariant::Container,
            attribute: Attribute::Size,
            rule: AttributeRule::Forbidden,
        };
        let msg = err.to_string();
        assert_eq!(
            msg,
            "type 'Header' at field 'slot': attribute 'size' must not be specified for type 'container'"
        );
        assert_eq!(err.kind(), ErrorKind::AttributeViolation);
    }

    #[test]
    fn unknown_reference_names_both_types_and_site() {
        let err = SchemaError::UnknownReference {
            from: "TypeA".into(),
            to: "NonExistent".into(),
            path: FieldPath::root().child("my_field"),
        };
        let msg = err.to_string();
        assert!(msg.contains("TypeA"));
        assert!(msg.contains("NonExistent"));
        assert!(msg.contains("field 'my_field'"));
    }

    #[test]
    fn root_reference_site_reads_type_reference() {
        let err = SchemaError::UnknownReference {
            from: "Alias".into(),
            to: "Missing".into(),
            path: FieldPath::root(),
        };
        assert!(err.to_string().contains("(at type reference)"));
    }

    #[test]
    fn recursive_type_joins_cycle_with_arrows() {
        let err = SchemaError::RecursiveType {
            cycle: vec!["A".into(), "B".into(), "C".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "recursive type reference: A -> B -> C -> A");
    }

    #[test]
    fn located_fills_unknown_variant_context() {
        let err = "vec".parse::<TypeVariant>().unwrap_err();
        let err = err.located("Block", &FieldPath::root().child("body"));
        assert!(err.to_string().starts_with("type 'Block' at field 'body': unknown type 'vec'"));
    }

    #[test]
    fn bitset_rule_display() {
        let err = SchemaError::BitsetViolation {
            definition: "P".into(),
            path: FieldPath::root(),
            rule: BitsetRule::PopulationMismatch { active: 3, children: 2 },
        };
        assert_eq!(
            err.to_string(),
            "type 'P': active_fields has 3 active fields (1s) but 2 children"
        );
        assert_eq!(err.kind(), ErrorKind::BitsetViolation);
    }
}
