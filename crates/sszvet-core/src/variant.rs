//! # Type Variants — The Closed SSZ Type Set
//!
//! Defines the `TypeVariant` enum with all 15 wire tags of the schema
//! format. This is the one definition used by the decoder, the resolver
//! and the structural validator. Every `match` on `TypeVariant` is
//! exhaustive, so adding a variant forces every consumer to decide how
//! it is classified and which attributes it may carry.
//!
//! ## Size Classes
//!
//! | Class | Variants |
//! |-------|----------|
//! | always fixed | `uint8`..`uint256`, `boolean`, `bitvector` |
//! | always variable | `list`, `bitlist`, `union` |
//! | conditionally variable | `container`, `progressive_container`, `vector`, `ref` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

/// Every type variant a definition may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeVariant {
    /// Unsigned 8-bit integer.
    UInt8,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Unsigned 64-bit integer.
    UInt64,
    /// Unsigned 128-bit integer.
    UInt128,
    /// Unsigned 256-bit integer.
    UInt256,
    /// Single-byte boolean.
    Boolean,
    /// Ordered, named, heterogeneous fields.
    Container,
    /// Container whose fields are selected by a sparse active-field bitset.
    ProgressiveContainer,
    /// Fixed-length homogeneous sequence.
    Vector,
    /// Bounded variable-length homogeneous sequence.
    List,
    /// Fixed-length sequence of bits.
    BitVector,
    /// Bounded variable-length sequence of bits.
    BitList,
    /// Tagged union over its children.
    Union,
    /// Named pointer to another top-level definition.
    Ref,
}

/// Number of type variants. Used by tests that walk the full set.
pub const TYPE_VARIANT_COUNT: usize = 15;

/// Serialized-size class of a variant, independent of any children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    /// Encoded length is determined by the type alone.
    AlwaysFixed,
    /// Encoded length always depends on the value.
    AlwaysVariable,
    /// Depends on children or on the referenced definition.
    Conditional,
}

impl SizeClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlwaysFixed => "fixed",
            Self::AlwaysVariable => "variable",
            Self::Conditional => "conditional",
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved encoded-size behaviour of a concrete definition, after its
/// children and references have been followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncodedSize {
    Fixed,
    Variable,
}

impl EncodedSize {
    pub fn from_variable(variable: bool) -> Self {
        if variable {
            Self::Variable
        } else {
            Self::Fixed
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Variable => "variable",
        }
    }
}

impl fmt::Display for EncodedSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TypeVariant {
    /// Returns all variants in wire-tag order.
    pub fn all() -> &'static [TypeVariant] {
        &[
            Self::UInt8,
            Self::UInt16,
            Self::UInt32,
            Self::UInt64,
            Self::UInt128,
            Self::UInt256,
            Self::Boolean,
            Self::Container,
            Self::ProgressiveContainer,
            Self::Vector,
            Self::List,
            Self::BitVector,
            Self::BitList,
            Self::Union,
            Self::Ref,
        ]
    }

    /// Returns the wire tag for this variant.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::UInt128 => "uint128",
            Self::UInt256 => "uint256",
            Self::Boolean => "boolean",
            Self::Container => "container",
            Self::ProgressiveContainer => "progressive_container",
            Self::Vector => "vector",
            Self::List => "list",
            Self::BitVector => "bitvector",
            Self::BitList => "bitlist",
            Self::Union => "union",
            Self::Ref => "ref",
        }
    }

    /// Comma-separated list of every legal wire tag, for diagnostics.
    pub fn legal_tags() -> String {
        Self::all()
            .iter()
            .map(TypeVariant::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns the static size class of this variant.
    pub fn size_class(&self) -> SizeClass {
        match self {
            Self::UInt8
            | Self::UInt16
            | Self::UInt32
            | Self::UInt64
            | Self::UInt128
            | Self::UInt256
            | Self::Boolean
            | Self::BitVector => SizeClass::AlwaysFixed,
            Self::List | Self::BitList | Self::Union => SizeClass::AlwaysVariable,
            Self::Container | Self::ProgressiveContainer | Self::Vector | Self::Ref => {
                SizeClass::Conditional
            }
        }
    }

    /// True for numeric types, boolean and bit-vector.
    pub fn is_always_fixed(&self) -> bool {
        self.size_class() == SizeClass::AlwaysFixed
    }

    /// True for list, bit-list and union.
    pub fn is_always_variable(&self) -> bool {
        self.size_class() == SizeClass::AlwaysVariable
    }

    /// True for container, progressive container, vector and ref.
    pub fn is_conditionally_variable(&self) -> bool {
        self.size_class() == SizeClass::Conditional
    }

    /// True for the unsigned integer types and boolean.
    pub fn is_basic(&self) -> bool {
        matches!(
            self,
            Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
                | Self::UInt128
                | Self::UInt256
                | Self::Boolean
        )
    }
}

impl fmt::Display for TypeVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeVariant {
    type Err = SchemaError;

    /// Parse a variant from its wire tag. Tags are case-sensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uint8" => Ok(Self::UInt8),
            "uint16" => Ok(Self::UInt16),
            "uint32" => Ok(Self::UInt32),
            "uint64" => Ok(Self::UInt64),
            "uint128" => Ok(Self::UInt128),
            "uint256" => Ok(Self::UInt256),
            "boolean" => Ok(Self::Boolean),
            "container" => Ok(Self::Container),
            "progressive_container" => Ok(Self::ProgressiveContainer),
            "vector" => Ok(Self::Vector),
            "list" => Ok(Self::List),
            "bitvector" => Ok(Self::BitVector),
            "bitlist" => Ok(Self::BitList),
            "union" => Ok(Self::Union),
            "ref" => Ok(Self::Ref),
            other => Err(SchemaError::UnknownTypeVariant {
                definition: String::new(),
                path: Default::default(),
                found: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for TypeVariant {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeVariant> for String {
    fn from(variant: TypeVariant) -> Self {
        variant.as_str().to_string()
    }
}
