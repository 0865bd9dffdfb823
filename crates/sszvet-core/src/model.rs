//! # Schema Model
//!
//! The canonical in-memory form of a schema document. Both the current
//! wire layout (`defs` map, children as `{name, def}`) and the legacy
//! layout (`types` map, inline children carrying `name` and `type`)
//! decode into these structures, so the validation engine has a single
//! model to check.
//!
//! The model is immutable once built. Validation only reads it.
//!
//! Absent and zero/empty attributes are equivalent: a `size` of `Some(0)`
//! is treated exactly like `None`, matching the omit-empty encoding of the
//! wire format.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::variant::TypeVariant;

/// Top-level definitions keyed by type name.
///
/// Ordered by name so every traversal over the catalog is deterministic.
pub type Catalog = BTreeMap<String, Definition>;

/// A type definition: one node of a schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// The variant tag.
    pub variant: TypeVariant,
    /// Name stored inside the value by the legacy layout, if any.
    pub declared_name: Option<String>,
    /// Element count for `vector` / `bitvector`.
    pub size: Option<u64>,
    /// Maximum element count for `list` / `bitlist`.
    pub limit: Option<u64>,
    /// Target type name for `ref`.
    pub ref_target: Option<String>,
    /// Ordered member fields.
    pub children: Vec<Field>,
    /// Active-field bitset for `progressive_container`.
    pub active_fields: Option<Vec<i64>>,
}

impl Definition {
    /// A definition of the given variant with no attributes set.
    pub fn new(variant: TypeVariant) -> Self {
        Self {
            variant,
            declared_name: None,
            size: None,
            limit: None,
            ref_target: None,
            children: Vec::new(),
            active_fields: None,
        }
    }

    pub fn uint8() -> Self {
        Self::new(TypeVariant::UInt8)
    }

    pub fn uint16() -> Self {
        Self::new(TypeVariant::UInt16)
    }

    pub fn uint32() -> Self {
        Self::new(TypeVariant::UInt32)
    }

    pub fn uint64() -> Self {
        Self::new(TypeVariant::UInt64)
    }

    pub fn uint128() -> Self {
        Self::new(TypeVariant::UInt128)
    }

    pub fn uint256() -> Self {
        Self::new(TypeVariant::UInt256)
    }

    pub fn boolean() -> Self {
        Self::new(TypeVariant::Boolean)
    }

    /// A container over the given fields.
    pub fn container(children: Vec<Field>) -> Self {
        Self {
            children,
            ..Self::new(TypeVariant::Container)
        }
    }

    /// A progressive container with its active-field bitset.
    pub fn progressive_container(children: Vec<Field>, active_fields: Vec<i64>) -> Self {
        Self {
            children,
            active_fields: Some(active_fields),
            ..Self::new(TypeVariant::ProgressiveContainer)
        }
    }

    /// A vector of `size` elements described by `children`.
    pub fn vector(size: u64, children: Vec<Field>) -> Self {
        Self {
            size: Some(size),
            children,
            ..Self::new(TypeVariant::Vector)
        }
    }

    /// A list of at most `limit` elements described by `children`.
    pub fn list(limit: u64, children: Vec<Field>) -> Self {
        Self {
            limit: Some(limit),
            children,
            ..Self::new(TypeVariant::List)
        }
    }

    pub fn bitvector(size: u64) -> Self {
        Self {
            size: Some(size),
            ..Self::new(TypeVariant::BitVector)
        }
    }

    pub fn bitlist(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::new(TypeVariant::BitList)
        }
    }

    /// A union whose options are `children`.
    pub fn union(children: Vec<Field>) -> Self {
        Self {
            children,
            ..Self::new(TypeVariant::Union)
        }
    }

    /// A reference to the top-level definition `target`.
    pub fn reference(target: impl Into<String>) -> Self {
        Self {
            ref_target: Some(target.into()),
            ..Self::new(TypeVariant::Ref)
        }
    }

    /// `size`, with zero read as absent.
    pub fn effective_size(&self) -> Option<u64> {
        self.size.filter(|s| *s != 0)
    }

    /// `limit`, with zero read as absent.
    pub fn effective_limit(&self) -> Option<u64> {
        self.limit.filter(|l| *l != 0)
    }

    /// `ref_target`, with the empty string read as absent.
    pub fn effective_ref(&self) -> Option<&str> {
        self.ref_target.as_deref().filter(|r| !r.is_empty())
    }

    /// `active_fields`, with an empty bitset read as absent.
    pub fn effective_active_fields(&self) -> Option<&[i64]> {
        self.active_fields.as_deref().filter(|a| !a.is_empty())
    }

    /// Number of nodes in this tree, counting `self` and every nested
    /// child. `ref` nodes count once and are not followed.
    pub fn node_count(&self) -> usize {
        let mut count = 0usize;
        let mut stack = vec![self];
        while let Some(def) = stack.pop() {
            count += 1;
            stack.extend(def.children.iter().map(|c| &c.definition));
        }
        count
    }
}

/// A named member of a definition's `children`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Member name; non-empty and unique among siblings in a valid schema.
    pub name: String,
    /// The member's type.
    pub definition: Definition,
}

impl Field {
    pub fn new(name: impl Into<String>, definition: Definition) -> Self {
        Self {
            name: name.into(),
            definition,
        }
    }
}

/// Optional descriptive metadata carried by a schema document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
}

/// A complete schema document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Schema format version string.
    pub version: String,
    /// Top-level definitions. `None` when the document had no definitions
    /// map at all, which is distinct from an empty one.
    pub definitions: Option<Catalog>,
    /// Optional descriptive metadata.
    pub metadata: Option<Metadata>,
}

impl Schema {
    /// A schema over the given definitions.
    pub fn new(version: impl Into<String>, definitions: Catalog) -> Self {
        Self {
            version: version.into(),
            definitions: Some(definitions),
            metadata: None,
        }
    }

    /// Build a schema from `(name, definition)` pairs.
    pub fn from_definitions<I, S>(version: impl Into<String>, definitions: I) -> Self
    where
        I: IntoIterator<Item = (S, Definition)>,
        S: Into<String>,
    {
        Self::new(
            version,
            definitions.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        )
    }

    /// Number of top-level definitions (zero when the map is absent).
    pub fn definition_count(&self) -> usize {
        self.definitions.as_ref().map_or(0, BTreeMap::len)
    }
}

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// A named child.
    Field(String),
    /// A child with an empty name, addressed by position.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "field '{name}'"),
            Self::Index(i) => write!(f, "child[{i}]"),
        }
    }
}

/// Trail of children from a top-level definition to a nested node,
/// rendered as `field 'x' -> field 'y'`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// The path of a top-level definition itself.
    pub fn root() -> Self {
        Self::default()
    }

    /// True when this path addresses the top-level definition.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Extend the path by the named child.
    pub fn child(&self, name: &str) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Field(name.to_string()));
        next
    }

    /// Extend the path by the child at `index`, falling back to its
    /// position when the name is empty.
    pub fn child_at(&self, index: usize, name: &str) -> Self {
        if name.is_empty() {
            let mut next = self.clone();
            next.segments.push(PathSegment::Index(index));
            next
        } else {
            self.child(name)
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_and_empty_read_as_absent() {
        let mut def = Definition::uint64();
        def.size = Some(0);
        def.limit = Some(0);
        def.ref_target = Some(String::new());
        def.active_fields = Some(Vec::new());
        assert_eq!(def.effective_size(), None);
        assert_eq!(def.effective_limit(), None);
        assert_eq!(def.effective_ref(), None);
        assert_eq!(def.effective_active_fields(), None);
    }

    #[test]
    fn node_count_includes_nested_children() {
        assert_eq!(Definition::uint8().node_count(), 1);
        let def = Definition::container(vec![
            Field::new("a", Definition::uint8()),
            Field::new(
                "b",
                Definition::vector(2, vec![Field::new("e", Definition::uint16())]),
            ),
            Field::new("c", Definition::reference("Elsewhere")),
        ]);
        assert_eq!(def.node_count(), 5);
    }

    #[test]
    fn constructors_set_their_attribute() {
        assert_eq!(Definition::vector(4, vec![]).effective_size(), Some(4));
        assert_eq!(Definition::bitlist(2048).effective_limit(), Some(2048));
        assert_eq!(Definition::reference("Root").effective_ref(), Some("Root"));
        let pc = Definition::progressive_container(vec![], vec![1, 0, 1]);
        assert_eq!(pc.effective_active_fields(), Some(&[1, 0, 1][..]));
    }

    #[test]
    fn field_path_display() {
        let path = FieldPath::root().child("body").child_at(1, "").child("root");
        assert_eq!(path.to_string(), "field 'body' -> child[1] -> field 'root'");
        assert_eq!(FieldPath::root().to_string(), "(root)");
    }

    #[test]
    fn absent_definitions_are_distinct_from_empty() {
        let empty = Schema::new("1.0.0", Catalog::new());
        assert_eq!(empty.definitions, Some(Catalog::new()));
        let absent = Schema {
            version: "1.0.0".into(),
            definitions: None,
            metadata: None,
        };
        assert_eq!(absent.definition_count(), 0);
        assert_ne!(empty, absent);
    }
}
