//! # Structural Validator
//!
//! Applies the per-variant attribute rules to a definition and, depth
//! first and left to right, to every nested child. The first violation
//! found is returned.
//!
//! ## Attribute Rules
//!
//! | Variant | size | limit | ref | children | active_fields |
//! |---------|------|-------|-----|----------|---------------|
//! | integers, `boolean` | – | – | – | – | – |
//! | `container`, `union` | – | – | – | required | – |
//! | `progressive_container` | – | – | – | required | required |
//! | `vector` | required | – | – | optional | – |
//! | `list` | – | required | – | optional | – |
//! | `bitvector` | required | – | – | – | – |
//! | `bitlist` | – | required | – | – | – |
//! | `ref` | – | – | required | – | – |
//!
//! "–" means forbidden. Zero and empty values count as absent.
//!
//! `ref` targets are checked for existence but never entered, so the walk
//! covers one definition tree. Its only ceiling is nesting depth: at most
//! `max_iterations` levels, counting the top-level definition.

use std::collections::HashSet;

use sszvet_core::{
    Attribute, AttributeRule, BitsetRule, Catalog, Definition, FieldPath, SchemaError, Stage,
    TypeVariant, ValidationLimits, MAX_ACTIVE_FIELDS,
};

use crate::variability::ANONYMOUS;

/// Whether a variant requires, permits or forbids an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    Forbidden,
}

/// The presence rule of each optional attribute for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeRules {
    pub size: Presence,
    pub limit: Presence,
    pub ref_target: Presence,
    pub children: Presence,
    pub active_fields: Presence,
}

impl AttributeRules {
    const NONE: Self = Self {
        size: Presence::Forbidden,
        limit: Presence::Forbidden,
        ref_target: Presence::Forbidden,
        children: Presence::Forbidden,
        active_fields: Presence::Forbidden,
    };

    /// The rule for `attribute`. `name` is governed by the parent and is
    /// always required here.
    pub fn presence(&self, attribute: Attribute) -> Presence {
        match attribute {
            Attribute::Size => self.size,
            Attribute::Limit => self.limit,
            Attribute::Ref => self.ref_target,
            Attribute::Children => self.children,
            Attribute::ActiveFields => self.active_fields,
            Attribute::Name => Presence::Required,
        }
    }
}

/// Attributes checked on every node, in reporting order.
pub const CHECKED_ATTRIBUTES: [Attribute; 5] = [
    Attribute::Size,
    Attribute::Limit,
    Attribute::Ref,
    Attribute::Children,
    Attribute::ActiveFields,
];

/// Returns the attribute rules for `variant`.
pub fn attribute_rules(variant: TypeVariant) -> AttributeRules {
    use Presence::{Optional, Required};

    match variant {
        TypeVariant::UInt8
        | TypeVariant::UInt16
        | TypeVariant::UInt32
        | TypeVariant::UInt64
        | TypeVariant::UInt128
        | TypeVariant::UInt256
        | TypeVariant::Boolean => AttributeRules::NONE,
        TypeVariant::Container | TypeVariant::Union => AttributeRules {
            children: Required,
            ..AttributeRules::NONE
        },
        TypeVariant::ProgressiveContainer => AttributeRules {
            children: Required,
            active_fields: Required,
            ..AttributeRules::NONE
        },
        TypeVariant::Vector => AttributeRules {
            size: Required,
            children: Optional,
            ..AttributeRules::NONE
        },
        TypeVariant::List => AttributeRules {
            limit: Required,
            children: Optional,
            ..AttributeRules::NONE
        },
        TypeVariant::BitVector => AttributeRules {
            size: Required,
            ..AttributeRules::NONE
        },
        TypeVariant::BitList => AttributeRules {
            limit: Required,
            ..AttributeRules::NONE
        },
        TypeVariant::Ref => AttributeRules {
            ref_target: Required,
            ..AttributeRules::NONE
        },
    }
}

/// True when `def` carries a non-zero, non-empty value for `attribute`.
///
/// A child's `name` lives on its enclosing [`sszvet_core::Field`]; a
/// definition only carries one through the legacy `declared_name`.
pub fn carries(def: &Definition, attribute: Attribute) -> bool {
    match attribute {
        Attribute::Size => def.effective_size().is_some(),
        Attribute::Limit => def.effective_limit().is_some(),
        Attribute::Ref => def.effective_ref().is_some(),
        Attribute::Children => !def.children.is_empty(),
        Attribute::ActiveFields => def.effective_active_fields().is_some(),
        Attribute::Name => def.declared_name.as_deref().is_some_and(|n| !n.is_empty()),
    }
}

/// Validate `def` against the attribute rules, recursively.
///
/// # Errors
///
/// The first `AttributeViolation`, `BitsetViolation`, `UnknownReference`
/// or `RecursionLimitExceeded` (nesting too deep) met in depth-first,
/// left-to-right order.
pub fn validate(def: &Definition, catalog: &Catalog) -> Result<(), SchemaError> {
    StructuralValidator::new(catalog).validate_definition(ANONYMOUS, def)
}

/// Applies the attribute rules against one catalog.
#[derive(Debug, Clone, Copy)]
pub struct StructuralValidator<'a> {
    catalog: &'a Catalog,
    max_depth: usize,
}

impl<'a> StructuralValidator<'a> {
    /// A validator with the default depth ceiling.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self::with_limits(catalog, &ValidationLimits::default())
    }

    pub fn with_limits(catalog: &'a Catalog, limits: &ValidationLimits) -> Self {
        Self {
            catalog,
            max_depth: limits.max_iterations,
        }
    }

    /// Validate the definition named `name`.
    pub fn validate_definition(&self, name: &str, def: &Definition) -> Result<(), SchemaError> {
        self.walk(name, def, &FieldPath::root(), 0)
    }

    fn walk(
        &self,
        owner: &str,
        def: &Definition,
        path: &FieldPath,
        depth: usize,
    ) -> Result<(), SchemaError> {
        if depth >= self.max_depth {
            return Err(SchemaError::RecursionLimitExceeded {
                stage: Stage::StructuralValidation,
                definition: owner.to_string(),
                limit: self.max_depth,
            });
        }

        let rules = attribute_rules(def.variant);
        for attribute in CHECKED_ATTRIBUTES {
            let rule = match (rules.presence(attribute), carries(def, attribute)) {
                (Presence::Required, false) => AttributeRule::Required,
                (Presence::Forbidden, true) => AttributeRule::Forbidden,
                _ => continue,
            };
            return Err(SchemaError::AttributeViolation {
                definition: owner.to_string(),
                path: path.clone(),
                variant: def.variant,
                attribute,
                rule,
            });
        }

        if let Some(bits) = def.effective_active_fields() {
            check_bitset(bits, def.children.len()).map_err(|rule| {
                SchemaError::BitsetViolation {
                    definition: owner.to_string(),
                    path: path.clone(),
                    rule,
                }
            })?;
        }

        if let Some(target) = def.effective_ref() {
            if !self.catalog.contains_key(target) {
                return Err(SchemaError::UnknownReference {
                    from: owner.to_string(),
                    to: target.to_string(),
                    path: path.clone(),
                });
            }
        }

        let mut seen: HashSet<&str> = HashSet::with_capacity(def.children.len());
        for (i, child) in def.children.iter().enumerate() {
            let child_path = path.child_at(i, &child.name);
            let name_rule = if child.name.is_empty() {
                Some(AttributeRule::Required)
            } else if !seen.insert(child.name.as_str()) {
                Some(AttributeRule::Unique)
            } else {
                None
            };
            if let Some(rule) = name_rule {
                return Err(SchemaError::AttributeViolation {
                    definition: owner.to_string(),
                    path: child_path,
                    variant: def.variant,
                    attribute: Attribute::Name,
                    rule,
                });
            }
            self.walk(owner, &child.definition, &child_path, depth + 1)?;
        }

        Ok(())
    }
}

/// Cross-check a non-empty active-field bitset against the child count.
fn check_bitset(bits: &[i64], children: usize) -> Result<(), BitsetRule> {
    if bits.len() > MAX_ACTIVE_FIELDS {
        return Err(BitsetRule::TooLong {
            len: bits.len(),
            max: MAX_ACTIVE_FIELDS,
        });
    }
    if bits.last() == Some(&0) {
        return Err(BitsetRule::TrailingZero);
    }
    let mut active = 0usize;
    for (index, &value) in bits.iter().enumerate() {
        match value {
            0 => {}
            1 => active += 1,
            _ => return Err(BitsetRule::NonBinary { index, value }),
        }
    }
    if active != children {
        return Err(BitsetRule::PopulationMismatch { active, children });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sszvet_core::{ErrorKind, Field};

    fn two_fields() -> Vec<Field> {
        vec![
            Field::new("a", Definition::uint64()),
            Field::new("b", Definition::boolean()),
        ]
    }

    fn check(def: &Definition) -> Result<(), SchemaError> {
        StructuralValidator::new(&Catalog::new()).validate_definition("T", def)
    }

    fn violation(err: SchemaError) -> (Attribute, AttributeRule, FieldPath) {
        match err {
            SchemaError::AttributeViolation {
                attribute,
                rule,
                path,
                ..
            } => (attribute, rule, path),
            other => panic!("expected AttributeViolation, got: {other}"),
        }
    }

    #[test]
    fn every_variant_has_a_rule_row() {
        for v in TypeVariant::all() {
            let rules = attribute_rules(*v);
            let required = CHECKED_ATTRIBUTES
                .iter()
                .filter(|a| rules.presence(**a) == Presence::Required)
                .count();
            if v.is_basic() {
                assert_eq!(required, 0, "{v}");
            } else {
                assert!(required >= 1, "{v} should require something");
            }
        }
    }

    #[test]
    fn primitives_accept_no_attributes() {
        assert!(check(&Definition::uint8()).is_ok());
        let mut bad = Definition::uint8();
        bad.limit = Some(3);
        let (attr, rule, _) = violation(check(&bad).unwrap_err());
        assert_eq!((attr, rule), (Attribute::Limit, AttributeRule::Forbidden));
    }

    #[test]
    fn container_with_size_names_size() {
        let mut def = Definition::container(two_fields());
        def.size = Some(4);
        let err = check(&def).unwrap_err();
        assert!(err.to_string().contains("'size'"));
        let (attr, rule, path) = violation(err);
        assert_eq!((attr, rule), (Attribute::Size, AttributeRule::Forbidden));
        assert!(path.is_root());
    }

    #[test]
    fn zero_size_on_container_is_absent() {
        let mut def = Definition::container(two_fields());
        def.size = Some(0);
        assert!(check(&def).is_ok());
    }

    #[test]
    fn empty_container_and_union_rejected() {
        for def in [Definition::container(vec![]), Definition::union(vec![])] {
            let (attr, rule, _) = violation(check(&def).unwrap_err());
            assert_eq!((attr, rule), (Attribute::Children, AttributeRule::Required));
        }
    }

    #[test]
    fn list_limit_rules() {
        let zero = Definition::list(0, vec![Field::new("e", Definition::uint8())]);
        let (attr, rule, _) = violation(check(&zero).unwrap_err());
        assert_eq!((attr, rule), (Attribute::Limit, AttributeRule::Required));

        let ok = Definition::list(100, vec![Field::new("e", Definition::uint8())]);
        assert!(check(&ok).is_ok());
        assert!(check(&Definition::list(100, vec![])).is_ok());
    }

    #[test]
    fn vector_requires_size() {
        let mut def = Definition::vector(0, vec![]);
        let (attr, _, _) = violation(check(&def).unwrap_err());
        assert_eq!(attr, Attribute::Size);
        def.size = Some(32);
        assert!(check(&def).is_ok());
    }

    #[test]
    fn bit_types_forbid_children() {
        let mut def = Definition::bitvector(8);
        def.children = two_fields();
        let (attr, rule, _) = violation(check(&def).unwrap_err());
        assert_eq!((attr, rule), (Attribute::Children, AttributeRule::Forbidden));
    }

    #[test]
    fn ref_requires_target_in_catalog() {
        let mut catalog = Catalog::new();
        catalog.insert("Root".into(), Definition::bitvector(256));
        let v = StructuralValidator::new(&catalog);
        assert!(v.validate_definition("Alias", &Definition::reference("Root")).is_ok());

        let err = v
            .validate_definition("Alias", &Definition::reference("Nope"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownReference);

        let (attr, rule, _) = violation(
            v.validate_definition("Alias", &Definition::reference(""))
                .unwrap_err(),
        );
        assert_eq!((attr, rule), (Attribute::Ref, AttributeRule::Required));
    }

    #[test]
    fn active_fields_forbidden_outside_progressive() {
        let mut def = Definition::container(two_fields());
        def.active_fields = Some(vec![1, 1]);
        let (attr, rule, _) = violation(check(&def).unwrap_err());
        assert_eq!((attr, rule), (Attribute::ActiveFields, AttributeRule::Forbidden));
    }

    #[test]
    fn progressive_bitset_rules() {
        let ok = Definition::progressive_container(two_fields(), vec![1, 0, 1]);
        assert!(check(&ok).is_ok());

        let trailing = Definition::progressive_container(two_fields(), vec![1, 1, 0]);
        let err = check(&trailing).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BitsetViolation);
        assert!(matches!(
            err,
            SchemaError::BitsetViolation {
                rule: BitsetRule::TrailingZero,
                ..
            }
        ));

        let non_binary = Definition::progressive_container(two_fields(), vec![1, 2, 1]);
        assert!(matches!(
            check(&non_binary).unwrap_err(),
            SchemaError::BitsetViolation {
                rule: BitsetRule::NonBinary { index: 1, value: 2 },
                ..
            }
        ));

        let mismatch = Definition::progressive_container(two_fields(), vec![1, 1, 1]);
        assert!(matches!(
            check(&mismatch).unwrap_err(),
            SchemaError::BitsetViolation {
                rule: BitsetRule::PopulationMismatch {
                    active: 3,
                    children: 2
                },
                ..
            }
        ));

        let mut long = vec![0; MAX_ACTIVE_FIELDS];
        long.push(1);
        let too_long = Definition::progressive_container(
            vec![Field::new("only", Definition::uint8())],
            long,
        );
        assert!(matches!(
            check(&too_long).unwrap_err(),
            SchemaError::BitsetViolation {
                rule: BitsetRule::TooLong { len: 257, max: 256 },
                ..
            }
        ));
    }

    #[test]
    fn progressive_requires_bitset() {
        let mut def = Definition::progressive_container(two_fields(), vec![]);
        let (attr, rule, _) = violation(check(&def).unwrap_err());
        assert_eq!((attr, rule), (Attribute::ActiveFields, AttributeRule::Required));
        def.limit = Some(256);
        let (attr, _, _) = violation(check(&def).unwrap_err());
        assert_eq!(attr, Attribute::Limit);
    }

    #[test]
    fn bitset_checked_before_children() {
        let mut children = two_fields();
        children[0].definition.size = Some(1);
        let def = Definition::progressive_container(children, vec![1, 1, 0]);
        assert_eq!(check(&def).unwrap_err().kind(), ErrorKind::BitsetViolation);
    }

    #[test]
    fn child_names_must_be_present_and_unique() {
        let dup = Definition::container(vec![
            Field::new("x", Definition::uint8()),
            Field::new("x", Definition::uint16()),
        ]);
        let (attr, rule, path) = violation(check(&dup).unwrap_err());
        assert_eq!((attr, rule), (Attribute::Name, AttributeRule::Unique));
        assert_eq!(path.to_string(), "field 'x'");

        let unnamed = Definition::union(vec![
            Field::new("a", Definition::uint8()),
            Field::new("", Definition::uint16()),
        ]);
        let (attr, rule, path) = violation(check(&unnamed).unwrap_err());
        assert_eq!((attr, rule), (Attribute::Name, AttributeRule::Required));
        assert_eq!(path.to_string(), "child[1]");
    }

    #[test]
    fn nested_violation_reports_trail() {
        let def = Definition::container(vec![
            Field::new("ok", Definition::uint8()),
            Field::new(
                "body",
                Definition::container(vec![Field::new("items", Definition::list(0, vec![]))]),
            ),
        ]);
        let err = check(&def).unwrap_err();
        assert_eq!(
            err.to_string(),
            "type 'T' at field 'body' -> field 'items': attribute 'limit' must be present and non-zero/non-empty for type 'list'"
        );
    }

    #[test]
    fn first_error_in_declaration_order_wins() {
        let def = Definition::container(vec![
            Field::new("first", Definition::bitvector(0)),
            Field::new("second", Definition::bitlist(0)),
        ]);
        let (attr, _, path) = violation(check(&def).unwrap_err());
        assert_eq!(attr, Attribute::Size);
        assert_eq!(path.to_string(), "field 'first'");
    }

    #[test]
    fn wide_container_is_not_limited() {
        let wide = Definition::container(
            (0..5000)
                .map(|i| Field::new(format!("f{i}"), Definition::uint8()))
                .collect(),
        );
        assert!(check(&wide).is_ok());
    }

    #[test]
    fn depth_ceiling_counts_levels() {
        // Three levels: container -> container -> uint8.
        let def = Definition::container(vec![Field::new(
            "inner",
            Definition::container(vec![Field::new("leaf", Definition::uint8())]),
        )]);
        let catalog = Catalog::new();
        let limits = |max_iterations| ValidationLimits {
            max_iterations,
            ..ValidationLimits::default()
        };
        assert!(StructuralValidator::with_limits(&catalog, &limits(3))
            .validate_definition("T", &def)
            .is_ok());
        let err = StructuralValidator::with_limits(&catalog, &limits(2))
            .validate_definition("T", &def)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::RecursionLimitExceeded {
                stage: Stage::StructuralValidation,
                definition: "T".into(),
                limit: 2,
            }
        );
    }

    #[test]
    fn depth_ceiling_bounds_deep_nesting() {
        let mut def = Definition::uint8();
        for i in 0..20 {
            def = Definition::container(vec![Field::new(format!("l{i}"), def)]);
        }
        let catalog = Catalog::new();
        let tight = ValidationLimits {
            max_iterations: 10,
            ..ValidationLimits::default()
        };
        let err = StructuralValidator::with_limits(&catalog, &tight)
            .validate_definition("Deep", &def)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RecursionLimitExceeded);
        assert!(StructuralValidator::new(&catalog)
            .validate_definition("Deep", &def)
            .is_ok());
    }
}
