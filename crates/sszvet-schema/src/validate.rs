//! # Schema Validator
//!
//! Orchestrates the checks over a whole [`Schema`]:
//!
//! 1. The definitions map must be present.
//! 2. A name stored inside a definition must match its key.
//! 3. Every reference must resolve, and the reference graph must be acyclic.
//!    This runs once over the whole schema.
//! 4. Every definition must pass structural validation.
//!
//! The first failing step wins. Validation is pure: it performs no I/O and
//! never mutates the schema, so a validator can be shared across threads.

use std::collections::BTreeMap;

use sszvet_core::{Catalog, EncodedSize, Schema, SchemaError, ValidationLimits};

use crate::graph::ReferenceGraph;
use crate::structural::StructuralValidator;
use crate::variability::SizeResolver;

/// Validate `schema` with the default limits.
///
/// # Errors
///
/// The first [`SchemaError`] found, in the order described in the module
/// documentation.
pub fn validate(schema: &Schema) -> Result<(), SchemaError> {
    SchemaValidator::default().validate(schema)
}

/// Runs every check over a schema under one set of traversal limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaValidator {
    limits: ValidationLimits,
}

impl SchemaValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `limits`, capped at [`sszvet_core::MAX_CONFIGURED_LIMIT`].
    pub fn with_limits(limits: ValidationLimits) -> Self {
        Self {
            limits: limits.clamped(),
        }
    }

    /// The limits in effect.
    pub fn limits(&self) -> &ValidationLimits {
        &self.limits
    }

    /// Validate the whole schema, failing on the first problem.
    ///
    /// # Errors
    ///
    /// - `MalformedSchema` when the definitions map is absent or a stored
    ///   name disagrees with its key.
    /// - `UnknownReference` / `RecursiveType` from the reference graph.
    /// - Any structural error from the first failing definition, in name
    ///   order.
    pub fn validate(&self, schema: &Schema) -> Result<(), SchemaError> {
        let catalog = self.check_graph(schema)?;

        let structural = StructuralValidator::with_limits(catalog, &self.limits);
        for (name, def) in catalog {
            structural.validate_definition(name, def)?;
        }

        tracing::debug!(
            definitions = catalog.len(),
            version = %schema.version,
            "schema valid"
        );
        Ok(())
    }

    /// Validate every definition independently and collect the failures.
    ///
    /// Document-level problems (absent map, name mismatch, dangling or
    /// cyclic references) are reported as a single failure against the
    /// schema itself, since no definition can be checked in isolation
    /// before they are fixed.
    pub fn validate_each(&self, schema: &Schema) -> ValidationReport {
        let total = schema.definition_count();

        let catalog = match self.check_graph(schema) {
            Ok(catalog) => catalog,
            Err(error) => {
                return ValidationReport {
                    total,
                    passed: 0,
                    failed: 1,
                    failures: vec![DefinitionFailure {
                        definition: None,
                        error,
                    }],
                };
            }
        };

        let structural = StructuralValidator::with_limits(catalog, &self.limits);
        let mut passed = 0usize;
        let mut failures = Vec::new();
        for (name, def) in catalog {
            match structural.validate_definition(name, def) {
                Ok(()) => passed += 1,
                Err(error) => {
                    tracing::debug!(definition = %name, %error, "definition failed");
                    failures.push(DefinitionFailure {
                        definition: Some(name.clone()),
                        error,
                    });
                }
            }
        }

        ValidationReport {
            total,
            passed,
            failed: failures.len(),
            failures,
        }
    }

    /// Validate `schema`, then classify every top-level definition as
    /// fixed or variable size. Shared reference targets are classified once.
    ///
    /// # Errors
    ///
    /// Anything [`SchemaValidator::validate`] returns, plus
    /// `RecursionLimitExceeded` from classification.
    pub fn size_classes(
        &self,
        schema: &Schema,
    ) -> Result<BTreeMap<String, EncodedSize>, SchemaError> {
        self.validate(schema)?;
        let catalog = present(schema)?;
        SizeResolver::with_limits(catalog, &self.limits).classify_all()
    }

    /// Steps 1 to 3: presence, declared names, references.
    fn check_graph<'s>(&self, schema: &'s Schema) -> Result<&'s Catalog, SchemaError> {
        let catalog = present(schema)?;
        tracing::debug!(definitions = catalog.len(), "checking declared names");

        for (key, def) in catalog {
            if let Some(declared) = def.declared_name.as_deref() {
                if !declared.is_empty() && declared != key {
                    return Err(SchemaError::MalformedSchema {
                        reason: format!("type '{key}' has mismatched name field '{declared}'"),
                    });
                }
            }
        }

        let graph = ReferenceGraph::build(catalog);
        tracing::debug!(
            references = graph.reference_count(),
            "checking reference graph"
        );
        graph.check_references()?;
        graph.check_acyclic(self.limits.max_cycle_depth)?;
        Ok(catalog)
    }
}

fn present(schema: &Schema) -> Result<&Catalog, SchemaError> {
    schema
        .definitions
        .as_ref()
        .ok_or_else(|| SchemaError::MalformedSchema {
            reason: "schema has no definitions map".to_string(),
        })
}

/// Per-definition outcome of [`SchemaValidator::validate_each`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    /// Number of top-level definitions in the schema.
    pub total: usize,
    /// Number that passed structural validation.
    pub passed: usize,
    /// Number of recorded failures.
    pub failed: usize,
    /// Details of each failure, in name order.
    pub failures: Vec<DefinitionFailure>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A single failure recorded by [`SchemaValidator::validate_each`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionFailure {
    /// The failing definition, or `None` for a document-level failure.
    pub definition: Option<String>,
    /// The error.
    pub error: SchemaError,
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use sszvet_core::{Attribute, AttributeRule, Definition, Field};

    use crate::structural::{attribute_rules, Presence, CHECKED_ATTRIBUTES};

    fn named(defs: Vec<Definition>) -> Vec<Field> {
        defs.into_iter()
            .enumerate()
            .map(|(i, d)| Field::new(format!("f{i}"), d))
            .collect()
    }

    /// Definition trees that satisfy every attribute rule.
    fn valid_definition() -> impl Strategy<Value = Definition> {
        let leaf = prop_oneof![
            Just(Definition::uint8()),
            Just(Definition::uint16()),
            Just(Definition::uint32()),
            Just(Definition::uint64()),
            Just(Definition::uint128()),
            Just(Definition::uint256()),
            Just(Definition::boolean()),
            (1u64..2048).prop_map(Definition::bitvector),
            (1u64..2048).prop_map(Definition::bitlist),
        ];
        leaf.prop_recursive(3, 32, 4, |inner| {
            let fields = prop::collection::vec(inner, 1..4).prop_map(named);
            prop_oneof![
                fields.clone().prop_map(Definition::container),
                fields.clone().prop_map(Definition::union),
                (1u64..64, fields.clone()).prop_map(|(n, f)| Definition::vector(n, f)),
                (1u64..64, fields.clone()).prop_map(|(n, f)| Definition::list(n, f)),
                (fields, 0usize..4).prop_map(|(f, gaps)| {
                    let mut bits = vec![0i64; gaps];
                    bits.extend(std::iter::repeat(1).take(f.len()));
                    Definition::progressive_container(f, bits)
                }),
            ]
        })
    }

    /// Flip one root attribute so it breaks its rule. Returns the rule
    /// expected to be reported, or `None` when the attribute is optional.
    fn flip(def: &mut Definition, attribute: Attribute) -> Option<AttributeRule> {
        let presence = attribute_rules(def.variant).presence(attribute);
        let set = match presence {
            Presence::Optional => return None,
            Presence::Forbidden => true,
            Presence::Required => false,
        };
        match attribute {
            Attribute::Size => def.size = set.then_some(8),
            Attribute::Limit => def.limit = set.then_some(8),
            Attribute::Ref => def.ref_target = set.then(|| "Elsewhere".to_string()),
            Attribute::Children => {
                def.children = if set {
                    vec![Field::new("extra", Definition::uint8())]
                } else {
                    Vec::new()
                }
            }
            Attribute::ActiveFields => def.active_fields = set.then(|| vec![1]),
            Attribute::Name => return None,
        }
        Some(if set {
            AttributeRule::Forbidden
        } else {
            AttributeRule::Required
        })
    }

    proptest! {
        /// Generated valid trees pass, alone and behind references.
        #[test]
        fn valid_trees_pass(defs in prop::collection::vec(valid_definition(), 1..5)) {
            let mut catalog: Catalog = defs
                .into_iter()
                .enumerate()
                .map(|(i, d)| (format!("T{i}"), d))
                .collect();
            let refs = catalog
                .keys()
                .map(|name| Field::new(name.to_lowercase(), Definition::reference(name.clone())))
                .collect();
            catalog.insert("Top".to_string(), Definition::container(refs));

            let schema = Schema::new("1.0", catalog);
            prop_assert!(validate(&schema).is_ok(), "{:?}", validate(&schema).err());
            prop_assert!(SchemaValidator::new().size_classes(&schema).is_ok());
        }

        /// Breaking exactly one root attribute yields that attribute's
        /// violation at the root.
        #[test]
        fn single_flip_is_reported(
            mut def in valid_definition(),
            pick in 0usize..CHECKED_ATTRIBUTES.len(),
        ) {
            let attribute = CHECKED_ATTRIBUTES[pick];
            let expected = flip(&mut def, attribute);
            prop_assume!(expected.is_some());

            let schema = Schema::from_definitions("1.0", [("Root", def)]);
            match validate(&schema) {
                Err(SchemaError::AttributeViolation { attribute: a, rule, path, .. }) => {
                    prop_assert_eq!(a, attribute);
                    prop_assert_eq!(Some(rule), expected);
                    prop_assert!(path.is_root());
                }
                other => prop_assert!(false, "unexpected outcome: {:?}", other),
            }
        }

        /// Validation is a pure function of the schema.
        #[test]
        fn validation_is_deterministic(def in valid_definition(), size in 0u64..3) {
            let mut def = def;
            def.size = Some(size);
            let schema = Schema::from_definitions("1.0", [("Root", def)]);
            prop_assert_eq!(validate(&schema), validate(&schema));
        }
    }
}
