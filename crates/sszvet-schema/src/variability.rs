//! # Size-Variability Resolver
//!
//! Decides whether the encoded length of a definition is fixed or depends
//! on the value, following `ref` targets through the catalog.
//!
//! ## Rules
//!
//! - `list`, `bitlist`, `union` are always variable.
//! - Integers, `boolean`, `bitvector` are always fixed.
//! - `container`, `progressive_container`, `vector` are variable iff any
//!   child is variable. A childless one is fixed. The active-field bitset
//!   only affects merkleization and is ignored here.
//! - `ref` takes the classification of its target.
//!
//! Each top-level definition is expanded at most once per call: a result
//! is recorded the first time its `ref` target is resolved and reused on
//! every later reference, so shared targets cost one visit per reference.
//!
//! One [`IterationBudget`] is shared by the whole call tree. Its ceiling is
//! one visit per node of the catalog (and of the definition being
//! classified) plus `max_iterations`. An acyclic catalog never exceeds the
//! per-node share; only a cycle, which re-expands unfinished definitions,
//! draws on the allowance.

use std::collections::{BTreeMap, HashMap};

use sszvet_core::{
    Attribute, AttributeRule, Catalog, Definition, EncodedSize, FieldPath, SchemaError, Stage,
    TypeVariant, ValidationLimits,
};

use crate::budget::IterationBudget;

/// Owner name reported for definitions classified outside the catalog.
pub const ANONYMOUS: &str = "<anonymous>";

/// Returns whether `def` has a value-dependent encoded length.
///
/// # Errors
///
/// - `UnknownReference` when a reachable `ref` target is not in `catalog`.
/// - `AttributeViolation` when a reachable `ref` has no target.
/// - `RecursionLimitExceeded` when the iteration ceiling is hit.
pub fn is_variable(def: &Definition, catalog: &Catalog) -> Result<bool, SchemaError> {
    SizeResolver::new(catalog).is_variable(ANONYMOUS, def)
}

/// Classifies definitions against one catalog.
#[derive(Debug, Clone, Copy)]
pub struct SizeResolver<'a> {
    catalog: &'a Catalog,
    max_iterations: usize,
    catalog_nodes: usize,
}

/// Traversal state for one call: the shared budget and the results of
/// top-level definitions resolved so far.
struct Resolution<'a> {
    budget: IterationBudget,
    resolved: HashMap<&'a str, bool>,
}

impl<'a> Resolution<'a> {
    fn new(ceiling: usize) -> Self {
        Self {
            budget: IterationBudget::new(Stage::SizeClassification, ceiling),
            resolved: HashMap::new(),
        }
    }
}

impl<'a> SizeResolver<'a> {
    /// A resolver with the default iteration allowance.
    pub fn new(catalog: &'a Catalog) -> Self {
        Self::with_limits(catalog, &ValidationLimits::default())
    }

    pub fn with_limits(catalog: &'a Catalog, limits: &ValidationLimits) -> Self {
        Self {
            catalog,
            max_iterations: limits.max_iterations,
            catalog_nodes: catalog.values().map(Definition::node_count).sum(),
        }
    }

    /// Classify `def`, reporting errors against the type named `owner`.
    pub fn is_variable(&self, owner: &str, def: &Definition) -> Result<bool, SchemaError> {
        let mut state = Resolution::new(self.ceiling().saturating_add(def.node_count()));
        self.walk(owner, def, &FieldPath::root(), &mut state)
    }

    /// Classify the top-level definition called `name`.
    ///
    /// # Errors
    ///
    /// `UnknownReference` (from and to both `name`) if there is no such
    /// definition, plus everything [`SizeResolver::is_variable`] returns.
    pub fn classify(&self, name: &str) -> Result<bool, SchemaError> {
        let catalog: &'a Catalog = self.catalog;
        let (key, def) =
            catalog
                .get_key_value(name)
                .ok_or_else(|| SchemaError::UnknownReference {
                    from: name.to_string(),
                    to: name.to_string(),
                    path: FieldPath::root(),
                })?;
        let mut state = Resolution::new(self.ceiling());
        self.resolve(key, def, &mut state)
    }

    /// Classify every top-level definition in one pass. Results are shared
    /// across definitions, so the whole catalog is expanded once.
    ///
    /// # Errors
    ///
    /// The first error met, in name order.
    pub fn classify_all(&self) -> Result<BTreeMap<String, EncodedSize>, SchemaError> {
        let catalog: &'a Catalog = self.catalog;
        let mut state = Resolution::new(self.ceiling());
        catalog
            .iter()
            .map(|(name, def)| {
                let variable = self.resolve(name, def, &mut state)?;
                Ok((name.clone(), EncodedSize::from_variable(variable)))
            })
            .collect()
    }

    fn ceiling(&self) -> usize {
        self.max_iterations.saturating_add(self.catalog_nodes)
    }

    /// Classify the top-level definition `name`, reusing an earlier result.
    fn resolve(
        &self,
        name: &'a str,
        def: &'a Definition,
        state: &mut Resolution<'a>,
    ) -> Result<bool, SchemaError> {
        if let Some(&variable) = state.resolved.get(name) {
            return Ok(variable);
        }
        let variable = self.walk(name, def, &FieldPath::root(), state)?;
        state.resolved.insert(name, variable);
        Ok(variable)
    }

    fn walk(
        &self,
        owner: &str,
        def: &Definition,
        path: &FieldPath,
        state: &mut Resolution<'a>,
    ) -> Result<bool, SchemaError> {
        state.budget.tick(owner)?;

        match def.variant {
            TypeVariant::List | TypeVariant::BitList | TypeVariant::Union => Ok(true),
            TypeVariant::UInt8
            | TypeVariant::UInt16
            | TypeVariant::UInt32
            | TypeVariant::UInt64
            | TypeVariant::UInt128
            | TypeVariant::UInt256
            | TypeVariant::Boolean
            | TypeVariant::BitVector => Ok(false),
            TypeVariant::Container | TypeVariant::ProgressiveContainer | TypeVariant::Vector => {
                for (i, child) in def.children.iter().enumerate() {
                    let child_path = path.child_at(i, &child.name);
                    if self.walk(owner, &child.definition, &child_path, state)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            TypeVariant::Ref => {
                let target = def
                    .effective_ref()
                    .ok_or_else(|| SchemaError::AttributeViolation {
                        definition: owner.to_string(),
                        path: path.clone(),
                        variant: TypeVariant::Ref,
                        attribute: Attribute::Ref,
                        rule: AttributeRule::Required,
                    })?;
                let catalog: &'a Catalog = self.catalog;
                let (key, target_def) =
                    catalog
                        .get_key_value(target)
                        .ok_or_else(|| SchemaError::UnknownReference {
                            from: owner.to_string(),
                            to: target.to_string(),
                            path: path.clone(),
                        })?;
                self.resolve(key, target_def, state)
            }
        }
    }
}
