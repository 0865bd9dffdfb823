//! # Reference Graph Checker
//!
//! Nodes are top-level definition names. There is an edge `A -> B` when
//! definition `A` contains, at any nesting depth, a `ref` to `B`.
//!
//! Two checks run over this graph:
//!
//! - **Existence.** Every `ref` target must be a top-level name.
//! - **Acyclicity.** A three-colour depth-first search from every node
//!   (names in catalog order, references in declaration order) reports the
//!   first cycle found, from the repeated node back to itself:
//!   `A -> B -> C -> A`. A self reference is the one-node cycle
//!   `Node -> Node`.
//!
//! The search depth is capped. Past the cap a degenerate trace
//! `<max-depth-N-exceeded> -> X` is reported instead of recursing further.

use std::collections::{BTreeMap, HashMap};

use sszvet_core::{Catalog, Definition, FieldPath, SchemaError, TypeVariant};

/// One `ref` found inside a definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefSite {
    /// Referenced type name.
    pub target: String,
    /// Trail from the owning definition to the `ref` node.
    pub path: FieldPath,
}

/// Collect every `ref` inside `def`, pre-order, children in declaration
/// order. `ref` nodes without a target are skipped; the structural
/// validator reports those.
pub fn collect_refs(def: &Definition) -> Vec<RefSite> {
    let mut sites = Vec::new();
    let mut stack = vec![(def, FieldPath::root())];

    while let Some((node, path)) = stack.pop() {
        if node.variant == TypeVariant::Ref {
            if let Some(target) = node.effective_ref() {
                sites.push(RefSite {
                    target: target.to_string(),
                    path: path.clone(),
                });
            }
        }
        for (i, child) in node.children.iter().enumerate().rev() {
            stack.push((&child.definition, path.child_at(i, &child.name)));
        }
    }

    sites
}

/// The named-reference graph of one catalog.
#[derive(Debug)]
pub struct ReferenceGraph<'a> {
    catalog: &'a Catalog,
    edges: BTreeMap<&'a str, Vec<RefSite>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    /// On the current search path.
    Grey,
    /// Fully explored.
    Black,
}

impl<'a> ReferenceGraph<'a> {
    pub fn build(catalog: &'a Catalog) -> Self {
        let edges = catalog
            .iter()
            .map(|(name, def)| (name.as_str(), collect_refs(def)))
            .collect();
        Self { catalog, edges }
    }

    /// References held by the definition `name`, in declaration order.
    pub fn references(&self, name: &str) -> &[RefSite] {
        match self.edges.get(name) {
            Some(sites) => sites,
            None => &[],
        }
    }

    /// Total number of `ref` nodes across the catalog.
    pub fn reference_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    /// Verify every reference resolves to a top-level definition.
    ///
    /// # Errors
    ///
    /// `UnknownReference` for the first dangling reference, in catalog
    /// order then declaration order.
    pub fn check_references(&self) -> Result<(), SchemaError> {
        for (from, sites) in &self.edges {
            for site in sites {
                if !self.catalog.contains_key(&site.target) {
                    return Err(SchemaError::UnknownReference {
                        from: (*from).to_string(),
                        to: site.target.clone(),
                        path: site.path.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Verify the graph has no cycle.
    ///
    /// # Errors
    ///
    /// `RecursiveType` carrying the first cycle found.
    pub fn check_acyclic(&self, max_depth: usize) -> Result<(), SchemaError> {
        match self.find_cycle(max_depth) {
            Some(cycle) => Err(SchemaError::RecursiveType { cycle }),
            None => Ok(()),
        }
    }

    /// Returns the first cycle, starting and ending at the repeated node.
    /// Dangling references are ignored.
    pub fn find_cycle(&self, max_depth: usize) -> Option<Vec<String>> {
        let mut search = CycleSearch {
            graph: self,
            colors: HashMap::with_capacity(self.edges.len()),
            path: Vec::new(),
            max_depth,
        };
        self.edges
            .keys()
            .find_map(|name| search.visit(*name, 0))
    }
}

struct CycleSearch<'g, 'a> {
    graph: &'g ReferenceGraph<'a>,
    colors: HashMap<&'a str, Color>,
    path: Vec<&'a str>,
    max_depth: usize,
}

impl<'g, 'a> CycleSearch<'g, 'a> {
    fn visit(&mut self, name: &'a str, depth: usize) -> Option<Vec<String>> {
        if depth > self.max_depth {
            return Some(vec![
                format!("<max-depth-{}-exceeded>", self.max_depth),
                name.to_string(),
            ]);
        }

        match self.colors.get(name) {
            Some(Color::Black) => return None,
            Some(Color::Grey) => return Some(self.cycle_to(name)),
            None => {}
        }

        self.colors.insert(name, Color::Grey);
        self.path.push(name);

        let graph = self.graph;
        let catalog: &'a Catalog = graph.catalog;
        let mut found = None;
        for site in graph.references(name) {
            let Some((target, _)) = catalog.get_key_value(&site.target) else {
                continue;
            };
            tracing::trace!(from = name, to = target.as_str(), "following reference");
            found = self.visit(target.as_str(), depth + 1);
            if found.is_some() {
                break;
            }
        }

        // Leave the current path on every exit, including a cycle hit.
        self.path.pop();
        self.colors.insert(name, Color::Black);
        found
    }

    fn cycle_to(&self, repeated: &str) -> Vec<String> {
        let start = self
            .path
            .iter()
            .position(|n| *n == repeated)
            .unwrap_or(0);
        self.path[start..]
            .iter()
            .chain(std::iter::once(&repeated))
            .map(|n| n.to_string())
            .collect()
    }
}
