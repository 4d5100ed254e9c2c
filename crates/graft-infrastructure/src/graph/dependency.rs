//! Static dependency graph
//!
//! Resolves every reference token once, up front, and checks the graph for
//! cycles before anything is built. The resulting order lists every node
//! after all of its dependencies.

use std::collections::{HashMap, HashSet};

use graft_domain::error::{Error, Result};
use graft_domain::value_objects::{QualifiedName, Tier};

use super::reference::ReferenceShape;
use super::tree::ConfigTree;

/// A reference parameter with its targets resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParam {
    param: String,
    shape: ReferenceShape,
    targets: Vec<(Tier, QualifiedName)>,
}

impl ResolvedParam {
    pub(crate) fn new(
        param: impl Into<String>,
        shape: ReferenceShape,
        targets: Vec<(Tier, QualifiedName)>,
    ) -> Self {
        Self {
            param: param.into(),
            shape,
            targets,
        }
    }

    /// Parameter name handed to the factory
    pub fn param(&self) -> &str {
        &self.param
    }

    /// Single reference or list
    pub fn shape(&self) -> ReferenceShape {
        self.shape
    }

    /// Resolved targets in declaration order
    pub fn targets(&self) -> &[(Tier, QualifiedName)] {
        &self.targets
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Resolved, acyclic reference graph
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: HashMap<QualifiedName, Vec<ResolvedParam>>,
    order: Vec<QualifiedName>,
}

impl DependencyGraph {
    /// Resolve every reference in `tree` and reject cycles
    ///
    /// # Errors
    ///
    /// [`Error::UnresolvedReference`] for the first token that does not
    /// resolve, [`Error::CircularReference`] naming the full chain of the
    /// first cycle found.
    pub fn build(tree: &ConfigTree) -> Result<Self> {
        let mut edges = HashMap::with_capacity(tree.len());
        for node in tree.nodes() {
            let params = node
                .references()
                .iter()
                .map(|reference| {
                    let targets = reference
                        .tokens()
                        .iter()
                        .map(|token| tree.resolve_reference(token, node))
                        .collect::<Result<Vec<_>>>()?;
                    Ok(ResolvedParam::new(
                        reference.param(),
                        reference.shape(),
                        targets,
                    ))
                })
                .collect::<Result<Vec<_>>>()?;
            edges.insert(node.name().clone(), params);
        }

        let mut graph = Self {
            edges,
            order: Vec::with_capacity(tree.len()),
        };
        let mut marks = HashMap::with_capacity(tree.len());
        let mut stack = Vec::new();
        for node in tree.nodes() {
            graph.visit(node.name(), &mut marks, &mut stack)?;
        }
        Ok(graph)
    }

    fn visit(
        &mut self,
        name: &QualifiedName,
        marks: &mut HashMap<QualifiedName, Mark>,
        stack: &mut Vec<QualifiedName>,
    ) -> Result<()> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = stack.iter().position(|n| n == name).unwrap_or(0);
                let chain = stack[start..]
                    .iter()
                    .chain(std::iter::once(name))
                    .map(ToString::to_string);
                return Err(Error::circular(chain));
            }
            None => {}
        }

        marks.insert(name.clone(), Mark::Visiting);
        stack.push(name.clone());
        let targets: Vec<QualifiedName> = self.dependencies(name).cloned().collect();
        for target in &targets {
            self.visit(target, marks, stack)?;
        }
        stack.pop();
        marks.insert(name.clone(), Mark::Done);
        self.order.push(name.clone());
        Ok(())
    }

    /// Resolved reference parameters of `name`
    pub fn params(&self, name: &QualifiedName) -> &[ResolvedParam] {
        self.edges.get(name).map_or(&[], Vec::as_slice)
    }

    /// Direct dependencies of `name`, in declaration order
    pub fn dependencies<'a>(
        &'a self,
        name: &QualifiedName,
    ) -> impl Iterator<Item = &'a QualifiedName> + 'a {
        self.params(name)
            .iter()
            .flat_map(|param| param.targets.iter().map(|(_, target)| target))
    }

    /// Every node, dependencies first
    pub fn build_order(&self) -> &[QualifiedName] {
        &self.order
    }

    /// `names` plus everything they depend on, dependencies first
    pub fn build_order_for<'a, I>(&self, names: I) -> Vec<QualifiedName>
    where
        I: IntoIterator<Item = &'a QualifiedName>,
    {
        let mut wanted = HashSet::new();
        let mut pending: Vec<&QualifiedName> = names.into_iter().collect();
        while let Some(name) = pending.pop() {
            if wanted.insert(name.clone()) {
                pending.extend(self.dependencies(name));
            }
        }
        self.order
            .iter()
            .filter(|name| wanted.contains(*name))
            .cloned()
            .collect()
    }
}
