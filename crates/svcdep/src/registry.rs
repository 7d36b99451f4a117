//! The service registry: a loaded snapshot indexed for queries.
//!
//! Loading builds a directed graph over every name the snapshot mentions.
//! Edges point dependent -> target and carry the declared tag, so forward
//! relations read a service's own entry list (declaration order) while
//! reverse relations walk the graph's incoming edges. Names that appear
//! only as targets (dangling services, provided virtuals, cross-domain
//! references) get graph nodes too, which makes reverse lookups on them
//! work without special cases.
//!
//! A registry is read-only after construction. It owns its snapshot; a
//! rebuild replaces the whole registry.

use crate::error::Result;
use crate::relation::{DepKind, Direction, Relation, Strength};
use crate::tree::DepTree;
use crate::types::{Service, ServiceName};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::path::Path;

/// Query-ready view of one dependency tree snapshot.
#[derive(Debug)]
pub struct Registry {
    tree: DepTree,
    index: HashMap<ServiceName, usize>,
    graph: DiGraph<ServiceName, DepKind>,
    node_map: HashMap<ServiceName, NodeIndex>,
}

impl Registry {
    /// Index a snapshot for querying.
    #[must_use]
    pub fn new(tree: DepTree) -> Self {
        let mut index = HashMap::with_capacity(tree.services.len());
        let mut graph = DiGraph::new();
        let mut node_map: HashMap<ServiceName, NodeIndex> =
            HashMap::with_capacity(tree.services.len());

        // First pass: a node per declared service.
        for (position, service) in tree.services.iter().enumerate() {
            index.insert(service.name.clone(), position);
            let node = graph.add_node(service.name.clone());
            node_map.insert(service.name.clone(), node);
        }

        // Second pass: edges, creating nodes for dangling targets on demand.
        for service in &tree.services {
            let from = node_map[&service.name];
            for entry in &service.entries {
                let to = match node_map.get(&entry.target) {
                    Some(&node) => node,
                    None => {
                        let node = graph.add_node(entry.target.clone());
                        node_map.insert(entry.target.clone(), node);
                        node
                    }
                };
                graph.add_edge(from, to, entry.kind);
            }
        }

        Self {
            tree,
            index,
            graph,
            node_map,
        }
    }

    /// Load and index the snapshot stored at `path`.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::Error::SnapshotMissing`] and
    /// [`crate::Error::CorruptSnapshot`] from the store.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(crate::store::load(path)?))
    }

    /// The underlying snapshot.
    #[must_use]
    pub fn tree(&self) -> &DepTree {
        &self.tree
    }

    /// Look up a service by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Service> {
        self.index.get(name).map(|&pos| &self.tree.services[pos])
    }

    /// Returns `true` if the registry has an entry for `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// All service names, in snapshot order.
    pub fn service_names(&self) -> impl Iterator<Item = &ServiceName> {
        self.tree.services.iter().map(|service| &service.name)
    }

    /// Number of services in the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.services.len()
    }

    /// Returns `true` if the registry holds no services.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.services.is_empty()
    }

    /// Returns `true` if `name` is a member of `runlevel`.
    ///
    /// Checked against the snapshot's membership map, so names without a
    /// service declaration still count when a runlevel lists them.
    #[must_use]
    pub fn in_runlevel(&self, name: &str, runlevel: &str) -> bool {
        self.tree
            .runlevels
            .get(runlevel)
            .is_some_and(|members| members.contains(name))
    }

    /// Neighbors of `name` through one relation.
    ///
    /// Forward relations list the service's own targets in declaration
    /// order. Reverse relations list the services declaring `name` as a
    /// target, in snapshot order. Unknown names have no neighbors.
    #[must_use]
    pub fn related(&self, name: &str, relation: Relation) -> Vec<&ServiceName> {
        match relation.direction() {
            Direction::Forward => match self.get(name) {
                Some(service) => service.targets(relation.kind()).collect(),
                None => Vec::new(),
            },
            Direction::Reverse => {
                let Some(&node) = self.node_map.get(name) else {
                    return Vec::new();
                };
                let mut sources: Vec<&ServiceName> = self
                    .graph
                    .edges_directed(node, petgraph::Direction::Incoming)
                    .filter(|edge| *edge.weight() == relation.kind())
                    .map(|edge| &self.graph[edge.source()])
                    .collect();
                // petgraph yields incoming edges newest-first; flip back to
                // snapshot insertion order.
                sources.reverse();
                sources
            }
        }
    }

    /// Hard-required targets of `name` that no service declares.
    ///
    /// These are the broken dependencies worth surfacing to an operator;
    /// optional tags ignore missing targets.
    #[must_use]
    pub fn missing_required(&self, name: &str) -> Vec<&ServiceName> {
        match self.get(name) {
            Some(service) => service
                .entries
                .iter()
                .filter(|entry| {
                    entry.kind.strength() == Strength::Required
                        && !self.contains(entry.target.as_str())
                })
                .map(|entry| &entry.target)
                .collect(),
            None => Vec::new(),
        }
    }
}
