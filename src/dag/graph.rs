// src/dag/graph.rs

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::errors::{PedigreeError, Result};
use crate::plugin::{PluginId, PluginLookup};

/// The requested plugins plus everything they transitively `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionClosure {
    /// Requested ids first (in request order, duplicates removed), followed by
    /// implicitly added ids in discovery order.
    ids: Vec<PluginId>,
    /// Ids that were not requested but pulled in as hard dependencies.
    implicitly_added: Vec<PluginId>,
}

impl SelectionClosure {
    /// Expand `selected` along `depends_on` until nothing new is added.
    ///
    /// Fails with [`PedigreeError::UnknownPlugin`] if a requested id, or any
    /// id reached through `depends_on`, is not known to `lookup`.
    pub fn compute<'a, L>(selected: impl IntoIterator<Item = &'a PluginId>, lookup: &L) -> Result<Self>
    where
        L: PluginLookup + ?Sized,
    {
        let mut ids: Vec<PluginId> = Vec::new();
        for id in selected {
            if !ids.contains(id) {
                ids.push(id.clone());
            }
        }

        let mut implicitly_added = Vec::new();
        let mut cursor = 0;

        while cursor < ids.len() {
            let plugin = lookup
                .lookup(ids[cursor].as_str())
                .ok_or_else(|| PedigreeError::UnknownPlugin {
                    plugin_id: ids[cursor].to_string(),
                })?;

            let new_deps: Vec<PluginId> = plugin
                .depends_on()
                .iter()
                .filter(|dep| !ids.contains(dep))
                .cloned()
                .collect();

            for dep in new_deps {
                debug!(
                    plugin = %ids[cursor],
                    dependency = %dep,
                    "adding plugin required by depends_on"
                );
                implicitly_added.push(dep.clone());
                ids.push(dep);
            }

            cursor += 1;
        }

        Ok(Self {
            ids,
            implicitly_added,
        })
    }

    pub fn ids(&self) -> &[PluginId] {
        &self.ids
    }

    pub fn implicitly_added(&self) -> &[PluginId] {
        &self.implicitly_added
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.iter().any(|i| i.as_str() == id)
    }
}

/// Directed "must run before" graph over a selection closure.
///
/// Nodes keep their closure order, which the batch scheduler uses as its
/// tie-break. Edges form a set: declaring the same ordering twice (say via
/// both `depends_on` and `comes_after`) yields a single edge.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    nodes: Vec<PluginId>,
    index: HashMap<PluginId, usize>,
    edges: DiGraphMap<usize, ()>,
    implicitly_added: Vec<PluginId>,
}

impl DependencyGraph {
    /// Build the graph for `selected` against the plugins known to `lookup`.
    ///
    /// Edge rules, for a plugin A in the closure:
    /// - A depends_on B => B -> A
    /// - A comes_before B, B in closure => A -> B
    /// - A comes_after B, B in closure => B -> A
    ///
    /// `comes_before` / `comes_after` targets outside the closure (whether
    /// registered or not) are dropped.
    pub fn build<'a, L>(selected: impl IntoIterator<Item = &'a PluginId>, lookup: &L) -> Result<Self>
    where
        L: PluginLookup + ?Sized,
    {
        let closure = SelectionClosure::compute(selected, lookup)?;
        Self::from_closure(closure, lookup)
    }

    /// Build the graph for an already computed closure.
    pub fn from_closure<L>(closure: SelectionClosure, lookup: &L) -> Result<Self>
    where
        L: PluginLookup + ?Sized,
    {
        let SelectionClosure {
            ids: nodes,
            implicitly_added,
        } = closure;

        let index: HashMap<PluginId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut edges: DiGraphMap<usize, ()> = DiGraphMap::new();
        for i in 0..nodes.len() {
            edges.add_node(i);
        }

        for (node, id) in nodes.iter().enumerate() {
            let plugin = lookup
                .lookup(id.as_str())
                .ok_or_else(|| PedigreeError::UnknownPlugin {
                    plugin_id: id.to_string(),
                })?;

            for dep in plugin.depends_on() {
                let dep_node = index.get(dep).copied().ok_or_else(|| {
                    PedigreeError::UnknownPlugin {
                        plugin_id: dep.to_string(),
                    }
                })?;
                edges.add_edge(dep_node, node, ());
            }

            for before in plugin.comes_before() {
                if let Some(&target) = index.get(before) {
                    edges.add_edge(node, target, ());
                }
            }

            for after in plugin.comes_after() {
                if let Some(&source) = index.get(after) {
                    edges.add_edge(source, node, ());
                }
            }
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.edge_count(),
            implicit = implicitly_added.len(),
            "built plugin dependency graph"
        );

        Ok(Self {
            nodes,
            index,
            edges,
            implicitly_added,
        })
    }

    /// All plugins in the graph, in closure order.
    pub fn plugins(&self) -> &[PluginId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Plugins pulled in through `depends_on` without being requested.
    pub fn implicitly_added(&self) -> &[PluginId] {
        &self.implicitly_added
    }

    /// Whether `before` must precede `after`.
    pub fn has_edge(&self, before: &str, after: &str) -> bool {
        match (self.index.get(before), self.index.get(after)) {
            (Some(&a), Some(&b)) => self.edges.contains_edge(a, b),
            _ => false,
        }
    }

    /// Every "must precede" pair, as `(before, after)`.
    pub fn edges(&self) -> Vec<(&PluginId, &PluginId)> {
        self.edges
            .all_edges()
            .map(|(a, b, _)| (&self.nodes[a], &self.nodes[b]))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.edge_count()
    }

    /// Plugins that must precede `id`.
    pub fn predecessors_of(&self, id: &str) -> Vec<&PluginId> {
        self.neighbours(id, Direction::Incoming)
    }

    /// Plugins that must follow `id`.
    pub fn successors_of(&self, id: &str) -> Vec<&PluginId> {
        self.neighbours(id, Direction::Outgoing)
    }

    fn neighbours(&self, id: &str, direction: Direction) -> Vec<&PluginId> {
        let Some(&node) = self.index.get(id) else {
            return Vec::new();
        };
        let mut found: Vec<usize> = self.edges.neighbors_directed(node, direction).collect();
        found.sort_unstable();
        found.into_iter().map(|n| &self.nodes[n]).collect()
    }

    pub(crate) fn node_id(&self, node: usize) -> &PluginId {
        &self.nodes[node]
    }

    pub(crate) fn in_degree(&self, node: usize) -> usize {
        self.edges
            .neighbors_directed(node, Direction::Incoming)
            .count()
    }

    pub(crate) fn successor_nodes(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.edges.neighbors_directed(node, Direction::Outgoing)
    }
}
