// src/dag/batch.rs

//! Layered topological sort of the plugin dependency graph.

use tracing::{debug, warn};

use crate::dag::graph::DependencyGraph;
use crate::errors::{PedigreeError, Result};
use crate::plugin::{PluginId, PluginLookup};

/// Plugins grouped into dependency layers.
///
/// Every plugin appears in exactly one batch, each edge `A -> B` of the
/// source graph has `batch(A) < batch(B)`, and every batch is maximal: no
/// plugin could move to an earlier batch. Within a batch, plugins keep the
/// graph's node order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batches {
    batches: Vec<Vec<PluginId>>,
}

impl Batches {
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[PluginId]> {
        self.batches.iter().map(|b| b.as_slice())
    }

    pub fn get(&self, index: usize) -> Option<&[PluginId]> {
        self.batches.get(index).map(|b| b.as_slice())
    }

    /// Index of the batch containing `id`.
    pub fn batch_index_of(&self, id: &str) -> Option<usize> {
        self.batches
            .iter()
            .position(|batch| batch.iter().any(|p| p.as_str() == id))
    }

    /// Instantiation order: batch 0 first, then batch 1, and so on.
    pub fn flatten(&self) -> Vec<PluginId> {
        self.batches.iter().flatten().cloned().collect()
    }

    pub fn into_inner(self) -> Vec<Vec<PluginId>> {
        self.batches
    }
}

/// Orders a [`DependencyGraph`] into [`Batches`] using Kahn's algorithm,
/// one layer at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchScheduler;

impl BatchScheduler {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the graph into batches.
    ///
    /// Fails with [`PedigreeError::CyclicDependency`] listing every plugin
    /// that could not be ordered. No partial result is ever returned.
    pub fn resolve(&self, graph: &DependencyGraph) -> Result<Batches> {
        let mut in_degree: Vec<usize> = (0..graph.len()).map(|n| graph.in_degree(n)).collect();

        let mut current: Vec<usize> = (0..graph.len()).filter(|&n| in_degree[n] == 0).collect();
        let mut batches: Vec<Vec<PluginId>> = Vec::new();
        let mut placed = 0;

        while !current.is_empty() {
            let mut next = Vec::new();

            for &node in &current {
                for succ in graph.successor_nodes(node) {
                    in_degree[succ] -= 1;
                    if in_degree[succ] == 0 {
                        next.push(succ);
                    }
                }
            }

            placed += current.len();
            let batch: Vec<PluginId> = current.iter().map(|&n| graph.node_id(n).clone()).collect();
            debug!(
                batch = batches.len(),
                plugins = ?batch.iter().map(PluginId::as_str).collect::<Vec<_>>(),
                "resolved plugin batch"
            );
            batches.push(batch);

            next.sort_unstable();
            current = next;
        }

        if placed < graph.len() {
            let plugin_ids: Vec<PluginId> = (0..graph.len())
                .filter(|&n| in_degree[n] > 0)
                .map(|n| graph.node_id(n).clone())
                .collect();
            warn!(
                plugins = ?plugin_ids.iter().map(PluginId::as_str).collect::<Vec<_>>(),
                "plugin dependency cycle detected"
            );
            return Err(PedigreeError::CyclicDependency { plugin_ids });
        }

        Ok(Batches { batches })
    }
}

/// Build the dependency graph for `selected` and resolve it into batches.
pub fn resolve_plugins<'a, L>(
    selected: impl IntoIterator<Item = &'a PluginId>,
    lookup: &L,
) -> Result<Batches>
where
    L: PluginLookup + ?Sized,
{
    let graph = DependencyGraph::build(selected, lookup)?;
    BatchScheduler::new().resolve(&graph)
}
