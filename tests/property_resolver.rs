// tests/property_resolver.rs

use std::collections::HashSet;

use proptest::prelude::*;
use pedigree::dag::{BatchScheduler, DependencyGraph};
use pedigree::errors::PedigreeError;
use pedigree::plugin::{PluginId, PluginRegistry};
use pedigree_test_utils::builders::RegistryBuilder;

/// Raw constraints for plugin `i`: indices of depends_on / comes_before /
/// comes_after targets.
type RawConstraints = (Vec<usize>, Vec<usize>, Vec<usize>);

fn name(i: usize) -> String {
    format!("p{}", i)
}

// Acyclic by construction: every edge goes from a lower to a higher index.
// depends_on / comes_after point to lower indices, comes_before to higher ones.
fn acyclic_registry_strategy(max_plugins: usize) -> impl Strategy<Value = (PluginRegistry, usize)> {
    (1..=max_plugins).prop_flat_map(|n| {
        let raw = proptest::collection::vec(
            (
                proptest::collection::vec(any::<usize>(), 0..3),
                proptest::collection::vec(any::<usize>(), 0..3),
                proptest::collection::vec(any::<usize>(), 0..3),
            ),
            n,
        );
        raw.prop_map(move |raw: Vec<RawConstraints>| {
            let names: Vec<String> = (0..n).map(name).collect();
            let mut builder = RegistryBuilder::new();
            for (i, (deps, before, after)) in raw.into_iter().enumerate() {
                let lower = |xs: Vec<usize>| {
                    let set: HashSet<usize> = if i == 0 {
                        HashSet::new()
                    } else {
                        xs.into_iter().map(|x| x % i).collect()
                    };
                    set.into_iter().map(|j| names[j].as_str()).collect::<Vec<&str>>()
                };
                let higher = |xs: Vec<usize>| {
                    let set: HashSet<usize> = if i + 1 >= n {
                        HashSet::new()
                    } else {
                        xs.into_iter().map(|x| i + 1 + x % (n - i - 1)).collect()
                    };
                    set.into_iter().map(|j| names[j].as_str()).collect::<Vec<&str>>()
                };
                builder = builder.plugin_with(&names[i], &lower(deps), &higher(before), &lower(after));
            }
            (builder.build(), n)
        })
    })
}

proptest! {
    #[test]
    fn every_edge_goes_to_a_later_batch(
        (registry, n) in acyclic_registry_strategy(12),
        picks in proptest::collection::vec(any::<usize>(), 1..6),
    ) {
        let selected: Vec<PluginId> = picks
            .iter()
            .map(|p| PluginId::new(name(p % n)).unwrap())
            .collect();

        let graph = DependencyGraph::build(&selected, &registry).unwrap();
        let batches = BatchScheduler::new().resolve(&graph).unwrap();

        // Every closure member appears exactly once.
        let flat = batches.flatten();
        let unique: HashSet<&PluginId> = flat.iter().collect();
        prop_assert_eq!(flat.len(), graph.len());
        prop_assert_eq!(unique.len(), graph.len());

        for (before, after) in graph.edges() {
            let b = batches.batch_index_of(before.as_str()).unwrap();
            let a = batches.batch_index_of(after.as_str()).unwrap();
            prop_assert!(b < a, "{} (batch {}) must precede {} (batch {})", before, b, after, a);
        }

        // Maximality: anything outside batch 0 has a predecessor in the
        // batch right before it.
        for (index, batch) in batches.iter().enumerate().skip(1) {
            for id in batch {
                let has_prev = graph
                    .predecessors_of(id.as_str())
                    .iter()
                    .any(|p| batches.batch_index_of(p.as_str()) == Some(index - 1));
                prop_assert!(has_prev, "{} could have been placed earlier", id);
            }
        }

        // Same input, same output.
        let again = BatchScheduler::new().resolve(&graph).unwrap();
        prop_assert_eq!(again, batches);
    }

    #[test]
    fn a_back_edge_always_yields_a_cycle(n in 2usize..10) {
        // Chain p0 <- p1 <- ... <- p(n-1) via depends_on, closed by p0
        // coming after the last plugin.
        let mut builder = RegistryBuilder::new()
            .plugin_with("p0", &[], &[], &[name(n - 1).as_str()]);
        for i in 1..n {
            builder = builder.depends_on(&name(i), &[name(i - 1).as_str()]);
        }
        let registry = builder.build();

        let selected: Vec<PluginId> = (0..n).map(|i| PluginId::new(name(i)).unwrap()).collect();
        let graph = DependencyGraph::build(&selected, &registry).unwrap();
        let err = BatchScheduler::new().resolve(&graph).unwrap_err();

        match err {
            PedigreeError::CyclicDependency { plugin_ids } => prop_assert_eq!(plugin_ids, selected),
            other => prop_assert!(false, "expected a cycle, got {:?}", other),
        }
    }
}
