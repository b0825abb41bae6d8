//! Property-based tests for the artifact graph using proptest.
//!
//! These tests verify the structural invariants the query layer
//! depends on:
//!
//! - Edge uniqueness per `(src, dst, type)` and max-confidence merge
//! - Forward/reverse adjacency symmetry
//! - Impact monotonicity in the confidence floor and depth cap
//! - Source exclusion and confidence bounds
//! - Idempotence of propagation

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::artifact::types::ArtifactKind;
    use crate::graph::builder::tests::{edge, node};
    use crate::graph::builder::ArtifactGraph;
    use crate::graph::impact::{propagate, ImpactOptions};
    use crate::graph::types::PathAggregation;

    const EDGE_TYPES: [&str; 3] = ["calls", "uses_table", "provisions"];

    // Strategy for generating small random graphs.
    fn arb_graph() -> impl Strategy<Value = ArtifactGraph> {
        (2usize..8)
            .prop_flat_map(|n| {
                (
                    Just(n),
                    proptest::collection::vec(any::<bool>(), n),
                    proptest::collection::vec(
                        (0..n, 0..n, 0usize..EDGE_TYPES.len(), 0.0f64..=1.0),
                        0..24,
                    ),
                )
            })
            .prop_map(|(n, changed, edges)| {
                let mut graph = ArtifactGraph::new();
                for (i, changed) in changed.iter().enumerate().take(n) {
                    graph.upsert_node(node(&format!("n{}", i), ArtifactKind::Code, *changed));
                }
                for (src, dst, edge_type, confidence) in edges {
                    if src != dst {
                        graph.add_edge(edge(
                            &format!("n{}", src),
                            &format!("n{}", dst),
                            EDGE_TYPES[edge_type],
                            confidence,
                        ));
                    }
                }
                graph
            })
    }

    fn options(min_confidence: f64, max_depth: usize) -> ImpactOptions {
        ImpactOptions {
            max_depth,
            min_confidence,
            aggregation: PathAggregation::Min,
        }
    }

    proptest! {
        /// At most one edge exists per (src, dst, type).
        #[test]
        fn edge_uniqueness(graph in arb_graph()) {
            for n in graph.nodes() {
                let edges = graph.edges_from(&n.id);
                for (i, a) in edges.iter().enumerate() {
                    for b in edges.iter().skip(i + 1) {
                        prop_assert!(
                            !(a.dst == b.dst && a.edge_type == b.edge_type),
                            "duplicate edge {} -> {} ({})",
                            a.src, a.dst, a.edge_type
                        );
                    }
                }
            }
        }

        /// Every forward edge has a mirrored reverse entry with
        /// identical confidence and type.
        #[test]
        fn reverse_symmetry(graph in arb_graph()) {
            let mut forward_count = 0usize;
            for n in graph.nodes() {
                for e in graph.edges_from(&n.id) {
                    forward_count += 1;
                    let mirrored = graph
                        .edges_into(&e.dst)
                        .iter()
                        .find(|m| m.dst == e.src && m.edge_type == e.edge_type);
                    prop_assert!(mirrored.is_some(), "missing mirror for {} -> {}", e.src, e.dst);
                    prop_assert_eq!(mirrored.unwrap().confidence, e.confidence);
                }
            }
            prop_assert_eq!(forward_count, graph.edge_count());
        }

        /// Re-adding an edge keeps the count and takes max confidence.
        #[test]
        fn readd_takes_max_confidence(
            first in 0.0f64..=1.0,
            second in 0.0f64..=1.0,
        ) {
            let mut graph = ArtifactGraph::new();
            graph.upsert_node(node("a", ArtifactKind::Api, false));
            graph.upsert_node(node("b", ArtifactKind::Database, false));
            graph.add_edge(edge("a", "b", "uses_table", first));
            graph.add_edge(edge("a", "b", "uses_table", second));

            prop_assert_eq!(graph.edge_count(), 1);
            prop_assert_eq!(graph.edges_from("a")[0].confidence, first.max(second));
        }

        /// Impact confidences stay in [0, 1] and sources are excluded.
        #[test]
        fn impact_bounds_and_source_exclusion(graph in arb_graph()) {
            let impact = propagate(&graph, &options(0.3, 3));
            for record in impact.values() {
                prop_assert!(record.confidence >= 0.0 && record.confidence <= 1.0);
                prop_assert!(record.depth >= 1 && record.depth <= 3);
            }
            for changed in graph.changed_nodes() {
                prop_assert!(!impact.contains_key(&changed.id));
            }
        }

        /// Raising the confidence floor never increases the impact set.
        #[test]
        fn impact_monotone_in_confidence(graph in arb_graph(), low in 0.0f64..0.5, delta in 0.0f64..0.5) {
            let loose = propagate(&graph, &options(low, 3));
            let strict = propagate(&graph, &options(low + delta, 3));
            prop_assert!(strict.len() <= loose.len());
            for id in strict.keys() {
                prop_assert!(loose.contains_key(id));
            }
        }

        /// Lowering the depth cap never increases the impact set.
        #[test]
        fn impact_monotone_in_depth(graph in arb_graph(), depth in 1usize..4) {
            let shallow = propagate(&graph, &options(0.3, depth));
            let deep = propagate(&graph, &options(0.3, depth + 1));
            prop_assert!(shallow.len() <= deep.len());
            for id in shallow.keys() {
                prop_assert!(deep.contains_key(id));
            }
        }

        /// Propagation is deterministic: re-running yields identical
        /// records.
        #[test]
        fn impact_is_idempotent(graph in arb_graph()) {
            let first = propagate(&graph, &options(0.3, 3));
            let second = propagate(&graph, &options(0.3, 3));
            prop_assert_eq!(first, second);
        }
    }
}
