//! Impact propagation over the artifact graph.
//!
//! Breadth-first expansion from each changed node, layered by depth.
//! A node keeps the best (highest-confidence) record across all
//! sources; changed nodes are sources, not impacted, and are removed
//! from the result after traversal.

use crate::config::EngineConfig;
use crate::graph::builder::ArtifactGraph;
use crate::graph::types::{GraphEdge, ImpactRecord, PathAggregation};
use std::collections::{HashMap, HashSet, VecDeque};

/// Options governing a propagation run.
#[derive(Debug, Clone, PartialEq)]
pub struct ImpactOptions {
    /// Maximum hops from a source
    pub max_depth: usize,
    /// Minimum path confidence for an expansion step
    pub min_confidence: f64,
    /// How edge confidences combine along a path
    pub aggregation: PathAggregation,
}

impl ImpactOptions {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_depth: config.graph.max_depth,
            min_confidence: config.thresholds.correlate_min,
            aggregation: config.graph.path_aggregation,
        }
    }

    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ImpactOptions {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Compute the impact map: best record per reachable non-changed node.
pub fn propagate(graph: &ArtifactGraph, options: &ImpactOptions) -> HashMap<String, ImpactRecord> {
    let mut impact: HashMap<String, ImpactRecord> = HashMap::new();
    let changed: Vec<String> = graph.changed_nodes().iter().map(|n| n.id.clone()).collect();

    for source in &changed {
        propagate_from(graph, source, options, &mut impact);
    }

    // Sources are never impacted.
    for source in &changed {
        impact.remove(source);
    }

    impact
}

fn propagate_from(
    graph: &ArtifactGraph,
    source: &str,
    options: &ImpactOptions,
    impact: &mut HashMap<String, ImpactRecord>,
) {
    // (node, depth) visited pairs: suppresses cycles while still
    // letting different-depth paths reach the same node.
    let mut visited: HashSet<(String, usize)> = HashSet::new();
    let mut queue: VecDeque<(String, f64, Vec<GraphEdge>, usize)> = VecDeque::new();
    queue.push_back((source.to_string(), 1.0, Vec::new(), 0));
    visited.insert((source.to_string(), 0));

    while let Some((node_id, confidence, path, depth)) = queue.pop_front() {
        if depth >= options.max_depth {
            continue;
        }

        for edge in graph.edges_from(&node_id) {
            let next_confidence = options.aggregation.combine(confidence, edge.confidence);
            if next_confidence < options.min_confidence {
                continue;
            }

            let next_depth = depth + 1;
            if !visited.insert((edge.dst.clone(), next_depth)) {
                continue;
            }

            let mut next_path = path.clone();
            next_path.push(edge.clone());

            let record = ImpactRecord {
                node_id: edge.dst.clone(),
                confidence: next_confidence,
                path: next_path.clone(),
                depth: next_depth,
                source: source.to_string(),
            };
            match impact.get(&edge.dst) {
                // Only a strictly better path replaces a record.
                Some(existing) if existing.confidence >= next_confidence => {}
                _ => {
                    impact.insert(edge.dst.clone(), record);
                }
            }

            queue.push_back((edge.dst.clone(), next_confidence, next_path, next_depth));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::types::ArtifactKind;
    use crate::graph::builder::tests::{edge, node};

    /// api:GET:/users -> db:table:users(changed) -> config:db.json
    fn chain_graph() -> ArtifactGraph {
        let mut graph = ArtifactGraph::new();
        graph.upsert_node(node("api:GET:/users", ArtifactKind::Api, false));
        graph.upsert_node(node("db:table:users", ArtifactKind::Database, true));
        graph.upsert_node(node("config:db.json", ArtifactKind::Configuration, false));
        graph.add_edge(edge("api:GET:/users", "db:table:users", "uses_table", 0.9));
        graph.add_edge(edge("db:table:users", "config:db.json", "configured_by", 0.8));
        graph
    }

    #[test]
    fn test_bottleneck_propagation() {
        let graph = chain_graph();
        let options = ImpactOptions::default().with_min_confidence(0.5);

        let impact = propagate(&graph, &options);
        assert_eq!(impact.len(), 1);

        let record = &impact["config:db.json"];
        assert_eq!(record.confidence, 0.8);
        assert_eq!(record.depth, 1);
        assert_eq!(record.source, "db:table:users");
        assert_eq!(record.path.len(), 1);
    }

    #[test]
    fn test_min_confidence_gates_expansion() {
        let graph = chain_graph();
        let options = ImpactOptions::default().with_min_confidence(0.85);
        let impact = propagate(&graph, &options);
        assert!(!impact.contains_key("config:db.json"));
    }

    #[test]
    fn test_depth_limit() {
        let mut graph = chain_graph();
        graph.upsert_node(node("iac:rds:db-instance", ArtifactKind::Infrastructure, false));
        graph.add_edge(edge("config:db.json", "iac:rds:db-instance", "provisions", 0.7));

        let shallow = propagate(&graph, &ImpactOptions::default().with_min_confidence(0.5).with_max_depth(1));
        assert!(!shallow.contains_key("iac:rds:db-instance"));

        let deeper = propagate(&graph, &ImpactOptions::default().with_min_confidence(0.5).with_max_depth(2));
        assert_eq!(deeper["iac:rds:db-instance"].depth, 2);
    }

    #[test]
    fn test_sources_excluded() {
        let graph = chain_graph();
        let impact = propagate(&graph, &ImpactOptions::default().with_min_confidence(0.5));
        assert!(!impact.contains_key("db:table:users"));
    }

    #[test]
    fn test_product_aggregation_decays() {
        let mut graph = chain_graph();
        graph.upsert_node(node("iac:rds:db-instance", ArtifactKind::Infrastructure, false));
        graph.add_edge(edge("config:db.json", "iac:rds:db-instance", "provisions", 0.7));

        let options = ImpactOptions {
            max_depth: 3,
            min_confidence: 0.5,
            aggregation: PathAggregation::Product,
        };
        let impact = propagate(&graph, &options);
        let record = &impact["iac:rds:db-instance"];
        assert!((record.confidence - 0.56).abs() < 1e-9);
    }

    #[test]
    fn test_best_record_kept_across_paths() {
        let mut graph = ArtifactGraph::new();
        graph.upsert_node(node("a", ArtifactKind::Api, true));
        graph.upsert_node(node("b", ArtifactKind::Database, false));
        graph.upsert_node(node("c", ArtifactKind::Configuration, false));
        // Direct weak path and indirect strong path to c.
        graph.add_edge(edge("a", "c", "calls", 0.6));
        graph.add_edge(edge("a", "b", "uses_table", 0.95));
        graph.add_edge(edge("b", "c", "configured_by", 0.9));

        let impact = propagate(&graph, &ImpactOptions::default().with_min_confidence(0.5));
        let record = &impact["c"];
        assert_eq!(record.confidence, 0.9);
        assert_eq!(record.depth, 2);
    }

    #[test]
    fn test_cycle_terminates() {
        let mut graph = ArtifactGraph::new();
        graph.upsert_node(node("a", ArtifactKind::Api, true));
        graph.upsert_node(node("b", ArtifactKind::Database, false));
        graph.add_edge(edge("a", "b", "uses_table", 0.9));
        graph.add_edge(edge("b", "a", "configured_by", 0.9));

        let impact = propagate(&graph, &ImpactOptions::default().with_min_confidence(0.5));
        assert_eq!(impact.len(), 1);
        assert!(impact.contains_key("b"));
    }

    #[test]
    fn test_no_changed_nodes_means_no_impact() {
        let mut graph = ArtifactGraph::new();
        graph.upsert_node(node("a", ArtifactKind::Api, false));
        graph.upsert_node(node("b", ArtifactKind::Database, false));
        graph.add_edge(edge("a", "b", "uses_table", 0.9));

        assert!(propagate(&graph, &ImpactOptions::default()).is_empty());
    }

    #[test]
    fn test_rerun_is_identical() {
        let graph = chain_graph();
        let options = ImpactOptions::default().with_min_confidence(0.5);
        let first = propagate(&graph, &options);
        let second = propagate(&graph, &options);
        assert_eq!(first, second);
    }
}
