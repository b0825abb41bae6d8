//! Path explanation between two artifacts.
//!
//! Answers "why does a change here reach there": the first path found
//! by a bounded BFS (shortest in hops), with a formatted line per edge
//! and the aggregated path confidence.

use crate::graph::builder::ArtifactGraph;
use crate::graph::impact::ImpactOptions;
use crate::graph::types::GraphEdge;
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// An explained path between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathExplanation {
    /// Edges from source to destination
    pub edges: Vec<GraphEdge>,
    /// Aggregated confidence along the path
    pub confidence: f64,
    /// One formatted line per edge
    pub lines: Vec<String>,
}

impl PathExplanation {
    /// The multi-line rendering of the path.
    pub fn explanation(&self) -> String {
        self.lines.join("\n")
    }
}

/// Find and format the shortest explainable path from `src` to `dst`.
pub fn explain_path(
    graph: &ArtifactGraph,
    src: &str,
    dst: &str,
    options: &ImpactOptions,
) -> Option<PathExplanation> {
    if !graph.contains_node(src) || !graph.contains_node(dst) {
        return None;
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(String, f64, Vec<GraphEdge>)> = VecDeque::new();
    queue.push_back((src.to_string(), 1.0, Vec::new()));
    visited.insert(src.to_string());

    while let Some((node_id, confidence, path)) = queue.pop_front() {
        if node_id == dst {
            return Some(format_path(graph, path, confidence));
        }
        if path.len() >= options.max_depth {
            continue;
        }

        for edge in graph.edges_from(&node_id) {
            let next_confidence = options.aggregation.combine(confidence, edge.confidence);
            if next_confidence < options.min_confidence {
                continue;
            }
            if !visited.insert(edge.dst.clone()) {
                continue;
            }
            let mut next_path = path.clone();
            next_path.push(edge.clone());
            queue.push_back((edge.dst.clone(), next_confidence, next_path));
        }
    }

    None
}

fn format_path(graph: &ArtifactGraph, edges: Vec<GraphEdge>, confidence: f64) -> PathExplanation {
    let lines = edges
        .iter()
        .map(|edge| {
            format!(
                "{} --{}({}%)--> {}",
                node_label(graph, &edge.src),
                edge.edge_type,
                (edge.confidence * 100.0).round() as u32,
                node_label(graph, &edge.dst),
            )
        })
        .collect();

    PathExplanation {
        edges,
        confidence,
        lines,
    }
}

/// `<kind>:<file>`, with the node id standing in for a missing file.
fn node_label(graph: &ArtifactGraph, id: &str) -> String {
    match graph.node(id) {
        Some(node) => match &node.meta.file {
            Some(file) => format!("{}:{}", node.kind, file),
            None => format!("{}:{}", node.kind, node.id),
        },
        None => id.to_string(),
    }
}
