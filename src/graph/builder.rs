//! Artifact graph construction.
//!
//! The graph keys edges on `(src, dst, type)` and keeps forward and
//! reverse adjacency mirrored at all times. Adjacency lists preserve
//! insertion order, which downstream traversals rely on for
//! reproducible output.

use crate::artifact::types::Artifact;
use crate::config::GraphConfig;
use crate::correlation::types::{Correlation, MAX_EVIDENCE};
use crate::graph::types::{ArtifactNode, GraphEdge, NodeMeta};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Directed multigraph of artifacts keyed on relationship type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactGraph {
    nodes: HashMap<String, ArtifactNode>,
    node_order: Vec<String>,
    adjacency: HashMap<String, Vec<GraphEdge>>,
    reverse: HashMap<String, Vec<GraphEdge>>,
    edge_count: usize,
}

impl ArtifactGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or merge meta non-destructively into an existing
    /// one (the first insertion wins on populated fields).
    pub fn upsert_node(&mut self, node: ArtifactNode) {
        match self.nodes.get_mut(&node.id) {
            Some(existing) => {
                existing.changed |= node.changed;
                if existing.meta.file.is_none() {
                    existing.meta.file = node.meta.file;
                }
                if existing.meta.service.is_none() {
                    existing.meta.service = node.meta.service;
                }
                existing.meta.severity = existing.meta.severity.max(node.meta.severity);
                existing.meta.metadata.merge(&node.meta.metadata);
            }
            None => {
                self.node_order.push(node.id.clone());
                self.nodes.insert(node.id.clone(), node);
            }
        }
    }

    /// Insert an edge, de-duplicating by `(src, dst, type)`.
    ///
    /// On collision the merged edge takes the maximum confidence, the
    /// union of evidence (capped), and the provenance of the
    /// higher-confidence contribution; both are chosen before any
    /// mutation. Returns whether a new edge was created.
    pub fn add_edge(&mut self, edge: GraphEdge) -> bool {
        if !self.nodes.contains_key(&edge.src) || !self.nodes.contains_key(&edge.dst) {
            debug!(
                "Dropping edge {} -> {} ({}): unknown endpoint",
                edge.src, edge.dst, edge.edge_type
            );
            return false;
        }

        let forward = self.adjacency.entry(edge.src.clone()).or_default();
        if let Some(existing) = forward
            .iter_mut()
            .find(|e| e.dst == edge.dst && e.edge_type == edge.edge_type)
        {
            // Choose confidence and provenance first, then mutate.
            let new_confidence = existing.confidence.max(edge.confidence);
            let new_provenance = if edge.confidence > existing.confidence {
                edge.provenance.clone()
            } else {
                existing.provenance.clone()
            };

            existing.confidence = new_confidence;
            existing.provenance = new_provenance;
            for item in &edge.evidence {
                if existing.evidence.len() >= MAX_EVIDENCE {
                    break;
                }
                if !existing.evidence.contains(item) {
                    existing.evidence.push(item.clone());
                }
            }

            let merged = existing.clone();
            self.mirror_update(&merged);
            return false;
        }

        let mut edge = edge;
        edge.evidence.truncate(MAX_EVIDENCE);
        forward.push(edge.clone());
        self.reverse
            .entry(edge.dst.clone())
            .or_default()
            .push(edge.reversed());
        self.edge_count += 1;
        true
    }

    /// Re-mirror a merged forward edge into the reverse adjacency.
    fn mirror_update(&mut self, edge: &GraphEdge) {
        if let Some(entries) = self.reverse.get_mut(&edge.dst) {
            if let Some(mirrored) = entries
                .iter_mut()
                .find(|e| e.dst == edge.src && e.edge_type == edge.edge_type)
            {
                *mirrored = edge.reversed();
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn node(&self, id: &str) -> Option<&ArtifactNode> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &ArtifactNode> {
        self.node_order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Changed nodes in insertion order.
    pub fn changed_nodes(&self) -> Vec<&ArtifactNode> {
        self.nodes().filter(|n| n.changed).collect()
    }

    /// Outgoing edges in insertion order.
    pub fn edges_from(&self, id: &str) -> &[GraphEdge] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Mirrored incoming edges in insertion order.
    pub fn edges_into(&self, id: &str) -> &[GraphEdge] {
        self.reverse.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All forward edges, grouped by source node in insertion order.
    pub fn edges(&self) -> Vec<&GraphEdge> {
        self.node_order
            .iter()
            .flat_map(|id| self.edges_from(id))
            .collect()
    }
}

/// Materialize artifacts and correlations into a graph.
///
/// Returns `None` when the result breaches the configured node or edge
/// limits; the caller then skips graph-dependent analysis while still
/// publishing the correlations.
pub fn build_graph(
    artifacts: &[Artifact],
    correlations: &[Correlation],
    config: &GraphConfig,
) -> Option<ArtifactGraph> {
    let mut graph = ArtifactGraph::new();

    for artifact in artifacts {
        graph.upsert_node(ArtifactNode {
            id: artifact.id.clone(),
            kind: artifact.kind,
            meta: NodeMeta {
                file: artifact.file.clone(),
                service: artifact.service.clone(),
                severity: artifact.severity,
                metadata: artifact.metadata.clone(),
            },
            changed: artifact.changed,
        });
    }

    for correlation in correlations {
        let provenance = if correlation.user_defined {
            "user".to_string()
        } else {
            correlation.strategies.join("+")
        };
        graph.add_edge(GraphEdge {
            src: correlation.src.clone(),
            dst: correlation.dst.clone(),
            edge_type: correlation.relationship.clone(),
            confidence: correlation.confidence,
            provenance,
            evidence: correlation.evidence.clone(),
        });
    }

    if graph.node_count() > config.node_limit || graph.edge_count() > config.edge_limit {
        warn!(
            "Graph limits breached ({} nodes / {} edges), skipping graph analysis",
            graph.node_count(),
            graph.edge_count()
        );
        return None;
    }

    Some(graph)
}
