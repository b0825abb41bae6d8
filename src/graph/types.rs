//! Artifact graph types.

use crate::artifact::types::{ArtifactKind, ArtifactMetadata, Severity};
use crate::correlation::types::Evidence;
use serde::{Deserialize, Serialize};

/// How edge confidences combine along a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PathAggregation {
    /// Bottleneck: path confidence is the minimum edge confidence
    #[default]
    Min,
    /// Multiplicative decay
    Product,
}

impl PathAggregation {
    /// Fold the next edge confidence into a path confidence.
    pub fn combine(&self, path_confidence: f64, edge_confidence: f64) -> f64 {
        match self {
            Self::Min => path_confidence.min(edge_confidence),
            Self::Product => path_confidence * edge_confidence,
        }
    }
}

/// Node metadata carried into the graph from the source artifact.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub severity: Severity,
    pub metadata: ArtifactMetadata,
}

/// A node in the artifact graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactNode {
    pub id: String,
    pub kind: ArtifactKind,
    pub meta: NodeMeta,
    pub changed: bool,
}

/// A directed confidence edge.
///
/// At most one edge exists per `(src, dst, edge_type)`; the builder
/// merges duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub src: String,
    pub dst: String,
    /// Relationship tag
    #[serde(rename = "type")]
    pub edge_type: String,
    /// Belief in the relationship, in [0, 1]
    pub confidence: f64,
    /// Strategy names that produced the winning contribution
    pub provenance: String,
    pub evidence: Vec<Evidence>,
}

impl GraphEdge {
    /// The mirrored record stored in the reverse adjacency.
    pub fn reversed(&self) -> Self {
        Self {
            src: self.dst.clone(),
            dst: self.src.clone(),
            edge_type: self.edge_type.clone(),
            confidence: self.confidence,
            provenance: self.provenance.clone(),
            evidence: self.evidence.clone(),
        }
    }
}

/// Best known impact on a node reachable from a changed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub node_id: String,
    /// Aggregated path confidence
    pub confidence: f64,
    /// Edges along the best path, source first
    pub path: Vec<GraphEdge>,
    /// Hops from the source
    pub depth: usize,
    /// The changed node this impact originates from
    pub source: String,
}

/// Per-artifact graph metrics published with the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMetrics {
    pub confidence: f64,
    pub depth: usize,
    pub is_root_cause: bool,
}
