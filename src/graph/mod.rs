//! Artifact graph: construction and query layer.
//!
//! The graph materializes fused correlations into nodes and directed
//! confidence edges, then answers impact propagation, root-cause
//! cover, blast-radius, and path-explanation queries.

pub mod blast;
pub mod builder;
pub mod causes;
pub mod impact;
pub mod paths;
mod proptest;
pub mod types;

pub use blast::{blast_radius, BlastRadius};
pub use builder::{build_graph, ArtifactGraph};
pub use causes::{root_causes, RootCause, RootCauseAnalysis};
pub use impact::{propagate, ImpactOptions};
pub use paths::{explain_path, PathExplanation};
pub use types::{
    ArtifactNode, GraphEdge, GraphMetrics, ImpactRecord, NodeMeta, PathAggregation,
};
