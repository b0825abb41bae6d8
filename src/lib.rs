//! # driftlens-core
//!
//! Cross-layer drift correlation and impact analysis engine.
//!
//! The engine consumes drift results from per-format analyzers and a
//! pull request's changed-file list, and produces a correlation report:
//! weighted relationships between artifacts, an artifact graph, impact
//! propagation from the changed nodes, greedy root-cause attribution,
//! and blast-radius metrics.
//!
//! ## Core Components
//!
//! - **Artifact**: expansion of drift results into atomic artifacts
//!   with extracted metadata
//! - **Strategy**: the two-wave roster of correlation strategies
//! - **Correlation**: candidate selection and noisy-OR signal fusion
//! - **Graph**: the artifact graph and its query layer
//! - **Engine**: the pipeline driver and published report
//!
//! ## Example
//!
//! ```rust,ignore
//! use driftlens_core::{CorrelationEngine, DriftResult, EngineConfig};
//!
//! let engine = CorrelationEngine::new(EngineConfig::default());
//! let report = engine.analyze(&drift_results, &changed_files).await?;
//!
//! for cause in &report.root_causes.unwrap().causes {
//!     println!("root cause: {} ({})", cause.node_id, cause.coverage_score);
//! }
//! ```

pub mod artifact;
pub mod config;
pub mod correlation;
pub mod engine;
pub mod error;
pub mod graph;
pub mod strategy;

// Re-exports for convenience
pub use artifact::{
    entities_match, Artifact, ArtifactExpander, ArtifactKind, ArtifactMetadata, ChangedFile,
    DriftResult, Operation, Severity, TableRef,
};
pub use config::{CorrelationRule, EngineConfig, GraphConfig, StrategySettings, Thresholds};
pub use correlation::{fuse, select_candidates, Correlation, Evidence, Signal, MAX_EVIDENCE};
pub use engine::{CorrelationEngine, CorrelationReport, RunId};
pub use error::{Error, Result};
pub use graph::{
    blast_radius, build_graph, explain_path, propagate, root_causes, ArtifactGraph, ArtifactNode,
    BlastRadius, GraphEdge, GraphMetrics, ImpactOptions, ImpactRecord, NodeMeta, PathAggregation,
    PathExplanation, RootCause, RootCauseAnalysis,
};
pub use strategy::{
    build_roster, CancelFlag, CodeStrategy, CorrelationStrategy, DependencyStrategy,
    EntityStrategy, InfrastructureStrategy, OperationStrategy, StrategyBudget, StrategyContext,
    StrategyRunner, StrategyStats, TemporalStrategy,
};
