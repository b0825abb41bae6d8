//! The correlation engine: pipeline driver and published report.
//!
//! Dataflow: drift results + file list → expanded artifacts → cheap
//! wave signals → candidate pairs → expensive wave signals → fused
//! correlations → artifact graph → impact, root causes, blast radius →
//! enriched artifacts.
//!
//! The engine fails open: apart from cancellation, every internal
//! problem degrades to reduced analysis with a logged warning, and the
//! fused correlations are always published.

use crate::artifact::expand::ArtifactExpander;
use crate::artifact::types::{Artifact, ChangedFile, DriftResult};
use crate::config::EngineConfig;
use crate::correlation::aggregate::fuse;
use crate::correlation::candidates::select_candidates;
use crate::correlation::types::{Correlation, Signal};
use crate::error::Result;
use crate::graph::blast::{blast_radius, BlastRadius};
use crate::graph::builder::{build_graph, ArtifactGraph};
use crate::graph::causes::{root_causes, RootCauseAnalysis};
use crate::graph::impact::{propagate, ImpactOptions};
use crate::graph::types::{GraphMetrics, ImpactRecord};
use crate::strategy::{CancelFlag, StrategyContext, StrategyRunner, StrategyStats};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, instrument};
use uuid::Uuid;

/// Unique identifier for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The published result of an analysis run.
///
/// Correlations are always present; the graph and everything derived
/// from it are absent when graph analysis was disabled or suppressed
/// by the safety limits.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    /// Expanded artifacts, enriched with impact paths and graph metrics
    pub artifacts: Vec<Artifact>,
    pub correlations: Vec<Correlation>,
    #[serde(skip)]
    pub graph: Option<ArtifactGraph>,
    /// Best impact record per reachable non-changed node
    pub impact: HashMap<String, ImpactRecord>,
    pub root_causes: Option<RootCauseAnalysis>,
    pub blast_radius: Option<BlastRadius>,
    /// Per-strategy timing and signal counts
    pub strategy_stats: Vec<StrategyStats>,
}

impl CorrelationReport {
    /// Whether graph-dependent analysis ran.
    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }
}

/// The correlation & impact engine.
pub struct CorrelationEngine {
    config: EngineConfig,
}

impl CorrelationEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(EngineConfig::default())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Analyze a change set. Never fails except on cancellation.
    #[instrument(skip_all, fields(results = drift_results.len(), files = files.len()))]
    pub async fn analyze(
        &self,
        drift_results: &[DriftResult],
        files: &[ChangedFile],
    ) -> Result<CorrelationReport> {
        self.analyze_with_cancel(drift_results, files, &CancelFlag::new())
            .await
    }

    /// Analyze with a cooperative cancellation flag; cancellation
    /// aborts between strategy invocations and discards partial state.
    pub async fn analyze_with_cancel(
        &self,
        drift_results: &[DriftResult],
        files: &[ChangedFile],
        cancel: &CancelFlag,
    ) -> Result<CorrelationReport> {
        let mut artifacts = ArtifactExpander::new().expand(drift_results);
        info!("Expanded {} drift results into {} artifacts", drift_results.len(), artifacts.len());

        let runner = StrategyRunner::from_config(&self.config);
        let mut processed_pairs: HashSet<(String, String)> = HashSet::new();
        let mut stats: Vec<StrategyStats> = Vec::new();

        let preliminary = {
            let ctx = StrategyContext {
                artifacts: &artifacts,
                files,
                config: &self.config,
                processed_pairs: &processed_pairs,
                candidate_pairs: None,
            };
            runner.run_low_wave(&ctx, cancel, &mut stats).await?
        };

        let candidates = select_candidates(
            &preliminary,
            &self.config.correlation_rules,
            &artifacts,
            &self.config,
        );
        info!(
            "Cheap wave produced {} signals, {} candidate pairs",
            preliminary.len(),
            candidates.len()
        );

        let expensive = {
            let ctx = StrategyContext {
                artifacts: &artifacts,
                files,
                config: &self.config,
                processed_pairs: &processed_pairs,
                candidate_pairs: Some(&candidates),
            };
            runner.run_expensive_wave(&ctx, cancel, &mut stats).await?
        };

        let mut signals: Vec<Signal> = preliminary;
        signals.extend(expensive);

        let correlations = fuse(
            signals,
            &self.config.correlation_rules,
            &self.config,
            &mut processed_pairs,
        );
        info!("Fused {} correlations", correlations.len());

        let mut graph: Option<ArtifactGraph> = None;
        let mut impact: HashMap<String, ImpactRecord> = HashMap::new();
        let mut causes: Option<RootCauseAnalysis> = None;
        let mut radius: Option<BlastRadius> = None;

        if self.config.graph.enabled {
            graph = build_graph(&artifacts, &correlations, &self.config.graph);
            if let Some(g) = &graph {
                let options = ImpactOptions::from_config(&self.config);
                impact = propagate(g, &options);
                let analysis = root_causes(g, &impact, options.min_confidence);
                radius = Some(blast_radius(g, &impact));
                enrich_artifacts(&mut artifacts, &impact, &analysis);
                causes = Some(analysis);
                info!("Impact reaches {} artifacts", impact.len());
            }
        }

        Ok(CorrelationReport {
            run_id: RunId::new(),
            generated_at: Utc::now(),
            artifacts,
            correlations,
            graph,
            impact,
            root_causes: causes,
            blast_radius: radius,
            strategy_stats: stats,
        })
    }
}

/// Attach impact paths and graph metrics to the artifacts named by the
/// impact map, and mark root causes on their changed artifacts.
fn enrich_artifacts(
    artifacts: &mut [Artifact],
    impact: &HashMap<String, ImpactRecord>,
    causes: &RootCauseAnalysis,
) {
    let cause_ids: HashSet<&str> = causes.causes.iter().map(|c| c.node_id.as_str()).collect();

    for artifact in artifacts {
        if let Some(record) = impact.get(&artifact.id) {
            artifact.impact_path = Some(record.path.clone());
            artifact.graph_metrics = Some(GraphMetrics {
                confidence: record.confidence,
                depth: record.depth,
                is_root_cause: false,
            });
        } else if cause_ids.contains(artifact.id.as_str()) {
            artifact.graph_metrics = Some(GraphMetrics {
                confidence: 1.0,
                depth: 0,
                is_root_cause: true,
            });
        }
    }
}
