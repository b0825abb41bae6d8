//! Blast-radius metrics over the impact set.

use crate::artifact::types::ArtifactKind;
use crate::graph::builder::ArtifactGraph;
use crate::graph::types::ImpactRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Aggregated reach of the change set: impacted non-changed nodes,
/// tallied by kind, service, and severity, with an overall risk score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlastRadius {
    pub total: usize,
    pub by_kind: HashMap<String, usize>,
    pub by_service: HashMap<String, usize>,
    pub by_severity: HashMap<String, usize>,
    /// In [0, 1]; weighs kind diversity and api/database/iac reach
    pub risk_score: f64,
}

/// Tally the blast radius from an impact map.
pub fn blast_radius(
    graph: &ArtifactGraph,
    impact: &HashMap<String, ImpactRecord>,
) -> BlastRadius {
    let mut radius = BlastRadius::default();
    let mut kinds: HashSet<ArtifactKind> = HashSet::new();
    let mut critical_reach = 0usize;

    for node in graph.nodes() {
        if node.changed || !impact.contains_key(&node.id) {
            continue;
        }

        radius.total += 1;
        kinds.insert(node.kind);
        *radius.by_kind.entry(node.kind.to_string()).or_default() += 1;
        if let Some(service) = &node.meta.service {
            *radius.by_service.entry(service.clone()).or_default() += 1;
        }
        *radius
            .by_severity
            .entry(node.meta.severity.to_string())
            .or_default() += 1;

        if matches!(
            node.kind,
            ArtifactKind::Api | ArtifactKind::Database | ArtifactKind::Infrastructure
        ) {
            critical_reach += 1;
        }
    }

    radius.risk_score = (0.2 * kinds.len() as f64 + 0.3 * critical_reach as f64).min(1.0);
    radius
}
