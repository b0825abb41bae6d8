//! Root-cause attribution via greedy weighted set cover.
//!
//! Picks the smallest set of changed nodes that explains the impact
//! set, greedily choosing the node covering the most not-yet-covered
//! targets. Ties break by node insertion order.

use crate::artifact::types::ArtifactKind;
use crate::graph::builder::ArtifactGraph;
use crate::graph::types::ImpactRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A changed node selected as explaining part of the impact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCause {
    pub node_id: String,
    pub kind: ArtifactKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Targets newly covered by this cause, in node insertion order
    pub covered_targets: Vec<String>,
    /// Share of all targets this cause newly covered
    pub coverage_score: f64,
}

/// Result of the greedy cover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    pub causes: Vec<RootCause>,
    /// Share of targets covered by all causes together
    pub coverage: f64,
}

/// Attribute the impact set to a minimal set of changed nodes.
pub fn root_causes(
    graph: &ArtifactGraph,
    impact: &HashMap<String, ImpactRecord>,
    min_confidence: f64,
) -> RootCauseAnalysis {
    // Targets in node insertion order, for reproducible output.
    let targets: Vec<&ImpactRecord> = graph
        .nodes()
        .filter_map(|n| impact.get(&n.id))
        .filter(|r| r.confidence >= min_confidence)
        .collect();

    if targets.is_empty() {
        return RootCauseAnalysis {
            causes: Vec::new(),
            coverage: 0.0,
        };
    }

    let mut explained: HashMap<&str, Vec<&str>> = HashMap::new();
    for record in &targets {
        explained
            .entry(record.source.as_str())
            .or_default()
            .push(record.node_id.as_str());
    }

    let mut candidates: Vec<&str> = graph
        .changed_nodes()
        .iter()
        .map(|n| n.id.as_str())
        .filter(|id| explained.contains_key(id))
        .collect();

    let total = targets.len();
    let mut covered: HashSet<String> = HashSet::new();
    let mut causes = Vec::new();

    while covered.len() < total && !candidates.is_empty() {
        // Greedy pick: most new coverage, first-in-order on ties.
        let mut best: Option<(usize, usize)> = None;
        for (i, candidate) in candidates.iter().enumerate() {
            let gain = explained[candidate]
                .iter()
                .filter(|t| !covered.contains(**t))
                .count();
            if gain > 0 && best.map_or(true, |(_, best_gain)| gain > best_gain) {
                best = Some((i, gain));
            }
        }

        let Some((index, gain)) = best else {
            break;
        };
        let candidate = candidates.remove(index);
        let new_targets: Vec<String> = explained[candidate]
            .iter()
            .filter(|t| !covered.contains(**t))
            .map(|t| t.to_string())
            .collect();
        covered.extend(new_targets.iter().cloned());

        let node = graph.node(candidate);
        causes.push(RootCause {
            node_id: candidate.to_string(),
            kind: node.map_or(ArtifactKind::Unknown, |n| n.kind),
            file: node.and_then(|n| n.meta.file.clone()),
            covered_targets: new_targets,
            coverage_score: gain as f64 / total as f64,
        });
    }

    RootCauseAnalysis {
        coverage: covered.len() as f64 / total as f64,
        causes,
    }
}
