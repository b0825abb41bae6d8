//! Candidate pair selection.
//!
//! The expensive wave only runs on pairs the cheap wave found
//! suspicious, pairs named by user rules, and pairs sharing a service
//! label. This keeps expensive strategies from exploding to O(N²).

use crate::artifact::types::Artifact;
use crate::config::{CorrelationRule, EngineConfig};
use crate::correlation::types::Signal;
use std::collections::HashSet;

/// Compute the ordered pairs expensive strategies may consider.
pub fn select_candidates(
    signals: &[Signal],
    rules: &[CorrelationRule],
    artifacts: &[Artifact],
    config: &EngineConfig,
) -> HashSet<(String, String)> {
    let mut candidates: HashSet<(String, String)> = HashSet::new();

    for signal in signals {
        if signal.score >= config.thresholds.candidate_min {
            candidates.insert(signal.pair());
        }
    }

    for rule in rules {
        candidates.insert((rule.src.clone(), rule.dst.clone()));
    }

    // A shared service label is suspicion enough, in both directions.
    for (i, a) in artifacts.iter().enumerate() {
        let Some(service) = a.service.as_deref() else {
            continue;
        };
        for b in artifacts.iter().skip(i + 1) {
            if b.service.as_deref() == Some(service) && a.id != b.id {
                candidates.insert((a.id.clone(), b.id.clone()));
                candidates.insert((b.id.clone(), a.id.clone()));
            }
        }
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::types::ArtifactKind;

    #[test]
    fn test_signal_threshold() {
        let config = EngineConfig::default();
        let signals = vec![
            Signal::new("a", "b", "calls", 0.4, "entity"),
            Signal::new("c", "d", "calls", 0.2, "entity"),
        ];

        let candidates = select_candidates(&signals, &[], &[], &config);
        assert!(candidates.contains(&("a".to_string(), "b".to_string())));
        assert!(!candidates.contains(&("c".to_string(), "d".to_string())));
    }

    #[test]
    fn test_rules_force_pairs() {
        let config = EngineConfig::default();
        let rules = vec![CorrelationRule {
            src: "x".to_string(),
            dst: "y".to_string(),
            relationship: "calls".to_string(),
            score: 0.9,
        }];

        let candidates = select_candidates(&[], &rules, &[], &config);
        assert!(candidates.contains(&("x".to_string(), "y".to_string())));
    }

    #[test]
    fn test_shared_service_both_orientations() {
        let config = EngineConfig::default();
        let artifacts = vec![
            Artifact::new("a", ArtifactKind::Api).with_service("user-service"),
            Artifact::new("b", ArtifactKind::Database).with_service("user-service"),
            Artifact::new("c", ArtifactKind::Code).with_service("billing"),
        ];

        let candidates = select_candidates(&[], &[], &artifacts, &config);
        assert!(candidates.contains(&("a".to_string(), "b".to_string())));
        assert!(candidates.contains(&("b".to_string(), "a".to_string())));
        assert!(!candidates.contains(&("a".to_string(), "c".to_string())));
    }

    #[test]
    fn test_empty_inputs() {
        let config = EngineConfig::default();
        assert!(select_candidates(&[], &[], &[], &config).is_empty());
    }
}
