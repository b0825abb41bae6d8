//! Signal fusion.
//!
//! Buckets signals by `(src, dst, relationship)`, fuses each bucket
//! with noisy-OR, applies the single-strategy confidence penalty,
//! overrides from user-defined rules, and gates the result on the
//! correlation threshold. Bucket order follows first signal
//! appearance, so the output is deterministic.

use crate::config::{CorrelationRule, EngineConfig};
use crate::correlation::types::{Correlation, Evidence, Signal, MAX_EVIDENCE};
use std::collections::{HashMap, HashSet};

/// Fuse signals and user rules into the final correlation list.
///
/// Every published correlation's pair is recorded in `processed_pairs`
/// so later passes skip known pairs.
pub fn fuse(
    signals: Vec<Signal>,
    rules: &[CorrelationRule],
    config: &EngineConfig,
    processed_pairs: &mut HashSet<(String, String)>,
) -> Vec<Correlation> {
    // Insertion-ordered buckets.
    let mut order: Vec<(String, String, String)> = Vec::new();
    let mut buckets: HashMap<(String, String, String), Vec<Signal>> = HashMap::new();
    for signal in signals {
        let key = (
            signal.src.clone(),
            signal.dst.clone(),
            signal.relationship.clone(),
        );
        let bucket = buckets.entry(key.clone()).or_default();
        if bucket.is_empty() {
            order.push(key);
        }
        bucket.push(signal);
    }

    let mut correlations = Vec::new();
    let mut matched_rules: HashSet<usize> = HashSet::new();

    for key in order {
        let bucket = buckets.remove(&key).unwrap_or_default();
        let (src, dst, relationship) = key;

        // Noisy-OR rewards independent confirmations while staying in
        // [0, 1].
        let final_score = 1.0 - bucket.iter().fold(1.0, |acc, s| acc * (1.0 - s.score));

        let mut strategies: Vec<String> = Vec::new();
        for signal in &bucket {
            if !strategies.contains(&signal.strategy) {
                strategies.push(signal.strategy.clone());
            }
        }

        let max_score = bucket.iter().fold(0.0f64, |acc, s| acc.max(s.score));
        let confidence = if strategies.len() >= 2 {
            final_score
        } else {
            max_score * config.thresholds.single_strategy_penalty
        };

        let evidence = collect_evidence(&bucket);

        let mut correlation = Correlation {
            src,
            dst,
            relationship,
            final_score,
            confidence,
            strategies,
            evidence,
            user_defined: false,
        };

        // A rule naming this triple dominates the fused score.
        if let Some((index, rule)) = find_rule(rules, &correlation) {
            correlation.final_score = rule.score.clamp(0.0, 1.0);
            correlation.confidence = correlation.final_score;
            correlation.user_defined = true;
            matched_rules.insert(index);
        }

        if correlation.user_defined
            || correlation.final_score >= config.thresholds.correlate_min
        {
            processed_pairs.insert((correlation.src.clone(), correlation.dst.clone()));
            correlations.push(correlation);
        }
    }

    // Rules with no backing signals still assert a correlation.
    for (index, rule) in rules.iter().enumerate() {
        if matched_rules.contains(&index) {
            continue;
        }
        let score = rule.score.clamp(0.0, 1.0);
        processed_pairs.insert((rule.src.clone(), rule.dst.clone()));
        correlations.push(Correlation {
            src: rule.src.clone(),
            dst: rule.dst.clone(),
            relationship: rule.relationship.clone(),
            final_score: score,
            confidence: score,
            strategies: vec!["user".to_string()],
            evidence: vec![Evidence::new("user-defined rule")],
            user_defined: true,
        });
    }

    correlations
}

/// Concatenated evidence capped at [`MAX_EVIDENCE`], preferring
/// higher-scored signals; ties stabilize on (strategy, index).
fn collect_evidence(bucket: &[Signal]) -> Vec<Evidence> {
    let mut ranked: Vec<(usize, &Signal)> = bucket.iter().enumerate().collect();
    ranked.sort_by(|(ai, a), (bi, b)| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.strategy.cmp(&b.strategy))
            .then_with(|| ai.cmp(bi))
    });

    let mut evidence = Vec::new();
    for (_, signal) in ranked {
        for item in &signal.evidence {
            if evidence.len() >= MAX_EVIDENCE {
                return evidence;
            }
            evidence.push(item.clone());
        }
    }
    evidence
}

fn find_rule<'a>(
    rules: &'a [CorrelationRule],
    correlation: &Correlation,
) -> Option<(usize, &'a CorrelationRule)> {
    rules.iter().enumerate().find(|(_, rule)| {
        rule.src == correlation.src
            && rule.dst == correlation.dst
            && rule.relationship == correlation.relationship
    })
}
