//! Property-based tests for signal fusion using proptest.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use std::collections::HashSet;

    use crate::config::EngineConfig;
    use crate::correlation::aggregate::fuse;
    use crate::correlation::types::{Signal, MAX_EVIDENCE};

    const STRATEGIES: [&str; 4] = ["entity", "operation", "infrastructure", "code"];

    // Strategy for generating a bucket of signals over a few pairs.
    fn arb_signals() -> impl Strategy<Value = Vec<Signal>> {
        proptest::collection::vec(
            (0usize..3, 0usize..STRATEGIES.len(), 0.0f64..=1.0),
            0..12,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(pair, strategy, score)| {
                    Signal::new(
                        format!("src{}", pair),
                        format!("dst{}", pair),
                        "uses_table",
                        score,
                        STRATEGIES[strategy],
                    )
                })
                .collect()
        })
    }

    proptest! {
        /// Every fused score and confidence stays in [0, 1].
        #[test]
        fn fused_scores_bounded(signals in arb_signals()) {
            let config = EngineConfig::default();
            let correlations = fuse(signals, &[], &config, &mut HashSet::new());
            for c in &correlations {
                prop_assert!(c.final_score >= 0.0 && c.final_score <= 1.0);
                prop_assert!(c.confidence >= 0.0 && c.confidence <= 1.0);
                prop_assert!(c.evidence.len() <= MAX_EVIDENCE);
            }
        }

        /// Published correlations clear the threshold gate.
        #[test]
        fn fused_scores_clear_threshold(signals in arb_signals()) {
            let config = EngineConfig::default();
            let correlations = fuse(signals, &[], &config, &mut HashSet::new());
            for c in &correlations {
                prop_assert!(c.user_defined || c.final_score >= config.thresholds.correlate_min);
            }
        }

        /// Noisy-OR fusion is commutative: signal order never affects
        /// the fused scores.
        #[test]
        fn fusion_commutes(signals in arb_signals()) {
            let config = EngineConfig::default();
            let forward = fuse(signals.clone(), &[], &config, &mut HashSet::new());

            let mut reversed_signals = signals;
            reversed_signals.reverse();
            let reversed = fuse(reversed_signals, &[], &config, &mut HashSet::new());

            prop_assert_eq!(forward.len(), reversed.len());
            for c in &forward {
                let other = reversed
                    .iter()
                    .find(|o| o.src == c.src && o.dst == c.dst && o.relationship == c.relationship);
                prop_assert!(other.is_some());
                prop_assert!((other.unwrap().final_score - c.final_score).abs() < 1e-12);
            }
        }
    }
}
