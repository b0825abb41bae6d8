//! Temporal co-change strategy.

use crate::config::EngineConfig;
use crate::correlation::types::{Evidence, Signal};
use crate::error::Result;
use crate::strategy::{configured_budget, CorrelationStrategy, StrategyBudget, StrategyContext};
use async_trait::async_trait;
use serde_json::Value;

/// Signals based on co-change frequency: files that historically change
/// together probably depend on each other.
///
/// Disabled by default. The commit history arrives through the strategy
/// options as `history`: an array of per-commit file lists. Without a
/// history the strategy produces nothing.
pub struct TemporalStrategy {
    budget: StrategyBudget,
    history: Vec<Vec<String>>,
    min_co_changes: usize,
}

impl TemporalStrategy {
    pub fn from_config(config: &EngineConfig) -> Self {
        let settings = config.strategy_settings("temporal");

        let history = settings
            .and_then(|s| s.options.get("history"))
            .and_then(Value::as_array)
            .map(|commits| {
                commits
                    .iter()
                    .filter_map(Value::as_array)
                    .map(|files| {
                        files
                            .iter()
                            .filter_map(Value::as_str)
                            .map(String::from)
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        let min_co_changes = settings
            .and_then(|s| s.options.get("min_co_changes"))
            .and_then(Value::as_u64)
            .unwrap_or(2) as usize;

        Self {
            budget: configured_budget(config, "temporal", StrategyBudget::Medium),
            history,
            min_co_changes,
        }
    }

    fn co_changes(&self, a: &str, b: &str) -> usize {
        self.history
            .iter()
            .filter(|commit| {
                commit.iter().any(|f| f == a) && commit.iter().any(|f| f == b)
            })
            .count()
    }
}

#[async_trait]
impl CorrelationStrategy for TemporalStrategy {
    fn name(&self) -> &'static str {
        "temporal"
    }

    fn budget(&self) -> StrategyBudget {
        self.budget
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        if self.history.is_empty() {
            return Ok(Vec::new());
        }

        let mut signals = Vec::new();
        for (i, a) in ctx.artifacts.iter().enumerate() {
            let Some(file_a) = a.file.as_deref() else {
                continue;
            };
            for b in ctx.artifacts.iter().skip(i + 1) {
                let Some(file_b) = b.file.as_deref() else {
                    continue;
                };
                if file_a == file_b {
                    continue;
                }

                // Co-change is symmetric; emit whichever orientation
                // the candidate set allows.
                let (src, dst) = if ctx.pair_allowed(&a.id, &b.id) {
                    (&a.id, &b.id)
                } else if ctx.pair_allowed(&b.id, &a.id) {
                    (&b.id, &a.id)
                } else {
                    continue;
                };

                let count = self.co_changes(file_a, file_b);
                if count < self.min_co_changes {
                    continue;
                }

                let score = (count as f64 / self.history.len() as f64).min(0.8);
                signals.push(
                    Signal::new(src, dst, "temporal", score, self.name()).with_evidence(
                        Evidence::new("co-change history")
                            .with_details(format!("{} of {} commits", count, self.history.len())),
                    ),
                );
            }
        }

        Ok(signals)
    }
}
