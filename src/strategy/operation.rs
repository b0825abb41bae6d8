//! Operation-alignment strategy.

use crate::artifact::types::ArtifactKind;
use crate::config::EngineConfig;
use crate::correlation::types::{Evidence, Signal};
use crate::error::Result;
use crate::strategy::{configured_budget, CorrelationStrategy, StrategyBudget, StrategyContext};
use async_trait::async_trait;

/// Matches api→database pairs whose CRUD verbs align on a shared
/// entity: a POST endpoint against a table receiving INSERTs is a
/// stronger link than a name match alone.
pub struct OperationStrategy {
    budget: StrategyBudget,
}

impl OperationStrategy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            budget: configured_budget(config, "operation", StrategyBudget::Low),
        }
    }

    fn score(aligned: usize) -> f64 {
        (0.65 + 0.05 * (aligned.saturating_sub(1)) as f64).min(0.8)
    }
}

#[async_trait]
impl CorrelationStrategy for OperationStrategy {
    fn name(&self) -> &'static str {
        "operation"
    }

    fn budget(&self) -> StrategyBudget {
        self.budget
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();

        for api in ctx.artifacts.iter().filter(|a| a.kind == ArtifactKind::Api) {
            for db in ctx
                .artifacts
                .iter()
                .filter(|a| a.kind == ArtifactKind::Database)
            {
                if !ctx.pair_allowed(&api.id, &db.id) {
                    continue;
                }
                if api.metadata.shares_entity_with(&db.metadata).is_empty() {
                    continue;
                }

                let aligned: Vec<String> = api
                    .metadata
                    .operations
                    .iter()
                    .filter(|op| db.metadata.operations.contains(op))
                    .map(|op| op.to_string())
                    .collect();
                if aligned.is_empty() {
                    continue;
                }

                signals.push(
                    Signal::new(
                        &api.id,
                        &db.id,
                        "operates_on",
                        Self::score(aligned.len()),
                        self.name(),
                    )
                    .with_evidence(
                        Evidence::new("operation alignment").with_details(aligned.join(", ")),
                    ),
                );
            }
        }

        Ok(signals)
    }
}
