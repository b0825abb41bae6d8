//! Infrastructure provisioning strategy.

use crate::artifact::types::ArtifactKind;
use crate::config::EngineConfig;
use crate::correlation::types::{Evidence, Signal};
use crate::error::Result;
use crate::strategy::{configured_budget, CorrelationStrategy, StrategyBudget, StrategyContext};
use async_trait::async_trait;

/// Links IaC resources to the APIs, databases, and configuration they
/// provision, by logical-id/entity overlap or a shared service label.
pub struct InfrastructureStrategy {
    budget: StrategyBudget,
}

impl InfrastructureStrategy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            budget: configured_budget(config, "infrastructure", StrategyBudget::Low),
        }
    }
}

#[async_trait]
impl CorrelationStrategy for InfrastructureStrategy {
    fn name(&self) -> &'static str {
        "infrastructure"
    }

    fn budget(&self) -> StrategyBudget {
        self.budget
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();

        for iac in ctx
            .artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::Infrastructure)
        {
            for target in ctx.artifacts.iter().filter(|a| {
                matches!(
                    a.kind,
                    ArtifactKind::Api | ArtifactKind::Database | ArtifactKind::Configuration
                )
            }) {
                if !ctx.pair_allowed(&iac.id, &target.id) {
                    continue;
                }

                let shared = iac.metadata.shares_entity_with(&target.metadata);
                let service_match = iac.service.is_some() && iac.service == target.service;
                if shared.is_empty() && !service_match {
                    continue;
                }

                let mut score: f64 = 0.6;
                let mut signal = Signal::new(&iac.id, &target.id, "provisions", score, self.name());
                if !shared.is_empty() {
                    signal = signal.with_evidence(
                        Evidence::new("resource name match").with_details(shared.join(", ")),
                    );
                }
                if service_match {
                    score = (score + 0.2).min(0.85);
                    signal = signal.with_evidence(
                        Evidence::new("shared service label")
                            .with_details(iac.service.clone().unwrap_or_default()),
                    );
                }
                signal.score = score;
                signals.push(signal);
            }
        }

        Ok(signals)
    }
}
