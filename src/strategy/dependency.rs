//! Package dependency strategy.

use crate::artifact::types::ArtifactKind;
use crate::config::EngineConfig;
use crate::correlation::types::{Evidence, Signal};
use crate::error::Result;
use crate::strategy::{configured_budget, CorrelationStrategy, StrategyBudget, StrategyContext};
use async_trait::async_trait;

/// Links lockfile/manifest changes to the code artifacts that depend on
/// the affected packages. Edges point configuration→code so a changed
/// lockfile reaches dependent code during impact propagation.
pub struct DependencyStrategy {
    budget: StrategyBudget,
}

impl DependencyStrategy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            budget: configured_budget(config, "dependency", StrategyBudget::Low),
        }
    }
}

#[async_trait]
impl CorrelationStrategy for DependencyStrategy {
    fn name(&self) -> &'static str {
        "dependency"
    }

    fn budget(&self) -> StrategyBudget {
        self.budget
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();

        for config_artifact in ctx
            .artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::Configuration)
        {
            if config_artifact.metadata.dependencies.is_empty() {
                continue;
            }

            for code_artifact in ctx.artifacts.iter().filter(|a| a.kind == ArtifactKind::Code) {
                if !ctx.pair_allowed(&config_artifact.id, &code_artifact.id) {
                    continue;
                }

                let affected: Vec<String> = config_artifact
                    .metadata
                    .dependencies
                    .iter()
                    .filter(|dep| code_artifact.metadata.dependencies.contains(dep))
                    .cloned()
                    .collect();
                if affected.is_empty() {
                    continue;
                }

                signals.push(
                    Signal::new(
                        &config_artifact.id,
                        &code_artifact.id,
                        "provides_dependency",
                        0.75,
                        self.name(),
                    )
                    .with_evidence(
                        Evidence::new("shared package dependency")
                            .with_details(affected.join(", ")),
                    ),
                );
            }
        }

        Ok(signals)
    }
}
