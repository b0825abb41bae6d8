//! Source-reference strategy.

use crate::artifact::metadata::extract_sql_tables;
use crate::artifact::types::{entities_match, Artifact, ArtifactKind};
use crate::config::EngineConfig;
use crate::correlation::types::{Evidence, Signal};
use crate::error::Result;
use crate::strategy::{configured_budget, CorrelationStrategy, StrategyBudget, StrategyContext};
use async_trait::async_trait;

/// Source-level reference analysis between artifacts: SQL strings in a
/// change that name another artifact's table, or descriptors that
/// mention another artifact's endpoint path.
///
/// Runs in the expensive wave, restricted to candidate pairs.
pub struct CodeStrategy {
    budget: StrategyBudget,
}

impl CodeStrategy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            budget: configured_budget(config, "code", StrategyBudget::Medium),
        }
    }

    /// Tables referenced by this artifact's change descriptors.
    fn referenced_tables(artifact: &Artifact) -> Vec<String> {
        let mut tables = Vec::new();
        for change in &artifact.changes {
            for table_ref in extract_sql_tables(change) {
                if !tables.contains(&table_ref.name) {
                    tables.push(table_ref.name);
                }
            }
        }
        tables
    }

    /// The path component of an api artifact id.
    fn endpoint_path(artifact: &Artifact) -> Option<&str> {
        let rest = artifact.id.strip_prefix("api:")?;
        Some(match rest.split_once(':') {
            Some((_method, path)) => path,
            None => rest,
        })
    }
}

#[async_trait]
impl CorrelationStrategy for CodeStrategy {
    fn name(&self) -> &'static str {
        "code"
    }

    fn budget(&self) -> StrategyBudget {
        self.budget
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();

        for src in ctx
            .artifacts
            .iter()
            .filter(|a| matches!(a.kind, ArtifactKind::Code | ArtifactKind::Api))
        {
            let tables = Self::referenced_tables(src);

            for dst in ctx.artifacts.iter() {
                if src.id == dst.id || !ctx.pair_allowed(&src.id, &dst.id) {
                    continue;
                }

                match dst.kind {
                    ArtifactKind::Database => {
                        let matched: Vec<String> = tables
                            .iter()
                            .filter(|t| {
                                dst.metadata.entities.iter().any(|e| entities_match(t, e))
                            })
                            .cloned()
                            .collect();
                        if matched.is_empty() {
                            continue;
                        }
                        signals.push(
                            Signal::new(&src.id, &dst.id, "uses_table", 0.8, self.name())
                                .with_evidence(
                                    Evidence::new("SQL query analysis")
                                        .with_details(matched.join(", ")),
                                ),
                        );
                    }
                    ArtifactKind::Api if src.kind == ArtifactKind::Code => {
                        let Some(path) = Self::endpoint_path(dst) else {
                            continue;
                        };
                        if !src.changes.iter().any(|change| change.contains(path)) {
                            continue;
                        }
                        signals.push(
                            Signal::new(&src.id, &dst.id, "calls", 0.7, self.name())
                                .with_evidence(
                                    Evidence::new("endpoint reference").with_details(path),
                                ),
                        );
                    }
                    _ => {}
                }
            }
        }

        Ok(signals)
    }
}
