//! Entity-name matching strategy.

use crate::artifact::types::ArtifactKind;
use crate::config::EngineConfig;
use crate::correlation::types::{Evidence, Signal};
use crate::error::Result;
use crate::strategy::{configured_budget, CorrelationStrategy, StrategyBudget, StrategyContext};
use async_trait::async_trait;

/// Matches artifacts sharing entity names: an API path token equal to a
/// database table name, a config file stem equal to a resource id.
///
/// Emits `uses_table` for api→database pairs and `shares_entity`
/// otherwise (once per unordered pair).
pub struct EntityStrategy {
    budget: StrategyBudget,
}

impl EntityStrategy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            budget: configured_budget(config, "entity", StrategyBudget::Low),
        }
    }

    fn score(shared: usize) -> f64 {
        (0.6 + 0.15 * (shared.saturating_sub(1)) as f64).min(0.9)
    }
}

#[async_trait]
impl CorrelationStrategy for EntityStrategy {
    fn name(&self) -> &'static str {
        "entity"
    }

    fn budget(&self) -> StrategyBudget {
        self.budget
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();

        for (i, a) in ctx.artifacts.iter().enumerate() {
            for (j, b) in ctx.artifacts.iter().enumerate() {
                if i == j || a.id == b.id {
                    continue;
                }

                let api_to_db = a.kind == ArtifactKind::Api && b.kind == ArtifactKind::Database;
                // api/db pairs are handled from the api side; generic
                // matches are symmetric and emitted once.
                if a.kind == ArtifactKind::Database && b.kind == ArtifactKind::Api {
                    continue;
                }
                if !api_to_db && i > j {
                    continue;
                }
                if !ctx.pair_allowed(&a.id, &b.id) {
                    continue;
                }

                let shared = a.metadata.shares_entity_with(&b.metadata);
                if shared.is_empty() {
                    continue;
                }

                let relationship = if api_to_db { "uses_table" } else { "shares_entity" };
                signals.push(
                    Signal::new(&a.id, &b.id, relationship, Self::score(shared.len()), self.name())
                        .with_evidence(
                            Evidence::new("entity name match").with_details(shared.join(", ")),
                        ),
                );
            }
        }

        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::types::Artifact;
    use std::collections::HashSet;

    fn artifact(id: &str, kind: ArtifactKind, entities: &[&str]) -> Artifact {
        let mut artifact = Artifact::new(id, kind);
        for entity in entities {
            artifact.metadata.push_entity(*entity);
        }
        artifact
    }

    async fn run(artifacts: &[Artifact]) -> Vec<Signal> {
        let config = EngineConfig::default();
        let processed = HashSet::new();
        let ctx = StrategyContext {
            artifacts,
            files: &[],
            config: &config,
            processed_pairs: &processed,
            candidate_pairs: None,
        };
        EntityStrategy::from_config(&config).run(&ctx).await.unwrap()
    }

    #[tokio::test]
    async fn test_api_db_match_is_directional() {
        let artifacts = vec![
            artifact("db:table:users", ArtifactKind::Database, &["users"]),
            artifact("api:GET:/users", ArtifactKind::Api, &["users"]),
        ];
        let signals = run(&artifacts).await;

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].src, "api:GET:/users");
        assert_eq!(signals[0].dst, "db:table:users");
        assert_eq!(signals[0].relationship, "uses_table");
        assert_eq!(signals[0].score, 0.6);
        assert_eq!(signals[0].evidence[0].reason, "entity name match");
    }

    #[tokio::test]
    async fn test_generic_match_emitted_once() {
        let artifacts = vec![
            artifact("config:db.json", ArtifactKind::Configuration, &["db"]),
            artifact("iac:rds:db", ArtifactKind::Infrastructure, &["db"]),
        ];
        let signals = run(&artifacts).await;

        assert_eq!(signals.len(), 1);
        assert_eq!(signals[0].relationship, "shares_entity");
        assert_eq!(signals[0].src, "config:db.json");
    }

    #[tokio::test]
    async fn test_plural_folding() {
        let artifacts = vec![
            artifact("api:GET:/users", ArtifactKind::Api, &["users"]),
            artifact("db:table:user", ArtifactKind::Database, &["user"]),
        ];
        let signals = run(&artifacts).await;
        assert_eq!(signals.len(), 1);
    }

    #[tokio::test]
    async fn test_score_grows_with_shared_entities() {
        let artifacts = vec![
            artifact("api:GET:/users/orders", ArtifactKind::Api, &["users", "orders"]),
            artifact("db:table:users", ArtifactKind::Database, &["users", "orders"]),
        ];
        let signals = run(&artifacts).await;
        assert_eq!(signals[0].score, 0.75);
    }

    #[tokio::test]
    async fn test_no_shared_entities() {
        let artifacts = vec![
            artifact("api:GET:/users", ArtifactKind::Api, &["users"]),
            artifact("db:table:orders", ArtifactKind::Database, &["orders"]),
        ];
        assert!(run(&artifacts).await.is_empty());
    }
}
