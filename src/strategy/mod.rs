//! Correlation strategies.
//!
//! A strategy is a focused producer of relationship signals. The roster
//! is closed: the engine knows every strategy at compile time and
//! configuration only toggles and tunes them. Low-budget strategies run
//! first over all artifacts; everything else is restricted to the
//! candidate pairs the cheap wave surfaced.

pub mod code;
pub mod dependency;
pub mod entity;
pub mod infrastructure;
pub mod operation;
pub mod runner;
pub mod temporal;

use crate::artifact::types::{Artifact, ChangedFile};
use crate::config::EngineConfig;
use crate::correlation::types::Signal;
use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

pub use code::CodeStrategy;
pub use dependency::DependencyStrategy;
pub use entity::EntityStrategy;
pub use infrastructure::InfrastructureStrategy;
pub use operation::OperationStrategy;
pub use runner::{CancelFlag, StrategyRunner, StrategyStats};
pub use temporal::TemporalStrategy;

/// Cost class of a strategy; low-budget strategies run unrestricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyBudget {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for StrategyBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Read-only context handed to each strategy invocation.
pub struct StrategyContext<'a> {
    /// Expanded artifacts, in expansion order
    pub artifacts: &'a [Artifact],
    /// Raw changed-file list from the pull request
    pub files: &'a [ChangedFile],
    pub config: &'a EngineConfig,
    /// Pairs already correlated; strategies skip these
    pub processed_pairs: &'a HashSet<(String, String)>,
    /// Pair restriction for non-low strategies; `None` during the
    /// cheap wave
    pub candidate_pairs: Option<&'a HashSet<(String, String)>>,
}

impl StrategyContext<'_> {
    /// Whether a strategy may emit a signal for this ordered pair.
    pub fn pair_allowed(&self, src: &str, dst: &str) -> bool {
        let key = (src.to_string(), dst.to_string());
        if self.processed_pairs.contains(&key) {
            return false;
        }
        match self.candidate_pairs {
            Some(candidates) => candidates.contains(&key),
            None => true,
        }
    }
}

/// A polymorphic correlation signal producer.
///
/// `run` may suspend (strategies can delegate to analyzers that do
/// I/O); the runner awaits strategies sequentially so signal order
/// stays deterministic. A strategy must be deterministic given the
/// same context.
#[async_trait]
pub trait CorrelationStrategy: Send + Sync {
    /// Stable strategy name used in configuration and provenance.
    fn name(&self) -> &'static str;

    /// Cost class; decides which wave the strategy runs in.
    fn budget(&self) -> StrategyBudget;

    /// Produce signals for the given context.
    async fn run(&self, ctx: &StrategyContext<'_>) -> Result<Vec<Signal>>;
}

/// Instantiate the roster from configuration, dropping disabled
/// strategies. Roster order is fixed; it defines signal ordering
/// within each wave.
pub fn build_roster(config: &EngineConfig) -> Vec<Box<dyn CorrelationStrategy>> {
    let mut roster: Vec<Box<dyn CorrelationStrategy>> = Vec::new();

    if config.strategy_enabled("entity", true) {
        roster.push(Box::new(EntityStrategy::from_config(config)));
    }
    if config.strategy_enabled("operation", true) {
        roster.push(Box::new(OperationStrategy::from_config(config)));
    }
    if config.strategy_enabled("infrastructure", true) {
        roster.push(Box::new(InfrastructureStrategy::from_config(config)));
    }
    if config.strategy_enabled("dependency", true) {
        roster.push(Box::new(DependencyStrategy::from_config(config)));
    }
    if config.strategy_enabled("temporal", false) {
        roster.push(Box::new(TemporalStrategy::from_config(config)));
    }
    if config.strategy_enabled("code", true) {
        roster.push(Box::new(CodeStrategy::from_config(config)));
    }

    for name in config.strategy_config.keys() {
        if !KNOWN_STRATEGIES.contains(&name.as_str()) {
            warn!("Unknown strategy in configuration: {}", name);
        }
    }

    roster
}

const KNOWN_STRATEGIES: &[&str] = &[
    "entity",
    "operation",
    "infrastructure",
    "dependency",
    "temporal",
    "code",
];

/// Budget for a named strategy, honoring a configured override.
pub(crate) fn configured_budget(
    config: &EngineConfig,
    name: &str,
    default: StrategyBudget,
) -> StrategyBudget {
    config
        .strategy_settings(name)
        .and_then(|s| s.budget)
        .unwrap_or(default)
}
