//! Two-wave strategy execution.
//!
//! Low-budget strategies run first over the full artifact set; the
//! candidate selector then bounds the pairs the expensive wave may
//! touch. Strategies run sequentially and a failing strategy
//! contributes zero signals; the run continues.

use crate::config::EngineConfig;
use crate::correlation::types::Signal;
use crate::error::{Error, Result};
use crate::strategy::{build_roster, CorrelationStrategy, StrategyBudget, StrategyContext};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Cooperative cancellation flag, checked between strategy invocations.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; the pipeline aborts before the next
    /// strategy invocation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Observability record for one strategy invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub name: String,
    pub budget: StrategyBudget,
    pub elapsed_ms: u64,
    pub signal_count: usize,
}

/// Drives the configured roster through its two waves.
pub struct StrategyRunner {
    strategies: Vec<Box<dyn CorrelationStrategy>>,
}

impl StrategyRunner {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            strategies: build_roster(config),
        }
    }

    #[cfg(test)]
    pub fn with_strategies(strategies: Vec<Box<dyn CorrelationStrategy>>) -> Self {
        Self { strategies }
    }

    /// Names of instantiated strategies, in roster order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    /// Run the cheap wave (`budget == low`).
    pub async fn run_low_wave(
        &self,
        ctx: &StrategyContext<'_>,
        cancel: &CancelFlag,
        stats: &mut Vec<StrategyStats>,
    ) -> Result<Vec<Signal>> {
        self.run_wave(true, ctx, cancel, stats).await
    }

    /// Run the expensive wave (everything else), restricted to the
    /// candidate pairs in `ctx`.
    pub async fn run_expensive_wave(
        &self,
        ctx: &StrategyContext<'_>,
        cancel: &CancelFlag,
        stats: &mut Vec<StrategyStats>,
    ) -> Result<Vec<Signal>> {
        self.run_wave(false, ctx, cancel, stats).await
    }

    async fn run_wave(
        &self,
        low: bool,
        ctx: &StrategyContext<'_>,
        cancel: &CancelFlag,
        stats: &mut Vec<StrategyStats>,
    ) -> Result<Vec<Signal>> {
        let mut signals = Vec::new();

        for strategy in &self.strategies {
            if (strategy.budget() == StrategyBudget::Low) != low {
                continue;
            }
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let start = Instant::now();
            let produced = match strategy.run(ctx).await {
                Ok(produced) => produced,
                Err(e) => {
                    warn!("Strategy '{}' failed: {}", strategy.name(), e);
                    Vec::new()
                }
            };
            let elapsed_ms = start.elapsed().as_millis() as u64;

            debug!(
                "Strategy '{}' produced {} signals in {}ms",
                strategy.name(),
                produced.len(),
                elapsed_ms
            );
            stats.push(StrategyStats {
                name: strategy.name().to_string(),
                budget: strategy.budget(),
                elapsed_ms,
                signal_count: produced.len(),
            });
            signals.extend(produced);
        }

        Ok(signals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct FixedStrategy {
        name: &'static str,
        budget: StrategyBudget,
        signals: Vec<Signal>,
    }

    #[async_trait]
    impl CorrelationStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            self.name
        }

        fn budget(&self) -> StrategyBudget {
            self.budget
        }

        async fn run(&self, _ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
            Ok(self.signals.clone())
        }
    }

    struct FailingStrategy;

    #[async_trait]
    impl CorrelationStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn budget(&self) -> StrategyBudget {
            StrategyBudget::Low
        }

        async fn run(&self, _ctx: &StrategyContext<'_>) -> Result<Vec<Signal>> {
            Err(Error::strategy("failing", "boom"))
        }
    }

    fn context<'a>(
        config: &'a EngineConfig,
        processed: &'a HashSet<(String, String)>,
    ) -> StrategyContext<'a> {
        StrategyContext {
            artifacts: &[],
            files: &[],
            config,
            processed_pairs: processed,
            candidate_pairs: None,
        }
    }

    #[tokio::test]
    async fn test_waves_split_by_budget() {
        let runner = StrategyRunner::with_strategies(vec![
            Box::new(FixedStrategy {
                name: "cheap",
                budget: StrategyBudget::Low,
                signals: vec![Signal::new("a", "b", "calls", 0.5, "cheap")],
            }),
            Box::new(FixedStrategy {
                name: "pricey",
                budget: StrategyBudget::Medium,
                signals: vec![Signal::new("c", "d", "calls", 0.6, "pricey")],
            }),
        ]);

        let config = EngineConfig::default();
        let processed = HashSet::new();
        let ctx = context(&config, &processed);
        let cancel = CancelFlag::new();
        let mut stats = Vec::new();

        let low = runner.run_low_wave(&ctx, &cancel, &mut stats).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].strategy, "cheap");

        let expensive = runner
            .run_expensive_wave(&ctx, &cancel, &mut stats)
            .await
            .unwrap();
        assert_eq!(expensive.len(), 1);
        assert_eq!(expensive[0].strategy, "pricey");

        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].name, "cheap");
        assert_eq!(stats[0].signal_count, 1);
    }

    #[tokio::test]
    async fn test_failing_strategy_is_isolated() {
        let runner = StrategyRunner::with_strategies(vec![
            Box::new(FailingStrategy),
            Box::new(FixedStrategy {
                name: "cheap",
                budget: StrategyBudget::Low,
                signals: vec![Signal::new("a", "b", "calls", 0.5, "cheap")],
            }),
        ]);

        let config = EngineConfig::default();
        let processed = HashSet::new();
        let ctx = context(&config, &processed);
        let mut stats = Vec::new();

        let signals = runner
            .run_low_wave(&ctx, &CancelFlag::new(), &mut stats)
            .await
            .unwrap();
        // The failure contributed zero signals and the run continued.
        assert_eq!(signals.len(), 1);
        assert_eq!(stats[0].signal_count, 0);
        assert_eq!(stats[1].signal_count, 1);
    }

    #[tokio::test]
    async fn test_cancellation_between_invocations() {
        let runner = StrategyRunner::with_strategies(vec![Box::new(FixedStrategy {
            name: "cheap",
            budget: StrategyBudget::Low,
            signals: vec![],
        })]);

        let config = EngineConfig::default();
        let processed = HashSet::new();
        let ctx = context(&config, &processed);
        let cancel = CancelFlag::new();
        cancel.cancel();

        let result = runner.run_low_wave(&ctx, &cancel, &mut Vec::new()).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_signal_order_follows_registration() {
        let runner = StrategyRunner::with_strategies(vec![
            Box::new(FixedStrategy {
                name: "first",
                budget: StrategyBudget::Low,
                signals: vec![Signal::new("a", "b", "calls", 0.5, "first")],
            }),
            Box::new(FixedStrategy {
                name: "second",
                budget: StrategyBudget::Low,
                signals: vec![Signal::new("a", "b", "calls", 0.6, "second")],
            }),
        ]);

        let config = EngineConfig::default();
        let processed = HashSet::new();
        let ctx = context(&config, &processed);

        let signals = runner
            .run_low_wave(&ctx, &CancelFlag::new(), &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(signals[0].strategy, "first");
        assert_eq!(signals[1].strategy, "second");
    }
}
