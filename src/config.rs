//! Engine configuration.
//!
//! Configuration arrives as JSON from the host (action inputs, config
//! files). Unknown keys are ignored and a malformed document falls back
//! to the documented defaults rather than aborting the run.

use crate::graph::PathAggregation;
use crate::strategy::StrategyBudget;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Score thresholds gating candidate selection and correlation output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum low-wave signal score for a pair to become a candidate
    pub candidate_min: f64,
    /// Minimum fused score for a correlation to be published
    pub correlate_min: f64,
    /// Confidence penalty applied when only one strategy contributed
    pub single_strategy_penalty: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            candidate_min: 0.35,
            correlate_min: 0.55,
            single_strategy_penalty: 0.9,
        }
    }
}

/// Graph construction and traversal options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Whether graph-dependent analysis runs at all
    pub enabled: bool,
    /// Maximum BFS depth for impact propagation and path queries
    pub max_depth: usize,
    /// Hard cap on graph nodes; breach suppresses graph analysis
    pub node_limit: usize,
    /// Hard cap on graph edges; breach suppresses graph analysis
    pub edge_limit: usize,
    /// How edge confidences combine along a path
    pub path_aggregation: PathAggregation,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_depth: 3,
            node_limit: 2000,
            edge_limit: 6000,
            path_aggregation: PathAggregation::Min,
        }
    }
}

/// Per-strategy settings from `strategyConfig.<name>`.
///
/// `enabled` and `budget` override the roster defaults; anything else
/// is strategy-specific and read by the strategy itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategySettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<StrategyBudget>,
    /// Free-form options consumed by individual strategies
    #[serde(flatten)]
    pub options: HashMap<String, Value>,
}

/// A user-defined correlation rule.
///
/// Rules both force pairs into the candidate set and override the fused
/// score for their `(src, dst, relationship)` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRule {
    pub src: String,
    pub dst: String,
    pub relationship: String,
    pub score: f64,
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub thresholds: Thresholds,
    pub graph: GraphConfig,
    #[serde(rename = "strategyConfig")]
    pub strategy_config: HashMap<String, StrategySettings>,
    #[serde(rename = "correlationRules")]
    pub correlation_rules: Vec<CorrelationRule>,
}

impl EngineConfig {
    /// Build a configuration from a JSON value, falling back to
    /// defaults when the document does not parse.
    pub fn from_json_value(value: Value) -> Self {
        match serde_json::from_value(value) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid engine configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Load a configuration from a JSON file, falling back to defaults
    /// when the file is missing or malformed.
    pub fn from_json_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Cannot read config {}: {}, using defaults", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid config {}: {}, using defaults", path.display(), e);
                Self::default()
            }
        }
    }

    /// Settings block for a named strategy, if configured.
    pub fn strategy_settings(&self, name: &str) -> Option<&StrategySettings> {
        self.strategy_config.get(name)
    }

    /// Whether a strategy is enabled, given its roster default.
    pub fn strategy_enabled(&self, name: &str, default: bool) -> bool {
        self.strategy_settings(name)
            .and_then(|s| s.enabled)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.thresholds.candidate_min, 0.35);
        assert_eq!(config.thresholds.correlate_min, 0.55);
        assert_eq!(config.thresholds.single_strategy_penalty, 0.9);
        assert!(config.graph.enabled);
        assert_eq!(config.graph.max_depth, 3);
        assert_eq!(config.graph.node_limit, 2000);
        assert_eq!(config.graph.edge_limit, 6000);
        assert_eq!(config.graph.path_aggregation, PathAggregation::Min);
        assert!(config.correlation_rules.is_empty());
    }

    #[test]
    fn test_partial_document_keeps_other_defaults() {
        let config = EngineConfig::from_json_value(json!({
            "thresholds": { "candidate_min": 0.5 },
            "graph": { "max_depth": 5 }
        }));
        assert_eq!(config.thresholds.candidate_min, 0.5);
        assert_eq!(config.thresholds.correlate_min, 0.55);
        assert_eq!(config.graph.max_depth, 5);
        assert_eq!(config.graph.node_limit, 2000);
    }

    #[test]
    fn test_malformed_document_falls_back_to_defaults() {
        let config = EngineConfig::from_json_value(json!({
            "graph": { "max_depth": "not a number" }
        }));
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_strategy_config_and_rules() {
        let config = EngineConfig::from_json_value(json!({
            "strategyConfig": {
                "temporal": { "enabled": true, "history": [["a.rs", "b.rs"]] },
                "code": { "enabled": false }
            },
            "correlationRules": [
                { "src": "api:GET:/users", "dst": "db:table:users",
                  "relationship": "uses_table", "score": 0.95 }
            ]
        }));

        assert!(config.strategy_enabled("temporal", false));
        assert!(!config.strategy_enabled("code", true));
        assert!(config.strategy_enabled("entity", true));
        assert!(config
            .strategy_settings("temporal")
            .unwrap()
            .options
            .contains_key("history"));
        assert_eq!(config.correlation_rules.len(), 1);
        assert_eq!(config.correlation_rules[0].score, 0.95);
    }

    #[test]
    fn test_from_json_file() {
        use std::io::Write as _;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "thresholds": {{ "correlate_min": 0.7 }} }}"#).unwrap();

        let config = EngineConfig::from_json_file(file.path());
        assert_eq!(config.thresholds.correlate_min, 0.7);

        let missing = EngineConfig::from_json_file("/nonexistent/config.json");
        assert_eq!(missing, EngineConfig::default());
    }
}
