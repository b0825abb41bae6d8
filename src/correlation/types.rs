//! Signal and correlation types.
//!
//! A signal is one strategy's weighted hypothesis that two artifacts
//! are related. A correlation is the fused, thresholded result per
//! `(src, dst, relationship)` triple.

use serde::{Deserialize, Serialize};

/// Maximum evidence entries carried per correlation or graph edge.
pub const MAX_EVIDENCE: usize = 5;

/// A piece of evidence backing a signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Short machine-stable reason, e.g. "table name match"
    pub reason: String,
    /// Optional human-readable detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Evidence {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// A single strategy's relationship hypothesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    /// Source artifact id
    pub src: String,
    /// Destination artifact id
    pub dst: String,
    /// Relationship tag, read source-relative ("src uses_table dst")
    pub relationship: String,
    /// Strategy's belief in the relationship, in [0, 1]
    pub score: f64,
    /// Emitting strategy name
    pub strategy: String,
    pub evidence: Vec<Evidence>,
    /// Whether a user-defined rule produced this signal
    #[serde(default)]
    pub user_defined: bool,
}

impl Signal {
    pub fn new(
        src: impl Into<String>,
        dst: impl Into<String>,
        relationship: impl Into<String>,
        score: f64,
        strategy: impl Into<String>,
    ) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            relationship: relationship.into(),
            score: score.clamp(0.0, 1.0),
            strategy: strategy.into(),
            evidence: Vec::new(),
            user_defined: false,
        }
    }

    pub fn with_evidence(mut self, evidence: Evidence) -> Self {
        self.evidence.push(evidence);
        self
    }

    /// The ordered pair this signal connects.
    pub fn pair(&self) -> (String, String) {
        (self.src.clone(), self.dst.clone())
    }
}

/// A fused relationship backed by one or more signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correlation {
    pub src: String,
    pub dst: String,
    pub relationship: String,
    /// Noisy-OR fusion of contributing signal scores
    pub final_score: f64,
    /// Engine's belief, after the single-strategy penalty
    pub confidence: f64,
    /// Contributing strategy names, in contribution order
    pub strategies: Vec<String>,
    /// Combined evidence, capped at [`MAX_EVIDENCE`]
    pub evidence: Vec<Evidence>,
    /// Whether a user rule overrode the fused score
    pub user_defined: bool,
}
