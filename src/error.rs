//! Error types for driftlens-core.

use thiserror::Error;

/// Result type alias using driftlens-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during correlation analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// A correlation strategy failed while producing signals
    #[error("Strategy '{strategy}' failed: {message}")]
    Strategy { strategy: String, message: String },

    /// A drift result could not be expanded into an artifact
    #[error("Invalid artifact: {0}")]
    InvalidArtifact(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// The pipeline was cancelled between strategy invocations
    #[error("Analysis cancelled")]
    Cancelled,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a strategy failure error.
    pub fn strategy(strategy: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Strategy {
            strategy: strategy.into(),
            message: message.into(),
        }
    }

    /// Create an invalid artifact error.
    pub fn invalid_artifact(message: impl Into<String>) -> Self {
        Self::InvalidArtifact(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
