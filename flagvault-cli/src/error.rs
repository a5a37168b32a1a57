//! Error types for the FlagVault CLI.

use flagvault_config::ConfigError;
use flagvault_rollout::{EvaluationError, RolloutError};
use std::fmt;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error types.
#[derive(Debug)]
pub enum CliError {
    /// Rejected rollout input
    Rollout(RolloutError),

    /// Flag evaluation failed
    Evaluation(EvaluationError),

    /// Configuration could not be loaded or failed validation
    Config(ConfigError),

    /// Invalid argument
    InvalidArgument(String),

    /// Output could not be serialized
    Serialization(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Rollout(e) => write!(f, "{}", e),
            CliError::Evaluation(e) => write!(f, "Evaluation failed: {}", e),
            CliError::Config(e) => write!(f, "Configuration error: {}", e),
            CliError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CliError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Rollout(e) => Some(e),
            CliError::Evaluation(e) => Some(e),
            CliError::Config(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RolloutError> for CliError {
    fn from(e: RolloutError) -> Self {
        CliError::Rollout(e)
    }
}

impl From<EvaluationError> for CliError {
    fn from(e: EvaluationError) -> Self {
        CliError::Evaluation(e)
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Serialization(e.to_string())
    }
}
