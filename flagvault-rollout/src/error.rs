//! Error types for rollout bucketing and flag evaluation.

use thiserror::Error;

/// Errors produced by the rollout bucketer.
///
/// The bucketer is total apart from input validation: every well-formed input
/// yields a decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RolloutError {
    #[error("Invalid input: {field} {reason}")]
    InvalidInput {
        field: &'static str,
        reason: &'static str,
    },
}

impl RolloutError {
    pub(crate) fn empty(field: &'static str) -> Self {
        Self::InvalidInput {
            field,
            reason: "must not be empty",
        }
    }
}

/// Errors produced by a [`FlagEvaluator`](crate::FlagEvaluator).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    #[error("Flag not found: {0}")]
    FlagNotFound(String),

    #[error("Flag source unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Rollout(#[from] RolloutError),
}

pub type Result<T> = std::result::Result<T, RolloutError>;
