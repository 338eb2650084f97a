//! Error types shared by every algorithm in the crate.

use thiserror::Error;

/// Failure reported by an [`Evaluator`](crate::Evaluator).
///
/// The engine never retries; the error aborts the current generation and is
/// surfaced to the caller of `iterate` as [`OptError::Evaluation`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EvaluationError(pub String);

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors produced by the optimization engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptError {
    /// A caller-supplied argument is out of range (top-k size, seed count,
    /// parameter vector length, ...). No state was changed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The cost evaluator failed.
    #[error("evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),

    /// A worker task panicked or left a lock poisoned.
    #[error("worker task failed: {0}")]
    Worker(String),

    /// `iterate` was called before `init`.
    #[error("algorithm has not been initialized")]
    NotInitialized,
}

/// Result alias used throughout the crate.
pub type OptResult<T> = Result<T, OptError>;

impl OptError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        OptError::InvalidArgument(message.into())
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        OptError::InvalidConfig(message.into())
    }
}

impl<T> From<std::sync::PoisonError<T>> for OptError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        OptError::Worker(format!("lock poisoned: {err}"))
    }
}
