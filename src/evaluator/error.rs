//! Evaluation error types

use crate::model::ValueError;
use crate::vars::VarError;
use thiserror::Error;

/// Result type for evaluation operations
pub type EvaluationResult<T> = Result<T, EvaluationError>;

/// Errors raised while evaluating a filter
///
/// Two classes matter to callers: user-visible errors (authored mistakes,
/// reported with position and message id, fatal only to the one filter) and
/// internal errors (contract violations, fatal to the batch).
/// `BudgetExceeded` is its own class: it aborts the whole batch by design.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    /// A mistake in the filter text, e.g. division by zero or a bad regex
    #[error("{message} at position {position}")]
    UserVisible {
        /// Stable message key (e.g. `dividebyzero`, `regexfailure`)
        id: String,
        /// Byte offset of the operation in the filter source
        position: usize,
        /// Human-readable description
        message: String,
    },

    /// The shared step budget for this event was exhausted
    #[error("condition limit of {limit} exceeded")]
    BudgetExceeded {
        /// The configured limit
        limit: u64,
    },

    /// Internal container failure (unknown compute method, cyclic lazy
    /// variable)
    #[error(transparent)]
    Variable(#[from] VarError),

    /// Internal value-contract failure (e.g. casting `Undefined`)
    #[error(transparent)]
    Value(#[from] ValueError),
}

impl EvaluationError {
    /// Create a user-visible error
    pub fn user(id: impl Into<String>, position: usize, message: impl Into<String>) -> Self {
        EvaluationError::UserVisible {
            id: id.into(),
            position,
            message: message.into(),
        }
    }

    /// Whether this error is safe to show to the filter's author
    pub fn is_user_visible(&self) -> bool {
        matches!(self, EvaluationError::UserVisible { .. })
    }

    /// Whether this error aborts the whole batch rather than one filter
    pub fn is_batch_fatal(&self) -> bool {
        !self.is_user_visible()
    }
}
