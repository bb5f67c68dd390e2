//! Crate-level error type

use crate::evaluator::EvaluationError;
use crate::parser::ParseError;
use crate::vars::VarError;
use thiserror::Error;

/// Result type used across the crate's outer surface
pub type FilterResult<T> = Result<T, FilterError>;

/// Umbrella error for runner-level operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Malformed filter source
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Evaluation failed
    #[error("evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    /// Variable container failure
    #[error("variable error: {0}")]
    Variable(#[from] VarError),

    /// The filter store could not produce the requested filters
    #[error("filter store error: {message}")]
    Store {
        /// Description from the store backend
        message: String,
    },

    /// A consequence executor reported a failure
    #[error("consequence execution failed: {message}")]
    Consequence {
        /// Description from the executor
        message: String,
    },

    /// An internal contract was violated
    #[error("internal error: {message}")]
    Internal {
        /// Description for operators, never shown to end users
        message: String,
    },
}

impl FilterError {
    /// A store-backend failure
    pub fn store(message: impl Into<String>) -> Self {
        FilterError::Store {
            message: message.into(),
        }
    }

    /// A consequence-executor failure
    pub fn consequence(message: impl Into<String>) -> Self {
        FilterError::Consequence {
            message: message.into(),
        }
    }

    /// An internal contract violation
    pub fn internal(message: impl Into<String>) -> Self {
        FilterError::Internal {
            message: message.into(),
        }
    }
}
