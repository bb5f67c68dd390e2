//! Tree-walking evaluator for filter expressions
//!
//! Executes a parsed [`Expr`](crate::ast::Expr) against a
//! [`VariableHolder`](crate::vars::VariableHolder) under a shared step
//! budget. Short-circuit evaluation of `&`, `|` and conditionals is the
//! engine's primary performance contract: untaken branches must never force
//! lazy variables.

pub mod context;
pub mod engine;
pub mod error;

pub use context::{EvaluationContext, StepBudget};
pub use engine::FilterEvaluator;
pub use error::{EvaluationError, EvaluationResult};
