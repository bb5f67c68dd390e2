//! Rule engine for content moderation filters
//!
//! Filters are boolean expressions over per-event facts (who is acting, on
//! what, with what content). The engine parses filter text, evaluates it
//! against a lazily populated variable container under a shared step
//! budget, and resolves matched consequences under a deterministic severity
//! ordering. Side effects (blocking, tagging, logging) stay behind host
//! contracts.

pub mod ast;
pub mod cache;
pub mod error;
pub mod evaluator;
pub mod model;
pub mod parser;
pub mod registry;
pub mod runner;
pub mod vars;

// Re-export main types
pub use cache::ExpressionCache;
pub use error::{FilterError, FilterResult};
pub use evaluator::{EvaluationContext, EvaluationError, FilterEvaluator, StepBudget};
pub use model::{Value, ValueType};
pub use parser::{parse, ParseError};
pub use registry::FunctionRegistry;
pub use runner::{
    Consequence, ConsequenceKind, Filter, FilterId, FilterOutcome, FilterRunner, RunResult,
    StashKey,
};
pub use vars::{ComputeRegistry, ComputedVariable, VariableHolder};
