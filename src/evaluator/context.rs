//! Evaluation context: variable access, local bindings and the step budget

use super::error::{EvaluationError, EvaluationResult};
use crate::model::Value;
use crate::vars::VariableHolder;
use rustc_hash::FxHashMap;

/// Deterministic work counter shared across all filters of one event
///
/// Every primitive operation and function call consumes one step. The
/// budget is the engine's only timeout mechanism: it is deterministic, so
/// overflow behavior is reproducible in tests. It is owned by the runner
/// for the duration of one event and never shared across events.
#[derive(Debug, Clone)]
pub struct StepBudget {
    limit: u64,
    remaining: u64,
    enabled: bool,
}

impl StepBudget {
    /// A budget of `limit` steps
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: limit,
            enabled: true,
        }
    }

    /// A budget that never overflows (for tests and offline re-evaluation)
    pub fn unlimited() -> Self {
        Self {
            limit: u64::MAX,
            remaining: u64::MAX,
            enabled: false,
        }
    }

    /// Consume one step
    pub fn tick(&mut self) -> EvaluationResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.remaining == 0 {
            return Err(EvaluationError::BudgetExceeded { limit: self.limit });
        }
        self.remaining -= 1;
        Ok(())
    }

    /// Steps consumed so far
    pub fn used(&self) -> u64 {
        self.limit - self.remaining
    }

    /// The configured limit
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

/// Per-filter evaluation state over a shared container and budget
///
/// `:=` bindings land in a local scope so one filter's assignments are
/// invisible to its siblings and to the shared container.
pub struct EvaluationContext<'a> {
    vars: &'a mut VariableHolder,
    budget: &'a mut StepBudget,
    locals: FxHashMap<String, Value>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context borrowing the event's container and batch budget
    pub fn new(vars: &'a mut VariableHolder, budget: &'a mut StepBudget) -> Self {
        Self {
            vars,
            budget,
            locals: FxHashMap::default(),
        }
    }

    /// Consume one budget step
    pub fn tick(&mut self) -> EvaluationResult<()> {
        self.budget.tick()
    }

    /// Read a variable: local bindings shadow container facts
    pub fn get_var(&mut self, name: &str) -> EvaluationResult<Value> {
        let key = name.to_lowercase();
        if let Some(value) = self.locals.get(&key) {
            return Ok(value.clone());
        }
        Ok(self.vars.get(&key)?)
    }

    /// Bind a local variable for the remainder of this evaluation
    pub fn set_local(&mut self, name: &str, value: Value) {
        self.locals.insert(name.to_lowercase(), value);
    }

    /// Whether a local binding exists for the name
    pub fn has_local(&self, name: &str) -> bool {
        self.locals.contains_key(&name.to_lowercase())
    }
}
