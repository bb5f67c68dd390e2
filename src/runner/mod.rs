//! The filter runner: batch evaluation, consequence resolution and stash
//!
//! For one event the runner loads a group's active filters, evaluates them
//! against the event's variable container under one shared step budget,
//! resolves matched consequences under the severity ordering and returns an
//! aggregated [`RunResult`]. Side effects stay behind the
//! [`ConsequenceExecutor`] contract; the runner only decides what applies.

mod filter;
mod profile;
mod stash;
mod status;
mod traits;

pub use filter::{Consequence, ConsequenceKind, Filter, FilterId};
pub use profile::{GroupProfile, InMemoryProfileSink};
pub use stash::{StashCache, StashKey, DEFAULT_STASH_CAPACITY, DEFAULT_STASH_TTL};
pub use status::{FilterOutcome, LogRecord, RunResult};
pub use traits::{
    ConsequenceExecutor, FilterStore, InMemoryFilterStore, NullProfileSink, ProfileSample,
    ProfileSink,
};

use crate::cache::ExpressionCache;
use crate::error::{FilterError, FilterResult};
use crate::evaluator::{EvaluationContext, EvaluationError, FilterEvaluator, StepBudget};
use crate::vars::VariableHolder;
use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;

/// Default shared step budget per event
pub const DEFAULT_CONDITION_LIMIT: u64 = 1000;

/// Orchestrates filter evaluation for single events
pub struct FilterRunner {
    store: Arc<dyn FilterStore>,
    evaluator: FilterEvaluator,
    cache: Arc<ExpressionCache>,
    profile: Arc<dyn ProfileSink>,
    stash: StashCache,
    condition_limit: u64,
}

impl FilterRunner {
    /// A runner over the given store with default budget, cache and sinks
    pub fn new(store: Arc<dyn FilterStore>) -> Self {
        Self {
            store,
            evaluator: FilterEvaluator::new(),
            cache: Arc::new(ExpressionCache::default()),
            profile: Arc::new(NullProfileSink),
            stash: StashCache::default(),
            condition_limit: DEFAULT_CONDITION_LIMIT,
        }
    }

    /// Replace the profile sink
    pub fn with_profile_sink(mut self, sink: Arc<dyn ProfileSink>) -> Self {
        self.profile = sink;
        self
    }

    /// Replace the shared step budget limit
    pub fn with_condition_limit(mut self, limit: u64) -> Self {
        self.condition_limit = limit;
        self
    }

    /// Replace the shared expression cache
    pub fn with_expression_cache(mut self, cache: Arc<ExpressionCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the evaluator (e.g. to extend the function registry)
    pub fn with_evaluator(mut self, evaluator: FilterEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Configure the stash cache
    pub fn with_stash(mut self, capacity: usize, ttl: Duration) -> Self {
        self.stash = StashCache::new(capacity, ttl);
        self
    }

    /// The shared expression cache, for external invalidation
    pub fn expression_cache(&self) -> &Arc<ExpressionCache> {
        &self.cache
    }

    /// Evaluate a group's active filters against one event
    ///
    /// Syntax and user-visible runtime errors mark the one filter Errored
    /// and evaluation continues; budget overflow stops the batch; internal
    /// errors abort with `Err`.
    pub fn run(&self, group: &str, vars: &mut VariableHolder) -> FilterResult<RunResult> {
        let result = self.evaluate_batch(group, vars)?;
        self.profile.record(
            group,
            ProfileSample {
                total: result.evaluated_count(),
                matched: result.matched_count(),
                overflowed: result.overflowed,
            },
        );
        Ok(result)
    }

    /// Speculative pre-save evaluation: same result, nothing to be applied
    ///
    /// The result is cached under the identity key so the real save can
    /// replay it within the TTL instead of re-evaluating.
    pub fn run_for_stash(
        &self,
        group: &str,
        vars: &mut VariableHolder,
        key: StashKey,
    ) -> FilterResult<RunResult> {
        let mut result = self.run(group, vars)?;
        self.stash.store(key, result.clone());
        // Nothing may be applied from a stash-mode run
        result.applied.clear();
        Ok(result)
    }

    /// Run for a real save, replaying a fresh stash hit when available
    pub fn run_with_stash(
        &self,
        group: &str,
        vars: &mut VariableHolder,
        key: &StashKey,
    ) -> FilterResult<RunResult> {
        if let Some(mut result) = self.stash.take(key) {
            debug!("stash hit for group '{group}', replaying {} outcomes", result.evaluated_count());
            result.mark_stash_hit();
            return Ok(result);
        }
        self.run(group, vars)
    }

    /// Apply the decided consequences through an executor
    ///
    /// Failures are reported per consequence and never abort the rest.
    pub fn execute(
        &self,
        result: &RunResult,
        executor: &dyn ConsequenceExecutor,
    ) -> Vec<(FilterId, ConsequenceKind, FilterError)> {
        let mut failures = Vec::new();
        for (filter, consequence) in &result.applied {
            if let Err(e) = executor.execute(*filter, consequence) {
                warn!("consequence '{}' of filter {filter} failed: {e}", consequence.kind);
                failures.push((*filter, consequence.kind, e));
            }
        }
        failures
    }

    fn evaluate_batch(&self, group: &str, vars: &mut VariableHolder) -> FilterResult<RunResult> {
        let mut filters = self.store.load_group(group)?;
        filters.retain(Filter::is_active);
        // Local filters run before global ones, each set in id order
        filters.sort_by_key(|filter| (filter.id.global, filter.id.id));
        debug!("running {} active filters in group '{group}'", filters.len());

        let mut budget = StepBudget::new(self.condition_limit);
        let mut result = RunResult::new(group);
        let mut blocking_reached = false;

        for filter in &filters {
            let ast = match self.cache.get_or_parse(&filter.source) {
                Ok(ast) => ast,
                Err(e) => {
                    warn!("filter {} has a syntax error: {e}", filter.id);
                    self.record_error(&mut result, filter.id, e.to_string());
                    continue;
                }
            };

            let mut ctx = EvaluationContext::new(vars, &mut budget);
            match self.evaluator.evaluate_match(&ast, &mut ctx) {
                Ok(true) => {
                    result.outcomes.insert(filter.id, FilterOutcome::Matched);
                    self.resolve_consequences(&mut result, filter, &mut blocking_reached);
                }
                Ok(false) => {
                    result.outcomes.insert(filter.id, FilterOutcome::NotMatched);
                }
                Err(EvaluationError::BudgetExceeded { limit }) => {
                    warn!(
                        "step budget of {limit} exceeded in group '{group}' at filter {}; \
                         aborting the batch",
                        filter.id
                    );
                    result.overflowed = true;
                    break;
                }
                Err(e) if e.is_user_visible() => {
                    warn!("filter {} errored: {e}", filter.id);
                    self.record_error(&mut result, filter.id, e.to_string());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(result)
    }

    fn record_error(&self, result: &mut RunResult, id: FilterId, diagnostic: String) {
        if result.first_error.is_none() {
            result.first_error = Some(format!("filter {id}: {diagnostic}"));
        }
        result.outcomes.insert(id, FilterOutcome::Errored(diagnostic));
    }

    fn resolve_consequences(
        &self,
        result: &mut RunResult,
        filter: &Filter,
        blocking_reached: &mut bool,
    ) {
        for consequence in &filter.consequences {
            result.record_strongest(consequence.kind);
            if consequence.kind.is_blocking() && *blocking_reached {
                // The action is already terminated; keep the record for
                // logging but do not apply
                result.recorded_only.push((filter.id, consequence.clone()));
            } else {
                result.applied.push((filter.id, consequence.clone()));
            }
        }
        result.log_records.push(LogRecord {
            filter: filter.id,
            group: filter.group.clone(),
            consequences: filter.consequences.iter().map(|c| c.kind).collect(),
            stash_hit: false,
        });
        if filter.has_blocking_consequence() {
            *blocking_reached = true;
        }
    }
}
