//! Per-filter outcomes and the aggregated run result

use super::filter::{Consequence, ConsequenceKind, FilterId};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::{Deserialize, Serialize};

/// Terminal state of one filter's evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterOutcome {
    /// The filter's condition held
    Matched,
    /// The filter's condition did not hold
    NotMatched,
    /// The filter failed with a user-visible diagnostic and was treated as
    /// disabled for this evaluation
    Errored(String),
}

impl FilterOutcome {
    /// Whether the filter matched
    pub fn is_matched(&self) -> bool {
        matches!(self, FilterOutcome::Matched)
    }
}

/// One log row's worth of data for a matched filter
///
/// The runner never writes logs itself; it hands these to the host's
/// logger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    /// The matched filter
    pub filter: FilterId,
    /// Group the run was scoped to
    pub group: String,
    /// Consequence kinds the filter carries, in stored order
    pub consequences: Vec<ConsequenceKind>,
    /// Whether this record was replayed from a stash hit
    pub stash_hit: bool,
}

/// Aggregated result of running one filter group against one event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    /// Group the run was scoped to
    pub group: String,
    /// Terminal state per evaluated filter, in evaluation order
    ///
    /// Filters skipped by a budget overflow have no entry.
    pub outcomes: IndexMap<FilterId, FilterOutcome, FxBuildHasher>,
    /// Most severe consequence tier across all matched filters
    pub strongest: Option<ConsequenceKind>,
    /// Consequences that should actually be applied, in match order
    pub applied: Vec<(FilterId, Consequence)>,
    /// Blocking consequences recorded after the action was already
    /// terminated; logged but never applied
    pub recorded_only: Vec<(FilterId, Consequence)>,
    /// One record per matched filter for the host's logger
    pub log_records: Vec<LogRecord>,
    /// Whether the shared step budget overflowed mid-batch
    pub overflowed: bool,
    /// Diagnostic of the first filter that errored, for operator display
    pub first_error: Option<String>,
}

impl RunResult {
    pub(super) fn new(group: &str) -> Self {
        Self {
            group: group.to_string(),
            ..Self::default()
        }
    }

    /// Whether the action may proceed
    pub fn is_allowed(&self) -> bool {
        !self.strongest.is_some_and(ConsequenceKind::is_blocking)
    }

    /// Ids of all matched filters, in evaluation order
    pub fn matched_ids(&self) -> Vec<FilterId> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_matched())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Number of filters that reached a terminal state
    pub fn evaluated_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of matched filters
    pub fn matched_count(&self) -> usize {
        self.outcomes
            .values()
            .filter(|outcome| outcome.is_matched())
            .count()
    }

    pub(super) fn record_strongest(&mut self, kind: ConsequenceKind) {
        if self.strongest.is_none_or(|current| kind > current) {
            self.strongest = Some(kind);
        }
    }

    /// Mark every log record as replayed from the stash
    pub(super) fn mark_stash_hit(&mut self) {
        for record in &mut self.log_records {
            record.stash_hit = true;
        }
    }
}
