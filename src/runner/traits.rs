//! Host-system contracts consumed and exposed by the runner

use super::filter::{Consequence, Filter, FilterId};
use crate::error::FilterError;

/// Source of stored filters (consumed)
///
/// The backend decides storage and caching of filter rows; the runner only
/// asks for a group's filters and applies the enabled/deleted flags itself.
pub trait FilterStore: Send + Sync {
    /// All filters in a group, including disabled and deleted ones
    fn load_group(&self, group: &str) -> Result<Vec<Filter>, FilterError>;
}

/// Side-effect applier for matched consequences (exposed outward)
///
/// The runner decides *which* consequences apply; the executor performs
/// them. A failure is reported per consequence and never aborts the others.
pub trait ConsequenceExecutor: Send + Sync {
    /// Apply one consequence of one matched filter
    fn execute(&self, filter: FilterId, consequence: &Consequence) -> Result<(), FilterError>;
}

/// Counters from one runner invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileSample {
    /// Filters that reached a terminal state
    pub total: usize,
    /// Filters that matched
    pub matched: usize,
    /// Whether the step budget overflowed
    pub overflowed: bool,
}

/// Receiver of per-group performance counters (exposed outward)
///
/// Samples are append-only aggregates for operator display; exact counts
/// under concurrent runs are not a correctness requirement.
pub trait ProfileSink: Send + Sync {
    /// Record one run's counters for a group
    fn record(&self, group: &str, sample: ProfileSample);
}

/// Sink that drops every sample
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProfileSink;

impl ProfileSink for NullProfileSink {
    fn record(&self, _group: &str, _sample: ProfileSample) {}
}

/// An in-memory filter store, useful for tests and embedded setups
#[derive(Debug, Clone, Default)]
pub struct InMemoryFilterStore {
    filters: Vec<Filter>,
}

impl InMemoryFilterStore {
    /// A store over a fixed filter list
    pub fn new(filters: Vec<Filter>) -> Self {
        Self { filters }
    }
}

impl FilterStore for InMemoryFilterStore {
    fn load_group(&self, group: &str) -> Result<Vec<Filter>, FilterError> {
        Ok(self
            .filters
            .iter()
            .filter(|filter| filter.group == group)
            .cloned()
            .collect())
    }
}
