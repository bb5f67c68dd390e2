//! In-memory profile aggregation

use super::traits::{ProfileSample, ProfileSink};
use dashmap::DashMap;

/// Accumulated counters for one filter group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupProfile {
    /// Number of runner invocations
    pub runs: u64,
    /// Filters evaluated across all runs
    pub total: u64,
    /// Filters matched across all runs
    pub matched: u64,
    /// Runs that hit the step budget
    pub overflows: u64,
}

/// Concurrent per-group aggregate of runner samples
///
/// Suitable both for tests and as a live ops display backend; counters are
/// eventually consistent under concurrent writers.
#[derive(Debug, Default)]
pub struct InMemoryProfileSink {
    groups: DashMap<String, GroupProfile>,
}

impl InMemoryProfileSink {
    /// An empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// The accumulated profile for a group, if any run was recorded
    pub fn snapshot(&self, group: &str) -> Option<GroupProfile> {
        self.groups.get(group).map(|entry| *entry.value())
    }

    /// Drop all accumulated counters
    pub fn reset(&self) {
        self.groups.clear();
    }
}

impl ProfileSink for InMemoryProfileSink {
    fn record(&self, group: &str, sample: ProfileSample) {
        let mut entry = self.groups.entry(group.to_string()).or_default();
        entry.runs += 1;
        entry.total += sample.total as u64;
        entry.matched += sample.matched as u64;
        if sample.overflowed {
            entry.overflows += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn samples_accumulate_per_group() {
        let sink = InMemoryProfileSink::new();
        sink.record(
            "default",
            ProfileSample {
                total: 5,
                matched: 2,
                overflowed: false,
            },
        );
        sink.record(
            "default",
            ProfileSample {
                total: 3,
                matched: 0,
                overflowed: true,
            },
        );
        let profile = sink.snapshot("default").unwrap();
        assert_eq!(profile.runs, 2);
        assert_eq!(profile.total, 8);
        assert_eq!(profile.matched, 2);
        assert_eq!(profile.overflows, 1);
        assert_eq!(sink.snapshot("other"), None);
    }
}
