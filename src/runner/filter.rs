//! Filter definitions and consequence severity

use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric filter identity plus scope
///
/// Global filters are defined centrally and run on every site; their ids
/// display as `global-<n>` so log rows stay unambiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterId {
    /// Numeric id within its scope
    pub id: u64,
    /// Whether the filter is globally scoped
    pub global: bool,
}

impl FilterId {
    /// A locally scoped filter id
    pub const fn local(id: u64) -> Self {
        Self { id, global: false }
    }

    /// A globally scoped filter id
    pub const fn global(id: u64) -> Self {
        Self { id, global: true }
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.global {
            write!(f, "global-{}", self.id)
        } else {
            write!(f, "{}", self.id)
        }
    }
}

/// Consequence kinds in ascending severity
///
/// The variant order is the severity order; everything from `Disallow` up
/// is a blocking tier that terminates the triggering action.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ConsequenceKind {
    /// Apply a change tag for later review
    Tag,
    /// Show a warning the user may click through
    Warn,
    /// Count the action against a rate limit
    Throttle,
    /// Reject the action outright
    Disallow,
    /// Block the user's IP range
    RangeBlock,
    /// Remove the user from privileged groups
    Degroup,
    /// Block the user
    Block,
}

impl ConsequenceKind {
    /// Whether this tier terminates the triggering action
    pub fn is_blocking(self) -> bool {
        self >= ConsequenceKind::Disallow
    }

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            ConsequenceKind::Tag => "tag",
            ConsequenceKind::Warn => "warn",
            ConsequenceKind::Throttle => "throttle",
            ConsequenceKind::Disallow => "disallow",
            ConsequenceKind::RangeBlock => "rangeblock",
            ConsequenceKind::Degroup => "degroup",
            ConsequenceKind::Block => "block",
        }
    }
}

impl fmt::Display for ConsequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A consequence with its kind-specific parameters
///
/// Parameters stay schemaless JSON (tag names, block durations, warn
/// message keys); the executor contract interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consequence {
    /// What kind of side effect to apply
    pub kind: ConsequenceKind,
    /// Kind-specific parameters
    #[serde(default)]
    pub params: serde_json::Value,
}

impl Consequence {
    /// A consequence with no parameters
    pub fn new(kind: ConsequenceKind) -> Self {
        Self {
            kind,
            params: serde_json::Value::Null,
        }
    }

    /// A consequence with parameters
    pub fn with_params(kind: ConsequenceKind, params: serde_json::Value) -> Self {
        Self { kind, params }
    }
}

/// A stored filter: source text, lifecycle flags and consequence list
///
/// Filters are read-mostly: the runner never mutates them, and their ASTs
/// live in the shared expression cache keyed by source hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    /// Identity and scope
    pub id: FilterId,
    /// The boolean expression in filter syntax
    pub source: String,
    /// Whether the filter currently runs
    pub enabled: bool,
    /// Soft-deleted filters are kept for history but never run
    pub deleted: bool,
    /// Hidden filters have their source restricted to privileged viewers
    pub hidden: bool,
    /// Event group the filter runs against (e.g. `"default"`)
    pub group: String,
    /// Consequences applied on match, in stored order
    pub consequences: Vec<Consequence>,
}

impl Filter {
    /// An enabled filter in the default group with no consequences
    pub fn new(id: FilterId, source: impl Into<String>) -> Self {
        Self {
            id,
            source: source.into(),
            enabled: true,
            deleted: false,
            hidden: false,
            group: "default".to_string(),
            consequences: Vec::new(),
        }
    }

    /// Append a consequence
    pub fn with_consequence(mut self, consequence: Consequence) -> Self {
        self.consequences.push(consequence);
        self
    }

    /// Set the event group
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Mark the filter disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Whether the runner should evaluate this filter
    pub fn is_active(&self) -> bool {
        self.enabled && !self.deleted
    }

    /// Whether any consequence is a blocking tier
    pub fn has_blocking_consequence(&self) -> bool {
        self.consequences.iter().any(|c| c.kind.is_blocking())
    }
}
