//! Per-event variable containers
//!
//! A [`VariableHolder`] is the bag of facts one event is filtered against.
//! Facts are either resolved [`Value`](crate::model::Value)s or lazy
//! [`ComputedVariable`] descriptors that an external fact provider knows how
//! to materialize through a [`ComputeRegistry`]. Resolution is memoized, so
//! a fact referenced by several filters is computed at most once.

pub mod alias;
pub mod computed;
pub mod container;

pub use computed::{ComputeRegistry, ComputedVariable, DB_BACKED_METHODS};
pub use container::{NamesVersion, VarEntry, VarError, VariableHolder, EXPORT_DENYLIST};
