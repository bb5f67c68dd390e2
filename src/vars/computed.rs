//! Lazy computed-variable descriptors and their resolution registry

use super::container::{VarError, VariableHolder};
use crate::model::Value;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Method tags whose computation requires external data access
///
/// `compute_db_backed` resolves exactly these eagerly, so a container can be
/// persisted across a process boundary without carrying live descriptors
/// that would need a database to replay.
pub const DB_BACKED_METHODS: &[&str] = &[
    "links-from-wikitext-or-database",
    "load-recent-authors",
    "page-age",
    "get-page-restrictions",
    "simple-user-accessor",
    "user-age",
    "user-groups",
    "user-rights",
    "revision-text-by-id",
    "revision-text-by-timestamp",
];

/// A deferred fact: a method tag plus parameters, resolved on first access
///
/// Descriptors are plain data (no embedded closures) so containers stay
/// serializable for stash reuse. The registry maps the tag to the actual
/// computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedVariable {
    /// Registry tag identifying the computation (e.g. `"page-age"`)
    pub method: String,
    /// Computation parameters, shape defined by the method
    pub params: serde_json::Value,
}

impl ComputedVariable {
    /// Create a descriptor for the given method tag and parameters
    pub fn new(method: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            method: method.into(),
            params,
        }
    }

    /// Whether resolving this descriptor requires external data access
    pub fn needs_external_data(&self) -> bool {
        DB_BACKED_METHODS.contains(&self.method.as_str())
    }
}

/// Resolution callback for one method tag
///
/// The callback receives the descriptor and the holder it is being resolved
/// for, so a computation may read other variables (cycles are rejected by
/// the holder).
pub type ComputeFn =
    dyn Fn(&ComputedVariable, &mut VariableHolder) -> Result<Value, VarError> + Send + Sync;

/// Registry of computations keyed by method tag
///
/// Built by the external fact provider and shared by every holder of one
/// runner context.
#[derive(Clone, Default)]
pub struct ComputeRegistry {
    methods: FxHashMap<String, Arc<ComputeFn>>,
}

impl ComputeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a computation for a method tag, replacing any previous one
    pub fn register<F>(&mut self, method: impl Into<String>, f: F)
    where
        F: Fn(&ComputedVariable, &mut VariableHolder) -> Result<Value, VarError>
            + Send
            + Sync
            + 'static,
    {
        self.methods.insert(method.into(), Arc::new(f));
    }

    /// Whether the registry knows the given method tag
    pub fn knows(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Resolve a descriptor against a holder
    pub fn compute(
        &self,
        descriptor: &ComputedVariable,
        holder: &mut VariableHolder,
    ) -> Result<Value, VarError> {
        match self.methods.get(&descriptor.method) {
            Some(f) => f(descriptor, holder),
            None => Err(VarError::UnknownMethod {
                method: descriptor.method.clone(),
            }),
        }
    }
}

impl std::fmt::Debug for ComputeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeRegistry")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
