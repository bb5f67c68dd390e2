//! The per-event variable container

use super::alias;
use super::computed::{ComputeRegistry, ComputedVariable};
use crate::model::{Value, ValueError};
use indexmap::IndexMap;
use log::{debug, warn};
use rustc_hash::{FxBuildHasher, FxHashSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Internal bookkeeping names never exported to filter authors or logs
pub const EXPORT_DENYLIST: &[&str] = &["global_log_ids", "local_log_ids"];

/// Variable names that have been retired; reads yield `Undefined` with a
/// warning so filters referencing them can be found and fixed
const DISABLED_VARS: &[&str] = &["old_text", "old_html", "minor_edit"];

/// Errors raised by container operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VarError {
    /// A lazy descriptor referenced a method tag the registry does not know
    #[error("no computation registered for method '{method}'")]
    UnknownMethod {
        /// The unknown method tag
        method: String,
    },

    /// A computed variable depended, directly or transitively, on itself
    #[error("cyclic computation detected while resolving variable '{name}'")]
    CyclicComputation {
        /// The variable whose resolution re-entered itself
        name: String,
    },

    /// A value operation failed while exporting or resolving
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// One container slot: either a resolved value or a deferred computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VarEntry {
    /// A materialized value
    Resolved(Value),
    /// A descriptor resolved on first read, then memoized in place
    Lazy(ComputedVariable),
}

/// Which naming generation the stored keys use
///
/// `Legacy` containers were built from variable dumps that predate the
/// great rename; lookups by current name are translated back through the
/// alias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamesVersion {
    /// Keys use the current variable names
    Current,
    /// Keys use the pre-rename variable names
    Legacy,
}

/// Case-insensitive, insertion-ordered mapping from variable name to fact
///
/// Lazy entries resolve through the attached [`ComputeRegistry`] on first
/// read and are replaced in place, so repeated reads are O(1) and free of
/// side effects. Reading an unset, non-denylisted name yields `Undefined`
/// rather than an error, so filters may reference facts that do not apply
/// to the current event type.
#[derive(Debug, Clone, Default)]
pub struct VariableHolder {
    vars: IndexMap<String, VarEntry, FxBuildHasher>,
    names_version: Option<NamesVersion>,
    registry: Arc<ComputeRegistry>,
    in_progress: FxHashSet<String>,
}

impl VariableHolder {
    /// Create an empty container using current variable names
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty container wired to a compute registry
    pub fn with_registry(registry: Arc<ComputeRegistry>) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    /// Replace the compute registry
    pub fn set_registry(&mut self, registry: Arc<ComputeRegistry>) {
        self.registry = registry;
    }

    /// Mark which naming generation the stored keys use
    pub fn set_names_version(&mut self, version: NamesVersion) {
        self.names_version = Some(version);
    }

    /// The naming generation of this container (current if never set)
    pub fn names_version(&self) -> NamesVersion {
        self.names_version.unwrap_or(NamesVersion::Current)
    }

    /// Set a resolved variable; names are case-insensitive
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.vars
            .insert(name.to_lowercase(), VarEntry::Resolved(value.into()));
    }

    /// Register a deferred computation under the given name
    pub fn set_lazy(&mut self, name: &str, descriptor: ComputedVariable) {
        self.vars
            .insert(name.to_lowercase(), VarEntry::Lazy(descriptor));
    }

    /// Whether the name is present (resolved or lazy)
    pub fn is_set(&self, name: &str) -> bool {
        self.vars.contains_key(&self.storage_key(name))
    }

    /// Variable names currently stored, in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    /// Read a variable, resolving and memoizing a lazy entry
    ///
    /// Unset names yield `Undefined`. A lazy computation that re-enters the
    /// same name fails fast with [`VarError::CyclicComputation`].
    pub fn get(&mut self, name: &str) -> Result<Value, VarError> {
        let key = self.storage_key(name);
        match self.vars.get(&key) {
            Some(VarEntry::Resolved(value)) => Ok(value.clone()),
            Some(VarEntry::Lazy(descriptor)) => {
                let descriptor = descriptor.clone();
                if self.in_progress.contains(&key) {
                    return Err(VarError::CyclicComputation { name: key });
                }
                self.in_progress.insert(key.clone());
                let registry = Arc::clone(&self.registry);
                let result = registry.compute(&descriptor, self);
                self.in_progress.remove(&key);
                let value = result?;
                debug!("resolved lazy variable '{key}' via '{}'", descriptor.method);
                self.vars
                    .insert(key, VarEntry::Resolved(value.clone()));
                Ok(value)
            }
            None => {
                if DISABLED_VARS.contains(&key.as_str()) {
                    warn!(
                        "disabled variable '{key}' requested; the referencing filter should be fixed"
                    );
                }
                Ok(Value::Undefined)
            }
        }
    }

    /// Merge any number of containers into a new one; later values win on
    /// name collision
    pub fn merge(holders: impl IntoIterator<Item = VariableHolder>) -> VariableHolder {
        let mut merged = VariableHolder::new();
        merged.add_holders(holders);
        merged
    }

    /// Fold other containers into this one; later values win
    pub fn add_holders(&mut self, holders: impl IntoIterator<Item = VariableHolder>) {
        for holder in holders {
            for (name, entry) in holder.vars {
                self.vars.insert(name, entry);
            }
        }
    }

    /// Export every non-denylisted variable as a string, resolving lazy
    /// entries on the way
    pub fn export_all(&mut self) -> Result<IndexMap<String, String>, VarError> {
        let names: Vec<String> = self
            .vars
            .keys()
            .filter(|name| !EXPORT_DENYLIST.contains(&name.as_str()))
            .cloned()
            .collect();
        let mut exported = IndexMap::new();
        for name in names {
            let value = self.get(&name)?;
            exported.insert(name, export_string(&value)?);
        }
        Ok(exported)
    }

    /// Export only already-resolved, non-denylisted variables as strings
    pub fn export_non_lazy(&self) -> Result<IndexMap<String, String>, VarError> {
        let mut exported = IndexMap::new();
        for (name, entry) in &self.vars {
            if EXPORT_DENYLIST.contains(&name.as_str()) {
                continue;
            }
            if let VarEntry::Resolved(value) = entry {
                exported.insert(name.clone(), export_string(value)?);
            }
        }
        Ok(exported)
    }

    /// Dump variables in their native JSON types
    ///
    /// With `compute_all`, lazy entries are resolved and included; otherwise
    /// only already-resolved entries appear. Denylisted names never appear.
    pub fn dump_all(
        &mut self,
        compute_all: bool,
    ) -> Result<serde_json::Map<String, serde_json::Value>, VarError> {
        let names: Vec<String> = self
            .vars
            .iter()
            .filter(|(name, entry)| {
                !EXPORT_DENYLIST.contains(&name.as_str())
                    && (compute_all || matches!(entry, VarEntry::Resolved(_)))
            })
            .map(|(name, _)| name.clone())
            .collect();
        let mut dumped = serde_json::Map::new();
        for name in names {
            let value = self.get(&name)?;
            dumped.insert(name, value.to_json());
        }
        Ok(dumped)
    }

    /// Eagerly resolve every descriptor that needs external data access
    ///
    /// Used before a container crosses a persistence boundary, so the stored
    /// dump can be replayed without database access.
    pub fn compute_db_backed(&mut self) -> Result<(), VarError> {
        let names: Vec<String> = self
            .vars
            .iter()
            .filter(|(_, entry)| {
                matches!(entry, VarEntry::Lazy(cv) if cv.needs_external_data())
            })
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            self.get(&name)?;
        }
        Ok(())
    }

    /// The storage key for a lookup name, accounting for legacy naming
    fn storage_key(&self, name: &str) -> String {
        let name = name.to_lowercase();
        if self.names_version() == NamesVersion::Legacy {
            if let Some(legacy) = alias::legacy_name(&name) {
                return legacy.to_string();
            }
        }
        name
    }
}

/// String form for exports; an unresolved `Undefined` exports as empty
/// rather than tripping the cast contract
fn export_string(value: &Value) -> Result<String, VarError> {
    match value {
        Value::Undefined => Ok(String::new()),
        other => Ok(other.as_str()?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_registry(counter: Arc<AtomicUsize>) -> Arc<ComputeRegistry> {
        let mut registry = ComputeRegistry::new();
        registry.register("expensive-fact", move |_cv, _holder| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Str("computed".into()))
        });
        Arc::new(registry)
    }

    #[test]
    fn names_are_case_insensitive() {
        let mut holder = VariableHolder::new();
        holder.set("New_Wikitext", "spam");
        assert_eq!(holder.get("NEW_WIKITEXT").unwrap(), Value::Str("spam".into()));
        assert!(holder.is_set("new_wikitext"));
    }

    #[test]
    fn unset_names_yield_undefined() {
        let mut holder = VariableHolder::new();
        assert_eq!(holder.get("file_size").unwrap(), Value::Undefined);
    }

    #[test]
    fn lazy_resolution_is_memoized() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut holder = VariableHolder::with_registry(counting_registry(Arc::clone(&counter)));
        holder.set_lazy(
            "page_age",
            ComputedVariable::new("expensive-fact", serde_json::json!({})),
        );
        assert_eq!(holder.get("page_age").unwrap(), Value::Str("computed".into()));
        assert_eq!(holder.get("page_age").unwrap(), Value::Str("computed".into()));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cyclic_computation_fails_fast() {
        let mut registry = ComputeRegistry::new();
        registry.register("self-referential", |_cv, holder| holder.get("loop_var"));
        let mut holder = VariableHolder::with_registry(Arc::new(registry));
        holder.set_lazy(
            "loop_var",
            ComputedVariable::new("self-referential", serde_json::Value::Null),
        );
        assert!(matches!(
            holder.get("loop_var"),
            Err(VarError::CyclicComputation { .. })
        ));
    }

    #[test]
    fn lazy_computation_may_read_other_variables() {
        let mut registry = ComputeRegistry::new();
        registry.register("derived", |_cv, holder| {
            let base = holder.get("new_wikitext")?;
            Ok(Value::Int(base.as_str()?.len() as i64))
        });
        let mut holder = VariableHolder::with_registry(Arc::new(registry));
        holder.set("new_wikitext", "spam");
        holder.set_lazy("new_size", ComputedVariable::new("derived", serde_json::Value::Null));
        assert_eq!(holder.get("new_size").unwrap(), Value::Int(4));
    }

    #[test]
    fn merge_later_wins() {
        let mut user_facts = VariableHolder::new();
        user_facts.set("user_name", "alice");
        user_facts.set("shared", 1i64);
        let mut action_facts = VariableHolder::new();
        action_facts.set("shared", 2i64);
        let mut merged = VariableHolder::merge([user_facts, action_facts]);
        assert_eq!(merged.get("user_name").unwrap(), Value::Str("alice".into()));
        assert_eq!(merged.get("shared").unwrap(), Value::Int(2));
    }

    #[test]
    fn denylisted_names_are_never_exported() {
        let mut holder = VariableHolder::new();
        holder.set("global_log_ids", vec![Value::Int(1)]);
        holder.set("user_name", "bob");
        let exported = holder.export_all().unwrap();
        assert!(!exported.contains_key("global_log_ids"));
        assert_eq!(exported.get("user_name"), Some(&"bob".to_string()));
        let dumped = holder.dump_all(true).unwrap();
        assert!(!dumped.contains_key("global_log_ids"));
    }

    #[test]
    fn export_non_lazy_skips_descriptors() {
        let mut holder = VariableHolder::new();
        holder.set("user_name", "carol");
        holder.set_lazy(
            "page_age",
            ComputedVariable::new("page-age", serde_json::json!({"title": "X"})),
        );
        let exported = holder.export_non_lazy().unwrap();
        assert!(exported.contains_key("user_name"));
        assert!(!exported.contains_key("page_age"));
    }

    #[test]
    fn compute_db_backed_resolves_only_tagged_methods() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_db = Arc::clone(&hits);
        let mut registry = ComputeRegistry::new();
        registry.register("user-age", move |_cv, _holder| {
            hits_db.fetch_add(1, Ordering::SeqCst);
            Ok(Value::Int(30))
        });
        registry.register("parse-wikitext", |_cv, _holder| {
            panic!("non-db-backed descriptor must stay lazy")
        });
        let mut holder = VariableHolder::with_registry(Arc::new(registry));
        holder.set_lazy("user_age", ComputedVariable::new("user-age", serde_json::Value::Null));
        holder.set_lazy(
            "new_html",
            ComputedVariable::new("parse-wikitext", serde_json::Value::Null),
        );
        holder.compute_db_backed().unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(holder.get("user_age").unwrap(), Value::Int(30));
    }

    #[test]
    fn legacy_names_resolve_through_the_alias_table() {
        let mut legacy = VariableHolder::new();
        legacy.set_names_version(NamesVersion::Legacy);
        legacy.set("article_text", "Sandbox");
        let mut current = VariableHolder::new();
        current.set("page_title", "Sandbox");
        assert_eq!(
            legacy.get("page_title").unwrap(),
            current.get("page_title").unwrap()
        );
        // Unrenamed names pass straight through on legacy containers
        legacy.set("user_name", "dave");
        assert_eq!(legacy.get("user_name").unwrap(), Value::Str("dave".into()));
    }
}
