//! Shared cache of parsed filter ASTs
//!
//! Keyed by a content hash of the filter source, so an unedited filter is
//! parsed once per cache lifetime. The cache is owned by the runner's
//! construction context and passed explicitly; there is no process-wide
//! static.

use crate::ast::Expr;
use crate::parser::{parse, ParseError};
use log::debug;
use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Default number of cached ASTs
pub const DEFAULT_CACHE_CAPACITY: usize = 1000;

/// Content hash of a filter source text
pub fn hash_source(source: &str) -> u64 {
    let mut hasher = FxHasher::default();
    source.hash(&mut hasher);
    hasher.finish()
}

/// LRU cache of parsed filter expressions
pub struct ExpressionCache {
    inner: Mutex<LruCache<u64, Arc<Expr>>>,
}

impl ExpressionCache {
    /// Create a cache holding up to `capacity` parsed expressions
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fetch the AST for the given source, parsing on a miss
    pub fn get_or_parse(&self, source: &str) -> Result<Arc<Expr>, ParseError> {
        let key = hash_source(source);
        let mut cache = self.inner.lock();
        if let Some(ast) = cache.get(&key) {
            debug!("expression cache hit for {key:#x}");
            return Ok(Arc::clone(ast));
        }
        drop(cache);

        let ast = Arc::new(parse(source)?);
        self.inner.lock().put(key, Arc::clone(&ast));
        Ok(ast)
    }

    /// Invalidation hook: drop every cached expression
    pub fn purge(&self) {
        self.inner.lock().clear();
    }

    /// Number of cached expressions
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for ExpressionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_by_content() {
        let cache = ExpressionCache::new(10);
        let a = cache.get_or_parse("1 + 2").unwrap();
        let b = cache.get_or_parse("1 + 2").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
        cache.get_or_parse("2 + 1").unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn parse_errors_are_not_cached() {
        let cache = ExpressionCache::new(10);
        assert!(cache.get_or_parse("1 +").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_empties_the_cache() {
        let cache = ExpressionCache::new(10);
        cache.get_or_parse("true").unwrap();
        cache.purge();
        assert!(cache.is_empty());
    }
}
