//! Stash cache for speculative pre-save evaluations

use super::status::RunResult;
use lru::LruCache;
use parking_lot::Mutex;
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

/// How long a stashed result stays replayable
pub const DEFAULT_STASH_TTL: Duration = Duration::from_secs(30);

/// Default number of stashed results
pub const DEFAULT_STASH_CAPACITY: usize = 256;

/// Identity of a speculative evaluation: who is saving what, where
///
/// The content enters as a hash so keys stay small regardless of edit size.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StashKey {
    user: String,
    title: String,
    content_hash: u64,
}

impl StashKey {
    /// Key for a user's pending edit to a title
    pub fn new(user: &str, title: &str, content: &str) -> Self {
        let mut hasher = FxHasher::default();
        content.hash(&mut hasher);
        Self {
            user: user.to_string(),
            title: title.to_string(),
            content_hash: hasher.finish(),
        }
    }
}

struct StashEntry {
    result: RunResult,
    stored_at: Instant,
}

/// Bounded, TTL-limited cache of stash-mode run results
///
/// A pre-save evaluation stores here; the real save shortly after replays
/// the hit instead of re-evaluating. Entries past the TTL are dropped on
/// access.
pub struct StashCache {
    inner: Mutex<LruCache<StashKey, StashEntry>>,
    ttl: Duration,
}

impl StashCache {
    /// A cache with the given capacity and entry TTL
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
            ttl,
        }
    }

    /// Store a stash-mode result under its identity key
    pub fn store(&self, key: StashKey, result: RunResult) {
        self.inner.lock().put(
            key,
            StashEntry {
                result,
                stored_at: Instant::now(),
            },
        );
    }

    /// Take the result for a key if present and still fresh
    ///
    /// A hit is consumed: one stashed evaluation backs at most one save.
    pub fn take(&self, key: &StashKey) -> Option<RunResult> {
        let mut cache = self.inner.lock();
        let entry = cache.pop(key)?;
        if entry.stored_at.elapsed() > self.ttl {
            return None;
        }
        Some(entry.result)
    }

    /// Number of stashed results, including possibly expired ones
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the stash is empty
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl Default for StashCache {
    fn default() -> Self {
        Self::new(DEFAULT_STASH_CAPACITY, DEFAULT_STASH_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_distinguish_user_title_and_content() {
        let base = StashKey::new("alice", "Sandbox", "hello");
        assert_eq!(base, StashKey::new("alice", "Sandbox", "hello"));
        assert_ne!(base, StashKey::new("bob", "Sandbox", "hello"));
        assert_ne!(base, StashKey::new("alice", "Main", "hello"));
        assert_ne!(base, StashKey::new("alice", "Sandbox", "hello!"));
    }

    #[test]
    fn hits_are_consumed() {
        let cache = StashCache::default();
        let key = StashKey::new("alice", "Sandbox", "hello");
        cache.store(key.clone(), RunResult::default());
        assert!(cache.take(&key).is_some());
        assert!(cache.take(&key).is_none());
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = StashCache::new(8, Duration::ZERO);
        let key = StashKey::new("alice", "Sandbox", "hello");
        cache.store(key.clone(), RunResult::default());
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.take(&key).is_none());
    }
}
