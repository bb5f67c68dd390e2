//! Legacy variable-name aliasing
//!
//! Variables were renamed once (`article_*` became `page_*`, move targets
//! gained `_title`/`_id` forms). Containers built from stored dumps that
//! predate the rename carry the old names; the alias table lets `get` map a
//! current name back to its legacy storage key. Current-version containers
//! never consult it.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

/// legacy name -> current name
static CURRENT_BY_LEGACY: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    let pairs = [
        ("article_text", "page_title"),
        ("article_prefixedtext", "page_prefixedtitle"),
        ("article_namespace", "page_namespace"),
        ("article_articleid", "page_id"),
        ("article_restrictions_edit", "page_restrictions_edit"),
        ("article_restrictions_move", "page_restrictions_move"),
        ("article_restrictions_create", "page_restrictions_create"),
        ("article_restrictions_upload", "page_restrictions_upload"),
        ("article_recent_contributors", "page_recent_contributors"),
        ("article_first_contributor", "page_first_contributor"),
        ("moved_from_text", "moved_from_title"),
        ("moved_from_prefixedtext", "moved_from_prefixedtitle"),
        ("moved_from_articleid", "moved_from_id"),
        ("moved_to_text", "moved_to_title"),
        ("moved_to_prefixedtext", "moved_to_prefixedtitle"),
        ("moved_to_articleid", "moved_to_id"),
    ];
    pairs.iter().copied().collect()
});

/// current name -> legacy name
static LEGACY_BY_CURRENT: Lazy<FxHashMap<&'static str, &'static str>> = Lazy::new(|| {
    CURRENT_BY_LEGACY.iter().map(|(l, c)| (*c, *l)).collect()
});

/// The current name for a legacy variable name, if it was renamed
pub fn current_name(legacy: &str) -> Option<&'static str> {
    CURRENT_BY_LEGACY.get(legacy).copied()
}

/// The legacy name for a current variable name, if it had one
pub fn legacy_name(current: &str) -> Option<&'static str> {
    LEGACY_BY_CURRENT.get(current).copied()
}
