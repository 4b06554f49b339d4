use ahash::{AHashMap, AHasher};
use std::hash::{Hash, Hasher};

use crate::HighlightResult;

/// Identifies one cached highlight result. When the source carries a
/// `stable_key` that is used directly; otherwise the source text itself is
/// hashed, matching the fallback the renderer uses for cache-invalidation by
/// content identity (`viewer-diff::FileContents` doc comment).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    source_identity: SourceIdentity,
    theme: String,
    lang: Option<String>,
    tokenize_max_line_length: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SourceIdentity {
    Stable(String),
    ContentHash(u64),
}

impl CacheKey {
    pub fn new(
        stable_key: Option<&str>,
        source: &str,
        theme: impl Into<String>,
        lang: Option<String>,
        tokenize_max_line_length: Option<usize>,
    ) -> Self {
        let source_identity = match stable_key {
            Some(key) => SourceIdentity::Stable(key.to_string()),
            None => {
                let mut hasher = AHasher::default();
                source.hash(&mut hasher);
                SourceIdentity::ContentHash(hasher.finish())
            }
        };
        Self {
            source_identity,
            theme: theme.into(),
            lang,
            tokenize_max_line_length,
        }
    }
}

/// Process-wide highlight result cache. One instance is typically shared
/// across `viewer-render`'s per-instance render caches, since fully
/// highlighted results are keyed by content rather than by render call.
#[derive(Debug, Default)]
pub struct HighlightCache {
    entries: AHashMap<CacheKey, HighlightResult>,
}

impl HighlightCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<&HighlightResult> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: CacheKey, result: HighlightResult) {
        self.entries.insert(key, result);
    }

    pub fn invalidate(&mut self, key: &CacheKey) {
        self.entries.remove(key);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_key_identity_is_independent_of_content() {
        let a = CacheKey::new(Some("file-1"), "fn a() {}", "dark", None, None);
        let b = CacheKey::new(Some("file-1"), "fn a() { /* edited */ }", "dark", None, None);
        assert_eq!(a, b);
    }

    #[test]
    fn content_hash_identity_distinguishes_edits() {
        let a = CacheKey::new(None, "fn a() {}", "dark", None, None);
        let b = CacheKey::new(None, "fn a() { }", "dark", None, None);
        assert_ne!(a, b);
    }

    #[test]
    fn theme_change_is_a_distinct_key() {
        let a = CacheKey::new(Some("file-1"), "fn a() {}", "dark", None, None);
        let b = CacheKey::new(Some("file-1"), "fn a() {}", "light", None, None);
        assert_ne!(a, b);

        let mut cache = HighlightCache::new();
        cache.insert(a.clone(), HighlightResult::default());
        assert!(cache.get(&a).is_some());
        assert!(cache.get(&b).is_none());
    }
}
