use viewer_ast::{Ast, RenderRange};

use crate::options::CacheFingerprint;

/// Tracks the render cache's notion of "which source object this is",
/// distinct from the highlight cache's content-identity key: this one is
/// pointer/allocation identity, matching `spec.md` §4.2's "source object
/// identity" invalidation trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceIdentity(pub usize);

impl SourceIdentity {
    pub fn of<T>(arc: &std::sync::Arc<T>) -> Self {
        Self(std::sync::Arc::as_ptr(arc) as *const () as usize)
    }
}

/// The renderer's one-entry-per-instance cache (`spec.md` §4.2 `renderCache`).
pub struct RenderCacheEntry {
    pub source_identity: SourceIdentity,
    pub fingerprint: CacheFingerprint,
    pub highlighted: bool,
    pub result: Ast,
    pub render_range: Option<RenderRange>,
}

impl RenderCacheEntry {
    /// A plain-text result depends on the window (only the windowed
    /// substring was tokenized), so it is reusable only for an identical
    /// range; a fully highlighted result is computed once over the whole
    /// file/diff and indexed by line, so it is reusable for any range.
    pub fn satisfies(
        &self,
        source_identity: SourceIdentity,
        fingerprint: &CacheFingerprint,
        range: Option<RenderRange>,
    ) -> bool {
        if self.source_identity != source_identity || &self.fingerprint != fingerprint {
            return false;
        }
        if self.highlighted {
            true
        } else {
            self.render_range == range
        }
    }
}
