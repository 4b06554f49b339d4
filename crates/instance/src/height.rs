//! Per-line measured-height cache and the approximate-total-height algorithm
//! (`spec.md` §4.3 "Approximate height").

use ahash::AHashMap;

use viewer_ast::VirtualFileMetrics;

/// Sparse view-space-line-index → measured-pixel-height map. A line is only
/// ever inserted when its measured height differs from the metrics default,
/// exactly as `spec.md` §3 "Height cache" specifies — most lines never touch
/// this map at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeightCache {
    measured: AHashMap<usize, f64>,
}

impl HeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached measured height, or the metrics default — doubled
    /// when the row carries a metadata sibling (an annotation or "no newline
    /// at EOF" marker), per `spec.md` §3's `getLineHeight` note.
    pub fn get_line_height(&self, view_index: usize, has_metadata: bool, metrics: &VirtualFileMetrics) -> f64 {
        self.measured.get(&view_index).copied().unwrap_or_else(|| {
            if has_metadata {
                metrics.line_height * 2.0
            } else {
                metrics.line_height
            }
        })
    }

    /// Records a measured height, but only keeps it if it actually differs
    /// from what `get_line_height` would already have returned — this keeps
    /// the map sparse across repeated idempotent `reconcile_heights` calls.
    pub fn record(&mut self, view_index: usize, has_metadata: bool, measured: f64, metrics: &VirtualFileMetrics) {
        let default = if has_metadata {
            metrics.line_height * 2.0
        } else {
            metrics.line_height
        };
        if (measured - default).abs() < f64::EPSILON {
            self.measured.remove(&view_index);
        } else {
            self.measured.insert(view_index, measured);
        }
    }

    pub fn clear(&mut self) {
        self.measured.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.measured.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> VirtualFileMetrics {
        VirtualFileMetrics::default()
    }

    #[test]
    fn uncached_line_falls_back_to_default_or_doubled() {
        let cache = HeightCache::new();
        let m = metrics();
        assert_eq!(cache.get_line_height(0, false, &m), m.line_height);
        assert_eq!(cache.get_line_height(0, true, &m), m.line_height * 2.0);
    }

    #[test]
    fn recording_the_default_height_does_not_grow_the_cache() {
        let mut cache = HeightCache::new();
        let m = metrics();
        cache.record(5, false, m.line_height, &m);
        assert!(cache.is_empty());
    }

    #[test]
    fn recording_a_differing_height_is_returned_on_lookup() {
        let mut cache = HeightCache::new();
        let m = metrics();
        cache.record(5, false, 37.0, &m);
        assert_eq!(cache.get_line_height(5, false, &m), 37.0);
    }
}
