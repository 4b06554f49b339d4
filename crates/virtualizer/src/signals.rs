//! Per-frame dirty-signal bookkeeping (`spec.md` §4.5 "Signals"). Mirrors
//! `core-render::dirty::DirtyLinesTracker`'s mark-then-one-shot-consume
//! shape: producers push freely during a frame, the virtualizer drains and
//! dedupes once per frame rather than deduping on every mark.

use viewer_instance::InstanceId;

/// The three DOM-derived-quantity dirty flags from `spec.md` §4.5 step 2,
/// each gating its own lazy recomputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomDirty {
    pub scroll_dirty: bool,
    pub height_dirty: bool,
    pub scroll_height_dirty: bool,
}

impl DomDirty {
    pub fn any(&self) -> bool {
        self.scroll_dirty || self.height_dirty || self.scroll_height_dirty
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// An append-only set of `InstanceId`s marked during a frame, deduped only
/// when drained — the same "push now, unique-sort-on-consume" discipline
/// `DirtyLinesTracker` uses for buffer line indices.
#[derive(Debug, Default)]
pub struct InstanceIdSet {
    ids: Vec<InstanceId>,
}

impl InstanceIdSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark(&mut self, id: InstanceId) {
        self.ids.push(id);
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Unique, insertion-ordered ids, clearing the set in the process.
    pub fn take(&mut self) -> Vec<InstanceId> {
        if self.ids.is_empty() {
            return Vec::new();
        }
        let mut seen = Vec::with_capacity(self.ids.len());
        for id in self.ids.drain(..) {
            if !seen.contains(&id) {
                seen.push(id);
            }
        }
        seen
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.ids.contains(&id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_id_set_dedups_on_take() {
        let mut set = InstanceIdSet::new();
        set.mark(InstanceId(1));
        set.mark(InstanceId(2));
        set.mark(InstanceId(1));
        let out = set.take();
        assert_eq!(out, vec![InstanceId(1), InstanceId(2)]);
        assert!(set.is_empty());
    }

    #[test]
    fn dom_dirty_any_and_clear() {
        let mut dirty = DomDirty::default();
        assert!(!dirty.any());
        dirty.scroll_dirty = true;
        assert!(dirty.any());
        dirty.clear();
        assert!(!dirty.any());
    }
}
