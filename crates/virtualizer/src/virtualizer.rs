//! The virtualizer's per-frame algorithm (`spec.md` §4.5 steps 1-7),
//! grounded on `core-render::scheduler::RenderScheduler`'s mark/consume
//! shape for the signal queue and `core-render::dirty::DirtyLinesTracker`'s
//! one-shot-consumption pattern for the per-frame "must render" set.

use viewer_ast::RenderWindow;
use viewer_instance::InstanceId;

use crate::anchor::{capture_anchor, restore_delta, ScrollAnchor};
use crate::clock::FrameClock;
use crate::error::VirtualizerError;
use crate::instance_trait::VirtualInstance;
use crate::signals::{DomDirty, InstanceIdSet};
use crate::window::{create_window_from_scroll_position, in_window, ScrollMetrics};

/// What a completed frame did, handed back to the host so it can apply the
/// scroll fix and schedule measurement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameOutcome {
    pub updated: Vec<InstanceId>,
    /// `spec.md` §4.5 "Scroll fix": the amount the host should adjust
    /// `scrollTop` by, synchronously, to keep the anchor row fixed on
    /// screen. Zero when nothing needs correcting.
    pub scroll_delta: f64,
    pub scheduled_another_frame: bool,
}

/// Coordinates scroll, intersection, and resize signals for a set of
/// instances sharing one scroll container (`spec.md` §4.5).
#[derive(Debug)]
pub struct Virtualizer {
    overscan: f64,
    dom_dirty: DomDirty,
    instances_changed: InstanceIdSet,
    visible_set_dirty: bool,
    pending_visibility: Vec<(InstanceId, bool)>,
    last_window: Option<RenderWindow>,
    last_visible_snapshot: Vec<InstanceId>,
}

impl Virtualizer {
    pub fn new(overscan: f64) -> Self {
        Self {
            overscan,
            dom_dirty: DomDirty::default(),
            instances_changed: InstanceIdSet::new(),
            visible_set_dirty: false,
            pending_visibility: Vec::new(),
            last_window: None,
            last_visible_snapshot: Vec::new(),
        }
    }

    pub fn mark_scroll_dirty(&mut self) {
        self.dom_dirty.scroll_dirty = true;
    }

    pub fn mark_height_dirty(&mut self) {
        self.dom_dirty.height_dirty = true;
    }

    pub fn mark_scroll_height_dirty(&mut self) {
        self.dom_dirty.scroll_height_dirty = true;
    }

    /// `spec.md` §4.5 "Intersection change on an instance's host element":
    /// records the visibility flip to apply at the start of the next frame
    /// and marks the visible set dirty so the early-exit check in step 3
    /// doesn't skip recomputing it.
    pub fn mark_visibility(&mut self, id: InstanceId, visible: bool) {
        self.pending_visibility.push((id, visible));
        self.visible_set_dirty = true;
    }

    /// `spec.md` §4.5 `instanceChanged`.
    pub fn instance_changed(&mut self, id: InstanceId) {
        self.instances_changed.mark(id);
    }

    /// `spec.md` §4.5 "Cancellation": disconnecting host observers is the
    /// host's job; this clears everything this crate owns.
    pub fn cleanup(&mut self) {
        self.dom_dirty.clear();
        self.instances_changed.clear();
        self.visible_set_dirty = false;
        self.pending_visibility.clear();
        self.last_window = None;
        self.last_visible_snapshot.clear();
    }

    /// Runs one frame. `measure` is called once per updated instance,
    /// after the scroll fix, to fetch the real measured row heights the
    /// host just read back from its DOM (step 6's `reconcileHeights`
    /// input) — a library crate has nothing to measure on its own.
    pub fn run_frame(
        &mut self,
        clock: &mut dyn FrameClock,
        instances: &mut [&mut dyn VirtualInstance],
        scroll_metrics: ScrollMetrics,
        measure: &mut dyn FnMut(InstanceId) -> Vec<(usize, bool, f64)>,
    ) -> Result<FrameOutcome, VirtualizerError> {
        for (id, visible) in self.pending_visibility.drain(..) {
            if let Some(instance) = instances.iter_mut().find(|i| i.id() == id) {
                instance.set_visibility(visible);
            }
        }

        // Step 1.
        let anchor: Option<ScrollAnchor> = {
            let refs: Vec<&dyn VirtualInstance> = instances.iter().map(|i| &**i).collect();
            capture_anchor(&refs, scroll_metrics.scroll_top)
        };

        // Step 2: a real host recomputes scrollTop/height/scrollHeight from
        // its own DOM behind these flags; this crate only has what the
        // host already passed in as `scroll_metrics`, so `dom_dirty` here
        // only decides the wrapper-dirty flag forwarded to `onRender`.
        let wrapper_dirty = self.dom_dirty.any();
        self.dom_dirty.clear();

        let instances_changed_ids = self.instances_changed.take();
        let window = create_window_from_scroll_position(scroll_metrics, self.overscan);

        let visible_now: Vec<InstanceId> = instances
            .iter()
            .filter(|i| i.is_visible() && in_window(i.file_top(), i.file_height(), window))
            .map(|i| i.id())
            .collect();

        // Step 3.
        if instances_changed_ids.is_empty()
            && !self.visible_set_dirty
            && !wrapper_dirty
            && self.last_window == Some(window)
            && self.last_visible_snapshot == visible_now
        {
            tracing::trace!("frame early-exit: nothing changed since last window");
            return Ok(FrameOutcome::default());
        }
        self.visible_set_dirty = false;
        tracing::trace!(visible = visible_now.len(), changed = instances_changed_ids.len(), "frame scheduling render pass");

        // Step 4.
        let mut updated = Vec::new();
        for instance in instances.iter_mut() {
            if visible_now.contains(&instance.id()) {
                let mutated = instance
                    .on_render(wrapper_dirty, window)
                    .map_err(|source| VirtualizerError::InstanceRender { instance: instance.id(), source })?;
                if mutated {
                    updated.push(instance.id());
                }
            }
        }
        for instance in instances.iter_mut() {
            let id = instance.id();
            if instances_changed_ids.contains(&id) && !updated.contains(&id) {
                let mutated = instance
                    .on_render(wrapper_dirty, window)
                    .map_err(|source| VirtualizerError::InstanceRender { instance: id, source })?;
                if mutated {
                    updated.push(id);
                }
            }
        }

        // Step 5.
        let scroll_delta = anchor
            .as_ref()
            .map(|a| {
                let refs: Vec<&dyn VirtualInstance> = instances.iter().map(|i| &**i).collect();
                restore_delta(a, &refs)
            })
            .unwrap_or(0.0);

        // Step 6.
        let mut any_height_changed = false;
        for instance in instances.iter_mut() {
            let id = instance.id();
            if updated.contains(&id) {
                let measured = measure(id);
                if instance.reconcile_heights(&measured) {
                    any_height_changed = true;
                }
            }
        }

        self.last_window = Some(window);
        self.last_visible_snapshot = visible_now;

        // Step 7.
        let scheduled_another_frame = any_height_changed || wrapper_dirty;
        if scheduled_another_frame {
            clock.request_frame();
        }

        Ok(FrameOutcome { updated, scroll_delta, scheduled_another_frame })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::CountingClock;
    use viewer_ast::{ContentRow, LineIndex};

    struct Stub {
        id: InstanceId,
        file_top: f64,
        file_height: f64,
        visible: bool,
        render_calls: usize,
        mutates: bool,
        height_changed: bool,
    }

    impl VirtualInstance for Stub {
        fn id(&self) -> InstanceId {
            self.id
        }
        fn file_top(&self) -> f64 {
            self.file_top
        }
        fn file_height(&self) -> f64 {
            self.file_height
        }
        fn is_visible(&self) -> bool {
            self.visible
        }
        fn set_visibility(&mut self, visible: bool) {
            self.visible = visible;
        }
        fn on_render(&mut self, _forced: bool, _window: RenderWindow) -> Result<bool, anyhow::Error> {
            self.render_calls += 1;
            Ok(self.mutates)
        }
        fn reconcile_heights(&mut self, _measured: &[(usize, bool, f64)]) -> bool {
            self.height_changed
        }
        fn topmost_data_row(&self) -> Option<LineIndex> {
            None
        }
        fn row_offset_from_top(&self, _target: LineIndex) -> Option<f64> {
            None
        }
        fn mounted_rows(&self) -> &[ContentRow] {
            &[]
        }
    }

    fn metrics() -> ScrollMetrics {
        ScrollMetrics::new(0.0, 800.0, 5000.0)
    }

    #[test]
    fn first_frame_renders_visible_instances() {
        let mut v = Virtualizer::new(200.0);
        let mut a = Stub { id: InstanceId(1), file_top: 0.0, file_height: 400.0, visible: true, render_calls: 0, mutates: true, height_changed: false };
        let mut clock = CountingClock::new();
        let mut instances: Vec<&mut dyn VirtualInstance> = vec![&mut a];
        let outcome = v
            .run_frame(&mut clock, &mut instances, metrics(), &mut |_| Vec::new())
            .unwrap();
        assert_eq!(outcome.updated, vec![InstanceId(1)]);
        assert_eq!(a.render_calls, 1);
    }

    #[test]
    fn second_identical_frame_exits_early() {
        let mut v = Virtualizer::new(200.0);
        let mut a = Stub { id: InstanceId(1), file_top: 0.0, file_height: 400.0, visible: true, render_calls: 0, mutates: false, height_changed: false };
        let mut clock = CountingClock::new();
        {
            let mut instances: Vec<&mut dyn VirtualInstance> = vec![&mut a];
            v.run_frame(&mut clock, &mut instances, metrics(), &mut |_| Vec::new()).unwrap();
        }
        let calls_after_first = a.render_calls;
        {
            let mut instances: Vec<&mut dyn VirtualInstance> = vec![&mut a];
            v.run_frame(&mut clock, &mut instances, metrics(), &mut |_| Vec::new()).unwrap();
        }
        assert_eq!(a.render_calls, calls_after_first, "second frame with nothing changed should not re-render");
    }

    #[test]
    fn instance_changed_forces_render_even_when_out_of_window() {
        let mut v = Virtualizer::new(200.0);
        let mut a = Stub { id: InstanceId(1), file_top: 50_000.0, file_height: 400.0, visible: true, render_calls: 0, mutates: false, height_changed: false };
        v.instance_changed(InstanceId(1));
        let mut clock = CountingClock::new();
        let mut instances: Vec<&mut dyn VirtualInstance> = vec![&mut a];
        v.run_frame(&mut clock, &mut instances, metrics(), &mut |_| Vec::new()).unwrap();
        assert_eq!(a.render_calls, 1);
    }

    #[test]
    fn height_change_schedules_another_frame() {
        let mut v = Virtualizer::new(200.0);
        let mut a = Stub { id: InstanceId(1), file_top: 0.0, file_height: 400.0, visible: true, render_calls: 0, mutates: true, height_changed: true };
        let mut clock = CountingClock::new();
        let mut instances: Vec<&mut dyn VirtualInstance> = vec![&mut a];
        let outcome = v.run_frame(&mut clock, &mut instances, metrics(), &mut |_| Vec::new()).unwrap();
        assert!(outcome.scheduled_another_frame);
        assert_eq!(clock.requests, 1);
    }

    #[test]
    fn cleanup_resets_state_so_next_frame_is_treated_as_first() {
        let mut v = Virtualizer::new(200.0);
        let mut a = Stub { id: InstanceId(1), file_top: 0.0, file_height: 400.0, visible: true, render_calls: 0, mutates: false, height_changed: false };
        let mut clock = CountingClock::new();
        {
            let mut instances: Vec<&mut dyn VirtualInstance> = vec![&mut a];
            v.run_frame(&mut clock, &mut instances, metrics(), &mut |_| Vec::new()).unwrap();
        }
        v.cleanup();
        let calls_before = a.render_calls;
        {
            let mut instances: Vec<&mut dyn VirtualInstance> = vec![&mut a];
            v.run_frame(&mut clock, &mut instances, metrics(), &mut |_| Vec::new()).unwrap();
        }
        assert_eq!(a.render_calls, calls_before + 1, "after cleanup the next frame must not early-exit");
    }
}
