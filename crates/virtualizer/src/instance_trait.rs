//! The seam the virtualizer drives a heterogeneous collection of instances
//! through. `viewer-instance` deliberately keeps `FileInstance` and
//! `FileDiffInstance` as two standalone structs rather than behind a shared
//! trait (their `render` signatures differ by source type); the host is the
//! party that knows each instance's current source and its position in the
//! shared scroll container, so the host implements this trait over a small
//! adapter wrapping one instance plus that per-frame context.

use viewer_ast::{ContentRow, LineIndex, RenderWindow};
use viewer_instance::InstanceId;

/// One instance as the virtualizer needs to see it for one frame.
pub trait VirtualInstance {
    fn id(&self) -> InstanceId;

    /// This instance's absolute top/height in the shared scroll container's
    /// coordinate space, as laid out by the host.
    fn file_top(&self) -> f64;
    fn file_height(&self) -> f64;

    fn is_visible(&self) -> bool;
    fn set_visibility(&mut self, visible: bool);

    /// `spec.md` §4.3 `onRender`: `forced` mirrors the wrapper-dirty flag
    /// the virtualizer passes down; `window` is this frame's render window.
    /// Returns whether the call mutated the mounted DOM stand-in.
    fn on_render(&mut self, forced: bool, window: RenderWindow) -> Result<bool, anyhow::Error>;

    /// `spec.md` §4.3 `reconcileHeights`.
    fn reconcile_heights(&mut self, measured: &[(usize, bool, f64)]) -> bool;

    /// The topmost currently-mounted data row, for scroll-anchor capture.
    fn topmost_data_row(&self) -> Option<LineIndex>;

    /// `target`'s pixel offset from this instance's own content top, or
    /// `None` if it isn't currently mounted.
    fn row_offset_from_top(&self, target: LineIndex) -> Option<f64>;

    /// Mirrors `viewer_instance`'s error-panel fallback output for
    /// inspection; unused by the core algorithm but handy for hosts that
    /// want to read back what's on screen without depending on
    /// `viewer-reconcile` directly.
    fn mounted_rows(&self) -> &[ContentRow];
}
