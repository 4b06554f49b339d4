//! Scroll-container geometry and window computation (`spec.md` §4.5
//! "Window"). Kept a free-function/plain-struct module, the same
//! arithmetic-only shape `viewer-ast::geometry` and `viewer-instance::range`
//! use for their own windowing math.

use viewer_ast::RenderWindow;

/// The three DOM-derived quantities the virtualizer recomputes lazily,
/// clamped so `scroll_top` can never exceed the scrollable range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub height: f64,
    pub scroll_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, height: f64, scroll_height: f64) -> Self {
        let max_scroll = (scroll_height - height).max(0.0);
        Self {
            scroll_top: scroll_top.clamp(0.0, max_scroll),
            height,
            scroll_height,
        }
    }
}

/// `createWindowFromScrollPosition`: expands `[scrollTop, scrollTop+height)`
/// by `overscan` on both sides when the scroll range permits, otherwise
/// centers the window over the whole scrollable content.
pub fn create_window_from_scroll_position(metrics: ScrollMetrics, overscan: f64) -> RenderWindow {
    if metrics.scroll_height <= metrics.height + overscan * 2.0 {
        // The scrollable content is too short to expand by the full overscan
        // on both sides without running off the content entirely; centering
        // just means showing the whole scrollable range.
        let window = RenderWindow::new(0.0, metrics.scroll_height.max(metrics.height));
        tracing::trace!(top = window.top, bottom = window.bottom, "window recompute: showing whole range");
        return window;
    }

    let viewport_top = metrics.scroll_top;
    let viewport_bottom = metrics.scroll_top + metrics.height;
    let top = (viewport_top - overscan).max(0.0);
    let bottom = (viewport_bottom + overscan).min(metrics.scroll_height);
    let window = RenderWindow::new(top, bottom);
    tracing::trace!(top = window.top, bottom = window.bottom, "window recompute: expanded by overscan");
    window
}

/// `spec.md` §4.5 "Window": an instance is in-window iff
/// `fileTop >= top - fileHeight && fileTop <= bottom`.
pub fn in_window(file_top: f64, file_height: f64, window: RenderWindow) -> bool {
    file_top >= window.top - file_height && file_top <= window.bottom
}
