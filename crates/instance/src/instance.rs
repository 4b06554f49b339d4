//! The two windowed-file-instance variants (`spec.md` §4.3): `FileInstance`
//! wraps a plain file, `FileDiffInstance` wraps a diff and additionally owns
//! the expansion map. Both share the render-decision, height-reconciliation,
//! and error-panel-fallback logic below rather than duplicating it, per the
//! "two variants of a common interface" option `spec.md` §9 leaves open.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use viewer_ast::{Ast, Column, ColumnSide, ContentRow, GutterCell, LineIndex, RenderRange, RenderWindow, RowLineType, StyledSpan, VirtualFileMetrics};
use viewer_diff::{DiffStyle, Expansion, ExpandDirection, ExpandedRegions, FileContents, FileDiff};
use viewer_reconcile::{apply_partial_render, MountedAst, RangeRenderer, ReconcileError};
use viewer_render::{FileRenderer, InstanceId, RenderOutcome};

use crate::config::ViewerConfig;
use crate::error::InstanceError;
use crate::height::HeightCache;
use crate::range::{
    approximate_diff_height, approximate_file_height, count_visible_lines, derive_diff_render_range,
    derive_file_render_range, FileGeometry,
};

/// Mark-based dirty tracking for the render decision table (`spec.md` §4.3
/// "Render decision"), grounded on the same mark/consume shape
/// `core-render::scheduler::RenderScheduler` uses rather than on structural
/// equality checks — `RenderOptions` isn't `PartialEq` (it can carry a
/// closure), so setters mark dirty explicitly instead.
#[derive(Debug, Clone, Copy, Default)]
struct RenderDirty {
    source_changed: bool,
    options_changed: bool,
    annotations_changed: bool,
    forced_rebuild: bool,
}

impl RenderDirty {
    fn any(&self) -> bool {
        self.source_changed || self.options_changed || self.annotations_changed || self.forced_rebuild
    }

    /// True only when nothing but the range itself could have changed —
    /// the precondition for attempting a partial render.
    fn only_range_may_have_changed(&self) -> bool {
        !self.any()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Walks one mounted column's rows, accumulating pixel height the same way
/// `range::walk_diff` does, until it reaches `target`'s row. Returns `None`
/// if `target` isn't currently mounted — the caller falls back to the file
/// top, matching `spec.md` §4.5's anchor fallback.
fn row_offset_in_column(
    column: &MountedColumn,
    heights: &HeightCache,
    metrics: &VirtualFileMetrics,
    starting_line: usize,
    target: LineIndex,
) -> Option<f64> {
    let mut cursor = 0.0f64;
    let mut view_line = starting_line;
    let mut rows = column.content.iter().peekable();
    while let Some(row) = rows.next() {
        match row {
            ContentRow::Data { line_index, .. } => {
                if *line_index == target {
                    return Some(cursor);
                }
                let has_metadata = matches!(
                    rows.peek(),
                    Some(ContentRow::NoNewline { .. }) | Some(ContentRow::Annotation { .. })
                );
                cursor += heights.get_line_height(view_line, has_metadata, metrics);
                view_line += 1;
            }
            ContentRow::Buffer { buffer_size } => cursor += *buffer_size as f64,
            ContentRow::Separator { .. } => cursor += metrics.hunk_separator_height,
            ContentRow::NoNewline { .. } | ContentRow::Annotation { .. } => {}
        }
    }
    None
}

/// The topmost mounted data row's `LineIndex`, if any — the candidate a
/// scroll anchor capture starts from.
fn topmost_data_row(mounted: &MountedAst) -> Option<LineIndex> {
    let column = mounted.columns.first()?;
    column.content.iter().find_map(|row| match row {
        ContentRow::Data { line_index, .. } => Some(*line_index),
        _ => None,
    })
}

fn error_panel(message: &str) -> Ast {
    let mut column = Column::new(ColumnSide::Unified);
    column.gutter.push(GutterCell::Spacer {
        kind: viewer_ast::GutterBufferKind::Metadata,
        buffer_size: 1,
    });
    column.content.push(ContentRow::Data {
        line_index: LineIndex { unified: 0, split: 0 },
        line_type: RowLineType::Context,
        spans: vec![StyledSpan::styled(message.to_string(), "viewer-error-panel")],
    });
    Ast::new(vec![column])
}

struct DiffRangeAdapter<'a> {
    renderer: &'a mut FileRenderer,
    diff: Arc<FileDiff>,
}

impl RangeRenderer for DiffRangeAdapter<'_> {
    fn render_range(&mut self, range: RenderRange) -> Result<Ast, ReconcileError> {
        match self.renderer.render_diff(self.diff.clone(), Some(range)) {
            Ok(RenderOutcome::Ready(ast)) => Ok(ast),
            Ok(RenderOutcome::Pending) => Err(ReconcileError::RenderFailed("highlight not ready".into())),
            Err(err) => Err(ReconcileError::RenderFailed(err.to_string())),
        }
    }
}

struct FileRangeAdapter<'a> {
    renderer: &'a mut FileRenderer,
    file: Arc<FileContents>,
}

impl RangeRenderer for FileRangeAdapter<'_> {
    fn render_range(&mut self, range: RenderRange) -> Result<Ast, ReconcileError> {
        match self.renderer.render_file(self.file.clone(), Some(range)) {
            Ok(RenderOutcome::Ready(ast)) => Ok(ast),
            Ok(RenderOutcome::Pending) => Err(ReconcileError::RenderFailed("highlight not ready".into())),
            Err(err) => Err(ReconcileError::RenderFailed(err.to_string())),
        }
    }
}

/// One on-screen *file-diff* host element's rendering lifecycle.
pub struct FileDiffInstance {
    id: InstanceId,
    renderer: FileRenderer,
    config: ViewerConfig,
    metrics: VirtualFileMetrics,
    heights: HeightCache,
    expanded_regions: ExpandedRegions,
    dirty: RenderDirty,
    enabled: bool,
    visible: bool,
    fail_fast: bool,
    has_function_valued_separator: bool,
    current_style: DiffStyle,
    current_source: Option<Arc<FileDiff>>,
    last_render_range: Option<RenderRange>,
    mounted: Option<MountedAst>,
    approximate_height: f64,
    last_row_count: usize,
}

impl FileDiffInstance {
    pub fn new(id: InstanceId, config: ViewerConfig, metrics: VirtualFileMetrics) -> Self {
        Self {
            id,
            renderer: FileRenderer::new(id),
            config,
            metrics,
            heights: HeightCache::new(),
            expanded_regions: ExpandedRegions::new(),
            dirty: RenderDirty::default(),
            enabled: true,
            visible: true,
            fail_fast: false,
            has_function_valued_separator: false,
            current_style: DiffStyle::Unified,
            current_source: None,
            last_render_range: None,
            mounted: None,
            approximate_height: 0.0,
            last_row_count: 0,
        }
    }

    pub fn renderer_mut(&mut self) -> &mut FileRenderer {
        &mut self.renderer
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn set_fail_fast(&mut self, fail_fast: bool) {
        self.fail_fast = fail_fast;
    }

    pub fn set_options(&mut self, options: viewer_render::RenderOptions) {
        self.has_function_valued_separator = options.has_function_valued_hunk_separator();
        self.renderer.set_options(options);
        self.dirty.options_changed = true;
    }

    pub fn set_line_annotations(&mut self, annotations: viewer_render::LineAnnotations) {
        self.renderer.set_line_annotations(annotations);
        self.dirty.annotations_changed = true;
    }

    /// `spec.md` §4.3 `expandHunk`: updates the expansion map, clears cached
    /// height expectations, and forces the next render to rebuild fully.
    pub fn expand_hunk(&mut self, hunk_index: usize, direction: ExpandDirection) {
        let amount = self.config.file.expansion_line_count;
        // region_size isn't known without re-walking the diff; `expand`
        // saturates the reveal at whatever the region turns out to hold, so
        // passing `amount` as an upper bound here is sound even though it
        // isn't the true region size.
        self.expanded_regions.expand(hunk_index, direction, amount, amount);
        self.heights.clear();
        self.dirty.forced_rebuild = true;
        trace!(instance = self.id.0, hunk_index, ?direction, "expanded hunk");
    }

    pub fn approximate_height(&self) -> f64 {
        self.approximate_height
    }

    pub fn last_row_count(&self) -> usize {
        self.last_row_count
    }

    /// `spec.md` §4.3 `setVisibility`: swaps to a placeholder on hide,
    /// renders normally again on show.
    pub fn set_visibility(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.dirty.forced_rebuild = true;
        } else {
            self.mounted = Some(MountedAst::from_ast(placeholder_ast(self.approximate_height)));
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn mounted(&self) -> Option<&MountedAst> {
        self.mounted.as_ref()
    }

    /// `spec.md` §4.5 scroll-anchor capture: the topmost currently-mounted
    /// data row, if any.
    pub fn topmost_data_row(&self) -> Option<LineIndex> {
        self.mounted.as_ref().and_then(topmost_data_row)
    }

    /// `spec.md` §4.5 scroll-anchor capture/restore: `target`'s pixel offset
    /// from this instance's own content top, or `None` if it isn't mounted.
    pub fn row_offset_from_top(&self, target: LineIndex) -> Option<f64> {
        let mounted = self.mounted.as_ref()?;
        let column = mounted.columns.first()?;
        let starting_line = self.last_render_range.map(|r| r.starting_line).unwrap_or(0);
        row_offset_in_column(column, &self.heights, &self.metrics, starting_line, target)
    }

    /// `spec.md` §4.3 `render`: idempotent, returns `true` iff the DOM was
    /// mutated this call.
    pub fn render(
        &mut self,
        diff: Arc<FileDiff>,
        style: DiffStyle,
        geometry: FileGeometry,
        window: RenderWindow,
    ) -> Result<bool, InstanceError> {
        if !self.enabled {
            return Err(InstanceError::RenderAfterCleanup);
        }
        if !self.visible {
            return Ok(false);
        }

        self.current_style = style;
        let threshold = self.config.file.collapsed_context_threshold;

        let source_changed = self.current_source.as_ref().map(|s| !Arc::ptr_eq(s, &diff)).unwrap_or(true);
        if source_changed {
            self.dirty.source_changed = true;
            self.current_source = Some(diff.clone());
        }

        let total_file_lines = count_visible_lines(&diff, style, &self.expanded_regions, threshold)
            .map_err(viewer_render::RenderError::from)?;
        self.approximate_height = approximate_diff_height(
            &diff,
            style,
            &Expansion::Map(&self.expanded_regions),
            threshold,
            &self.heights,
            &self.metrics,
            geometry,
        )
        .map_err(viewer_render::RenderError::from)?;

        let next_range = derive_diff_render_range(
            &diff,
            style,
            &self.expanded_regions,
            threshold,
            &self.heights,
            &self.metrics,
            geometry,
            window,
            total_file_lines,
        )
        .map_err(viewer_render::RenderError::from)?;

        if !self.dirty.any() && self.last_render_range == Some(next_range) {
            return Ok(false);
        }

        let can_attempt_partial = self.dirty.only_range_may_have_changed()
            && !self.has_function_valued_separator
            && self.mounted.is_some()
            && self
                .last_render_range
                .map(|r| r.total_lines.map(|t| t > 0).unwrap_or(false))
                .unwrap_or(false);

        let mutated = if can_attempt_partial {
            let prev = self.last_render_range.unwrap();
            let mounted = self.mounted.as_mut().expect("checked above");
            let mut adapter = DiffRangeAdapter {
                renderer: &mut self.renderer,
                diff: diff.clone(),
            };
            match apply_partial_render(mounted, prev, next_range, &mut adapter) {
                Ok(true) => true,
                Ok(false) => {
                    debug!(instance = self.id.0, "partial render inapplicable, falling back to full");
                    self.full_rebuild_diff(diff.clone(), next_range)?
                }
                Err(err) => {
                    warn!(instance = self.id.0, %err, "partial render failed, falling back to full");
                    self.full_rebuild_diff(diff.clone(), next_range)?
                }
            }
        } else {
            self.full_rebuild_diff(diff.clone(), next_range)?
        };

        self.last_render_range = Some(next_range);
        self.last_row_count = self.mounted.as_ref().map(|m| m.row_total()).unwrap_or(0);
        self.dirty.clear();
        Ok(mutated)
    }

    fn full_rebuild_diff(&mut self, diff: Arc<FileDiff>, range: RenderRange) -> Result<bool, InstanceError> {
        match self.renderer.render_diff(diff, Some(range)) {
            Ok(RenderOutcome::Ready(ast)) => {
                self.mounted = Some(MountedAst::from_ast(ast));
                Ok(true)
            }
            Ok(RenderOutcome::Pending) => Ok(false),
            Err(err) => {
                if self.fail_fast {
                    return Err(InstanceError::Render(err));
                }
                warn!(instance = self.id.0, %err, "render failed, showing error panel");
                self.mounted = Some(MountedAst::from_ast(error_panel(&err.to_string())));
                Ok(true)
            }
        }
    }

    /// `spec.md` §4.3 `onRender`: called by the virtualizer once per frame
    /// the instance needs to consider.
    pub fn on_render(
        &mut self,
        dirty: bool,
        diff: Arc<FileDiff>,
        style: DiffStyle,
        geometry: FileGeometry,
        window: RenderWindow,
    ) -> Result<bool, InstanceError> {
        if dirty {
            self.dirty.forced_rebuild = true;
        }
        self.render(diff, style, geometry, window)
    }

    /// `spec.md` §4.3 `reconcileHeights`: idempotent when called twice
    /// without an intervening render.
    pub fn reconcile_heights(&mut self, measured: &[(usize, bool, f64)]) -> bool {
        let before = self.heights.clone();
        for &(view_index, has_metadata, height) in measured {
            self.heights.record(view_index, has_metadata, height, &self.metrics);
        }
        before != self.heights
    }

    /// `spec.md` §7 kind 4: cleanup is idempotent; calling it twice is a
    /// no-op the second time.
    pub fn cleanup(&mut self) {
        if !self.enabled {
            return;
        }
        self.renderer.cleanup();
        self.mounted = None;
        self.last_render_range = None;
        self.current_source = None;
        self.enabled = false;
        debug!(instance = self.id.0, "instance cleaned up");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

fn placeholder_ast(height_px: f64) -> Ast {
    let mut column = Column::new(ColumnSide::Unified);
    column.content.push(ContentRow::Buffer {
        buffer_size: height_px.max(0.0) as usize,
    });
    Ast::new(vec![column])
}

/// One on-screen plain-file host element's rendering lifecycle — the "fast
/// path" variant, since a file's line height is uniform and total-line
/// counting never needs the diff iterator.
pub struct FileInstance {
    id: InstanceId,
    renderer: FileRenderer,
    metrics: VirtualFileMetrics,
    heights: HeightCache,
    dirty: RenderDirty,
    enabled: bool,
    visible: bool,
    fail_fast: bool,
    has_function_valued_separator: bool,
    current_source: Option<Arc<FileContents>>,
    last_render_range: Option<RenderRange>,
    mounted: Option<MountedAst>,
    approximate_height: f64,
    last_row_count: usize,
}

impl FileInstance {
    pub fn new(id: InstanceId, metrics: VirtualFileMetrics) -> Self {
        Self {
            id,
            renderer: FileRenderer::new(id),
            metrics,
            heights: HeightCache::new(),
            dirty: RenderDirty::default(),
            enabled: true,
            visible: true,
            fail_fast: false,
            has_function_valued_separator: false,
            current_source: None,
            last_render_range: None,
            mounted: None,
            approximate_height: 0.0,
            last_row_count: 0,
        }
    }

    pub fn renderer_mut(&mut self) -> &mut FileRenderer {
        &mut self.renderer
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn set_fail_fast(&mut self, fail_fast: bool) {
        self.fail_fast = fail_fast;
    }

    pub fn set_options(&mut self, options: viewer_render::RenderOptions) {
        self.has_function_valued_separator = options.has_function_valued_hunk_separator();
        self.renderer.set_options(options);
        self.dirty.options_changed = true;
    }

    pub fn approximate_height(&self) -> f64 {
        self.approximate_height
    }

    pub fn last_row_count(&self) -> usize {
        self.last_row_count
    }

    pub fn set_visibility(&mut self, visible: bool) {
        if visible == self.visible {
            return;
        }
        self.visible = visible;
        if visible {
            self.dirty.forced_rebuild = true;
        } else {
            self.mounted = Some(MountedAst::from_ast(placeholder_ast(self.approximate_height)));
        }
    }

    pub fn mounted(&self) -> Option<&MountedAst> {
        self.mounted.as_ref()
    }

    pub fn topmost_data_row(&self) -> Option<LineIndex> {
        self.mounted.as_ref().and_then(topmost_data_row)
    }

    pub fn row_offset_from_top(&self, target: LineIndex) -> Option<f64> {
        let mounted = self.mounted.as_ref()?;
        let column = mounted.columns.first()?;
        let starting_line = self.last_render_range.map(|r| r.starting_line).unwrap_or(0);
        row_offset_in_column(column, &self.heights, &self.metrics, starting_line, target)
    }

    pub fn render(&mut self, file: Arc<FileContents>, geometry: FileGeometry, window: RenderWindow) -> Result<bool, InstanceError> {
        if !self.enabled {
            return Err(InstanceError::RenderAfterCleanup);
        }
        if !self.visible {
            return Ok(false);
        }

        let source_changed = self.current_source.as_ref().map(|s| !Arc::ptr_eq(s, &file)).unwrap_or(true);
        if source_changed {
            self.dirty.source_changed = true;
            self.current_source = Some(file.clone());
        }

        let total_lines = file.line_count();
        self.approximate_height = approximate_file_height(total_lines, geometry, &self.metrics);
        let next_range = derive_file_render_range(geometry, window, total_lines, &self.metrics);

        if !self.dirty.any() && self.last_render_range == Some(next_range) {
            return Ok(false);
        }

        let can_attempt_partial = self.dirty.only_range_may_have_changed()
            && !self.has_function_valued_separator
            && self.mounted.is_some()
            && self
                .last_render_range
                .map(|r| r.total_lines.map(|t| t > 0).unwrap_or(false))
                .unwrap_or(false);

        let mutated = if can_attempt_partial {
            let prev = self.last_render_range.unwrap();
            let mounted = self.mounted.as_mut().expect("checked above");
            let mut adapter = FileRangeAdapter {
                renderer: &mut self.renderer,
                file: file.clone(),
            };
            match apply_partial_render(mounted, prev, next_range, &mut adapter) {
                Ok(true) => true,
                Ok(false) => self.full_rebuild_file(file.clone(), next_range)?,
                Err(err) => {
                    warn!(instance = self.id.0, %err, "partial render failed, falling back to full");
                    self.full_rebuild_file(file.clone(), next_range)?
                }
            }
        } else {
            self.full_rebuild_file(file.clone(), next_range)?
        };

        self.last_render_range = Some(next_range);
        self.last_row_count = self.mounted.as_ref().map(|m| m.row_total()).unwrap_or(0);
        self.dirty.clear();
        Ok(mutated)
    }

    /// `spec.md` §4.3 `onRender`, mirroring `FileDiffInstance::on_render`.
    pub fn on_render(
        &mut self,
        dirty: bool,
        file: Arc<FileContents>,
        geometry: FileGeometry,
        window: RenderWindow,
    ) -> Result<bool, InstanceError> {
        if dirty {
            self.dirty.forced_rebuild = true;
        }
        self.render(file, geometry, window)
    }

    fn full_rebuild_file(&mut self, file: Arc<FileContents>, range: RenderRange) -> Result<bool, InstanceError> {
        match self.renderer.render_file(file, Some(range)) {
            Ok(RenderOutcome::Ready(ast)) => {
                self.mounted = Some(MountedAst::from_ast(ast));
                Ok(true)
            }
            Ok(RenderOutcome::Pending) => Ok(false),
            Err(err) => {
                if self.fail_fast {
                    return Err(InstanceError::Render(err));
                }
                warn!(instance = self.id.0, %err, "render failed, showing error panel");
                self.mounted = Some(MountedAst::from_ast(error_panel(&err.to_string())));
                Ok(true)
            }
        }
    }

    pub fn reconcile_heights(&mut self, measured: &[(usize, bool, f64)]) -> bool {
        let before = self.heights.clone();
        for &(view_index, has_metadata, height) in measured {
            self.heights.record(view_index, has_metadata, height, &self.metrics);
        }
        before != self.heights
    }

    pub fn cleanup(&mut self) {
        if !self.enabled {
            return;
        }
        self.renderer.cleanup();
        self.mounted = None;
        self.last_render_range = None;
        self.current_source = None;
        self.enabled = false;
        debug!(instance = self.id.0, "instance cleaned up");
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}
