//! Render-range derivation (`spec.md` §4.3 steps 1-6) and the approximate
//! total-height algorithm that feeds it. The diff variant walks the diff
//! iterator to build `hunk_offsets`; the file variant takes the "fast path"
//! the spec calls out explicitly, since a file's line height is uniform and
//! the whole thing reduces to arithmetic.

use viewer_ast::{RenderRange, RenderWindow, VirtualFileMetrics};
use viewer_diff::{DiffError, DiffStyle, Expansion, ExpandedRegions, FileDiff};

use crate::height::HeightCache;

/// This file's/diff's absolute position in the shared scroll container, as
/// tracked by the virtualizer and handed to the instance every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FileGeometry {
    pub file_top: f64,
    pub file_height: f64,
    pub header_region: f64,
}

/// Step 1, shared by both variants: a file with no intersection with the
/// window gets an empty range with the bottom buffer absorbing its whole
/// height.
fn outside_window(geometry: FileGeometry, window: RenderWindow) -> Option<RenderRange> {
    let file_bottom = geometry.file_top + geometry.file_height;
    if file_bottom < window.top || geometry.file_top > window.bottom {
        Some(RenderRange::new(0, Some(0)).with_buffers(
            0.0,
            (geometry.file_height - geometry.header_region).max(0.0),
        ))
    } else {
        None
    }
}

/// The file (non-diff) variant's render-range derivation: a pure-arithmetic
/// fast path since `lineHeight` is known-uniform for plain files.
pub fn derive_file_render_range(
    geometry: FileGeometry,
    window: RenderWindow,
    total_lines: usize,
    metrics: &VirtualFileMetrics,
) -> RenderRange {
    if let Some(range) = outside_window(geometry, window) {
        return range;
    }

    if total_lines <= metrics.hunk_line_count {
        return RenderRange::new(0, Some(metrics.hunk_line_count));
    }

    let target = metrics.align_up(((window.bottom - window.top) / metrics.line_height).ceil() as usize)
        + metrics.hunk_line_count;
    let total_lines_window = target.min(total_lines.max(1));

    let content_top = geometry.file_top + geometry.header_region;
    let center_px = (window.top + window.bottom) / 2.0 - content_top;
    let center_line = (center_px / metrics.line_height).round().max(0.0) as usize;

    let max_start = total_lines.saturating_sub(total_lines_window);
    let ideal_start = center_line.saturating_sub(total_lines_window / 2);
    let start_line = ideal_start.min(max_start);

    let buffer_before = start_line as f64 * metrics.line_height;
    let end_line = (start_line + total_lines_window).min(total_lines);
    let buffer_after = ((total_lines - end_line) as f64 * metrics.line_height - metrics.file_gap).max(0.0);

    RenderRange::new(start_line, Some(total_lines_window)).with_buffers(buffer_before, buffer_after)
}

/// Approximate total height of a plain file: uniform line height plus the
/// header region and trailing gap (the file fast path never needs per-line
/// iteration to estimate height).
pub fn approximate_file_height(total_lines: usize, geometry: FileGeometry, metrics: &VirtualFileMetrics) -> f64 {
    geometry.header_region + total_lines as f64 * metrics.line_height + metrics.file_gap
}

/// One `hunkLineCount`-aligned quantum boundary recorded while walking the
/// diff: `offset_px` is the cursor's pixel position when this boundary was
/// reached, `view_line` the view-space line index it starts at.
#[derive(Debug, Clone, Copy, PartialEq)]
struct QuantumBoundary {
    view_line: usize,
    offset_px: f64,
}

/// Walks the diff once via the §4.1 iterator, summing row heights into an
/// approximate total height and recording a `QuantumBoundary` at every
/// `hunk_line_count`-aligned view-space position.
fn walk_diff(
    diff: &FileDiff,
    style: DiffStyle,
    expansion: &Expansion<'_>,
    collapsed_context_threshold: usize,
    heights: &HeightCache,
    metrics: &VirtualFileMetrics,
    geometry: FileGeometry,
) -> Result<(f64, Vec<QuantumBoundary>), DiffError> {
    let mut cursor = geometry.file_top + geometry.header_region;
    let mut boundaries = vec![QuantumBoundary {
        view_line: 0,
        offset_px: cursor,
    }];
    let mut view_line = 0usize;

    viewer_diff::iterate(diff, style, None, expansion, collapsed_context_threshold, &mut |record| {
        if record.collapsed_before > 0 {
            cursor += metrics.hunk_separator_height;
        }
        let has_metadata = record
            .deletion_line
            .map(|m| m.no_eof_cr)
            .unwrap_or(false)
            || record.addition_line.map(|m| m.no_eof_cr).unwrap_or(false);
        cursor += heights.get_line_height(view_line, has_metadata, metrics);
        view_line += 1;
        if record.collapsed_after > 0 {
            cursor += metrics.hunk_separator_height;
        }
        if metrics.hunk_line_count > 0 && view_line % metrics.hunk_line_count == 0 {
            boundaries.push(QuantumBoundary {
                view_line,
                offset_px: cursor,
            });
        }
        false
    })?;

    cursor += metrics.file_gap;
    Ok((cursor - geometry.file_top, boundaries))
}

/// Approximate total height of a diff: `diffHeaderHeight` (already folded
/// into `geometry.header_region` by the caller) plus every emitted row's
/// height plus separator gaps plus the trailing `fileGap`.
pub fn approximate_diff_height(
    diff: &FileDiff,
    style: DiffStyle,
    expansion: &Expansion<'_>,
    collapsed_context_threshold: usize,
    heights: &HeightCache,
    metrics: &VirtualFileMetrics,
    geometry: FileGeometry,
) -> Result<f64, DiffError> {
    let (height, _) = walk_diff(diff, style, expansion, collapsed_context_threshold, heights, metrics, geometry)?;
    Ok(height)
}

/// Total number of view-space rows the current expansion state would emit,
/// used by step 2 ("visible line count <= hunkLineCount").
pub fn count_visible_lines(
    diff: &FileDiff,
    style: DiffStyle,
    expansion: &ExpandedRegions,
    collapsed_context_threshold: usize,
) -> Result<usize, DiffError> {
    let mut count = 0usize;
    viewer_diff::iterate(
        diff,
        style,
        None,
        &Expansion::Map(expansion),
        collapsed_context_threshold,
        &mut |_| {
            count += 1;
            false
        },
    )?;
    Ok(count)
}

/// The diff variant's render-range derivation: steps 1-6 in full, using the
/// quantum boundaries `walk_diff` already computed as a by-product of height
/// estimation. `total_file_lines` is `count_visible_lines`'s result.
#[allow(clippy::too_many_arguments)]
pub fn derive_diff_render_range(
    diff: &FileDiff,
    style: DiffStyle,
    expansion: &ExpandedRegions,
    collapsed_context_threshold: usize,
    heights: &HeightCache,
    metrics: &VirtualFileMetrics,
    geometry: FileGeometry,
    window: RenderWindow,
    total_file_lines: usize,
) -> Result<RenderRange, DiffError> {
    if let Some(range) = outside_window(geometry, window) {
        return Ok(range);
    }

    if total_file_lines <= metrics.hunk_line_count {
        return Ok(RenderRange::new(0, Some(metrics.hunk_line_count)));
    }

    let target = metrics.align_up(((window.bottom - window.top) / metrics.line_height).ceil() as usize)
        + metrics.hunk_line_count;

    let (_, boundaries) =
        walk_diff(diff, style, &Expansion::Map(expansion), collapsed_context_threshold, heights, metrics, geometry)?;

    let total_hunks = (target / metrics.hunk_line_count.max(1)).max(1);

    let first_visible_hunk = boundaries
        .iter()
        .position(|b| b.offset_px >= window.top)
        .unwrap_or(0);
    let window_center = (window.top + window.bottom) / 2.0;
    let center_hunk = boundaries
        .iter()
        .position(|b| b.offset_px >= window_center)
        .unwrap_or(first_visible_hunk);

    // Overflow countdown: keep collecting quanta until `total_hunks` of them
    // have been seen past the first boundary beyond `bottom`.
    let past_bottom = boundaries.iter().position(|b| b.offset_px > window.bottom);
    let collected_hunks = match past_bottom {
        Some(idx) => (idx + total_hunks).min(boundaries.len()),
        None => boundaries.len(),
    };

    let ideal_start_hunk = center_hunk as isize - (total_hunks as isize) / 2;
    let max_start_hunk = collected_hunks.saturating_sub(total_hunks) as isize;
    let start_hunk = ideal_start_hunk.clamp(0, max_start_hunk.max(0)) as usize;

    let mut total_lines_window = target;
    if ideal_start_hunk < 0 {
        total_lines_window = total_lines_window.saturating_sub((-ideal_start_hunk) as usize * metrics.hunk_line_count);
    }

    let starting_line = start_hunk * metrics.hunk_line_count;
    let final_hunk_index = (start_hunk + total_lines_window / metrics.hunk_line_count.max(1)).min(boundaries.len() - 1);

    let buffer_before = boundaries.get(start_hunk).map(|b| b.offset_px - geometry.file_top).unwrap_or(0.0);
    let buffer_after = if final_hunk_index + 1 < boundaries.len() {
        (geometry.file_height - geometry.header_region - (boundaries[final_hunk_index].offset_px - geometry.file_top)
            - metrics.file_gap)
            .max(0.0)
    } else {
        let (total_height, _) =
            walk_diff(diff, style, &Expansion::Map(expansion), collapsed_context_threshold, heights, metrics, geometry)?;
        (geometry.file_height - total_height - metrics.file_gap).max(0.0)
    };

    Ok(RenderRange::new(starting_line, Some(total_lines_window)).with_buffers(buffer_before, buffer_after))
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewer_diff::{ChangeRun, FileContents, FileStatus, Hunk, HunkRun};

    fn metrics() -> VirtualFileMetrics {
        VirtualFileMetrics {
            hunk_line_count: 10,
            ..Default::default()
        }
    }

    fn geometry() -> FileGeometry {
        FileGeometry {
            file_top: 0.0,
            file_height: 2000.0,
            header_region: 36.0,
        }
    }

    #[test]
    fn file_entirely_above_window_gets_empty_range_with_full_bottom_buffer() {
        let m = metrics();
        let geo = FileGeometry {
            file_top: -5000.0,
            file_height: 100.0,
            header_region: 0.0,
        };
        let range = derive_file_render_range(geo, RenderWindow::new(0.0, 800.0), 500, &m);
        assert_eq!(range.total_lines, Some(0));
        assert_eq!(range.buffer_after, 100.0);
    }

    #[test]
    fn small_file_renders_whole_file_in_one_hunk_quantum() {
        let m = metrics();
        let range = derive_file_render_range(geometry(), RenderWindow::new(0.0, 800.0), 5, &m);
        assert_eq!(range.starting_line, 0);
        assert_eq!(range.total_lines, Some(10));
    }

    #[test]
    fn large_file_windows_around_scroll_position() {
        let m = metrics();
        let range = derive_file_render_range(geometry(), RenderWindow::new(400.0, 1200.0), 1000, &m);
        assert!(range.total_lines.unwrap() > 0);
        assert!(range.starting_line <= 1000);
    }

    fn sample_diff(hunk_count: usize) -> FileDiff {
        let mut hunks = Vec::new();
        for i in 0..hunk_count {
            hunks.push(Hunk {
                deletion_start: i,
                deletion_count: 1,
                addition_start: i,
                addition_count: 1,
                deletion_line_index: i,
                addition_line_index: i,
                unified_line_start: i * 2,
                unified_line_count: 2,
                split_line_start: i,
                split_line_count: 1,
                collapsed_before: if i == 0 { 0 } else { 3 },
                hunk_content: vec![HunkRun::Change(ChangeRun {
                    deletion_start: i,
                    deletion_count: 1,
                    addition_start: i,
                    addition_count: 1,
                })],
                deletion_no_newline_at_eof: false,
                addition_no_newline_at_eof: false,
            });
        }
        FileDiff {
            old: FileContents::new("f.rs", "old"),
            new: FileContents::new("f.rs", "new"),
            hunks,
            addition_lines: (0..hunk_count).map(|i| format!("+{i}")).collect(),
            deletion_lines: (0..hunk_count).map(|i| format!("-{i}")).collect(),
            is_partial: false,
            file_status: FileStatus::Modified,
            old_path: None,
        }
    }

    #[test]
    fn visible_line_count_matches_manual_iteration() {
        let diff = sample_diff(3);
        let regions = ExpandedRegions::new();
        let count = count_visible_lines(&diff, DiffStyle::Unified, &regions, 0).unwrap();
        assert!(count > 0);
    }
}
