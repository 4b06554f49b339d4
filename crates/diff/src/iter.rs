//! The diff iterator (spec.md §4.1): a single traversal primitive over a
//! `FileDiff` reused for total-line counting, height estimation, window
//! selection, and AST emission.

use std::collections::HashMap;

use crate::{DiffError, DiffStyle, FileDiff, HunkRun};

/// A half-open window in view-space: `[starting_line, starting_line +
/// total_lines)`. `total_lines = None` means "until end".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewWindow {
    pub starting_line: usize,
    pub total_lines: Option<usize>,
}

impl ViewWindow {
    pub fn new(starting_line: usize, total_lines: Option<usize>) -> Self {
        Self {
            starting_line,
            total_lines,
        }
    }

    fn end(&self) -> Option<usize> {
        self.total_lines.map(|t| self.starting_line + t)
    }
}

/// How far a collapsed region has been revealed from its top and bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegionExpansion {
    pub from_start: usize,
    pub from_end: usize,
}

/// Per-diff-instance map of collapsed-region reveal state, keyed by the
/// region's following hunk index (or `diff.trailing_region_index()` for the
/// trailing region).
#[derive(Debug, Clone, Default)]
pub struct ExpandedRegions(HashMap<usize, RegionExpansion>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandDirection {
    Up,
    Down,
    Both,
}

impl ExpandedRegions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, region_index: usize) -> RegionExpansion {
        self.0.get(&region_index).copied().unwrap_or_default()
    }

    pub fn set(&mut self, region_index: usize, expansion: RegionExpansion) {
        self.0.insert(region_index, expansion);
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Reveal `amount` more lines of `region_index` from the requested
    /// direction, clamped to `region_size`. `Both` splits the increment
    /// evenly, favoring `from_start` on an odd amount (matches the "up"
    /// bias used when `direction` is ambiguous).
    pub fn expand(&mut self, region_index: usize, direction: ExpandDirection, amount: usize, region_size: usize) {
        let mut cur = self.get(region_index);
        match direction {
            ExpandDirection::Up => cur.from_start = cur.from_start.saturating_add(amount),
            ExpandDirection::Down => cur.from_end = cur.from_end.saturating_add(amount),
            ExpandDirection::Both => {
                let half_up = amount.div_ceil(2);
                let half_down = amount - half_up;
                cur.from_start = cur.from_start.saturating_add(half_up);
                cur.from_end = cur.from_end.saturating_add(half_down);
            }
        }
        if cur.from_start + cur.from_end > region_size {
            let overflow = cur.from_start + cur.from_end - region_size;
            cur.from_end = cur.from_end.saturating_sub(overflow);
        }
        self.0.insert(region_index, cur);
    }
}

/// Caller-selectable expansion policy for a single iteration pass.
pub enum Expansion<'a> {
    /// Use the per-region reveal state tracked across renders.
    Map(&'a ExpandedRegions),
    /// Expand every collapsed region fully (used by "render everything").
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Context,
    ContextExpanded,
    Change,
}

/// Per-side metadata for one emitted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SideLineMeta {
    pub unified_line_index: usize,
    pub split_line_index: usize,
    /// 0-based index into the side's line array.
    pub side_line_index: usize,
    /// 1-based displayed line number.
    pub side_line_number: usize,
    pub no_eof_cr: bool,
}

/// One per-line callback record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub hunk_index: usize,
    pub line_type: LineType,
    pub collapsed_before: usize,
    pub collapsed_after: usize,
    pub deletion_line: Option<SideLineMeta>,
    pub addition_line: Option<SideLineMeta>,
}

struct Region {
    size: usize,
    from_start: usize,
    from_end: usize,
    hidden: usize,
    deletion_idx_start: usize,
    addition_idx_start: usize,
}

fn resolve_region(
    size: usize,
    region_index: usize,
    is_partial: bool,
    expansion: &Expansion<'_>,
    threshold: usize,
    deletion_idx_start: usize,
    addition_idx_start: usize,
) -> Region {
    if is_partial || size == 0 {
        return Region {
            size,
            from_start: 0,
            from_end: 0,
            hidden: size,
            deletion_idx_start,
            addition_idx_start,
        };
    }
    let (from_start, from_end) = match expansion {
        Expansion::All => (size, 0),
        Expansion::Map(map) => {
            if size <= threshold {
                (size, 0)
            } else {
                let r = map.get(region_index);
                let from_start = r.from_start.min(size);
                let from_end = r.from_end.min(size - from_start);
                (from_start, from_end)
            }
        }
    };
    let hidden = size - from_start - from_end;
    Region {
        size,
        from_start,
        from_end,
        hidden,
        deletion_idx_start,
        addition_idx_start,
    }
}

/// Traversal state shared across the emission helpers below. Kept as a
/// struct so the windowing bookkeeping (running counters, early stop) lives
/// in one place instead of being threaded through every call site.
struct Walk<'a> {
    diff: &'a FileDiff,
    style: DiffStyle,
    window: Option<ViewWindow>,
    unified_pos: usize,
    split_pos: usize,
    stopped: bool,
}

impl<'a> Walk<'a> {
    fn effective_pos(&self) -> usize {
        match self.style {
            DiffStyle::Unified => self.unified_pos,
            DiffStyle::Split | DiffStyle::Both => self.split_pos,
        }
    }

    fn past_window_end(&self) -> bool {
        match self.window.and_then(|w| w.end()) {
            Some(end) => self.effective_pos() >= end,
            None => false,
        }
    }

    fn before_window_start(&self) -> bool {
        match self.window {
            Some(w) => self.effective_pos() < w.starting_line,
            None => false,
        }
    }

    /// Emit one row (context or context-expanded), advancing counters
    /// regardless of whether the row is actually visible in the window.
    fn emit_context_row(
        &mut self,
        hunk_index: usize,
        line_type: LineType,
        collapsed_before: usize,
        collapsed_after: usize,
        deletion_idx: usize,
        addition_idx: usize,
        callback: &mut dyn FnMut(LineRecord) -> bool,
    ) {
        if self.stopped {
            return;
        }
        if self.past_window_end() {
            self.stopped = true;
            return;
        }
        let visible = !self.before_window_start();
        if visible {
            let deletion_no_eof = self.diff.deletion_no_newline_at_eof()
                && deletion_idx + 1 == self.diff.deletion_lines.len();
            let addition_no_eof = self.diff.addition_no_newline_at_eof()
                && addition_idx + 1 == self.diff.addition_lines.len();
            let record = LineRecord {
                hunk_index,
                line_type,
                collapsed_before,
                collapsed_after,
                deletion_line: Some(SideLineMeta {
                    unified_line_index: self.unified_pos,
                    split_line_index: self.split_pos,
                    side_line_index: deletion_idx,
                    side_line_number: deletion_idx + 1,
                    no_eof_cr: deletion_no_eof,
                }),
                addition_line: Some(SideLineMeta {
                    unified_line_index: self.unified_pos,
                    split_line_index: self.split_pos,
                    side_line_index: addition_idx,
                    side_line_number: addition_idx + 1,
                    no_eof_cr: addition_no_eof,
                }),
            };
            if callback(record) {
                self.stopped = true;
            }
        }
        self.unified_pos += 1;
        self.split_pos += 1;
    }

    fn emit_region(
        &mut self,
        region: &Region,
        hunk_index: usize,
        callback: &mut dyn FnMut(LineRecord) -> bool,
    ) {
        for i in 0..region.from_start {
            if self.stopped {
                return;
            }
            self.emit_context_row(
                hunk_index,
                LineType::ContextExpanded,
                0,
                0,
                region.deletion_idx_start + i,
                region.addition_idx_start + i,
                callback,
            );
        }
        if self.stopped {
            return;
        }
        for i in 0..region.from_end {
            if self.stopped {
                return;
            }
            let collapsed_before = if i == 0 { region.hidden } else { 0 };
            self.emit_context_row(
                hunk_index,
                LineType::ContextExpanded,
                collapsed_before,
                0,
                region.deletion_idx_start + region.from_start + region.hidden + i,
                region.addition_idx_start + region.from_start + region.hidden + i,
                callback,
            );
        }
    }
}

/// Walk `diff` in `style`, emitting one callback record per view-space row.
/// The callback may return `true` to stop iteration early. See spec.md
/// §4.1 for the full contract.
pub fn iterate(
    diff: &FileDiff,
    style: DiffStyle,
    window: Option<ViewWindow>,
    expansion: &Expansion<'_>,
    collapsed_context_threshold: usize,
    callback: &mut dyn FnMut(LineRecord) -> bool,
) -> Result<(), DiffError> {
    // Validate the trailing-context invariant unconditionally: a window
    // that never reaches the trailing region must still surface a
    // malformed diff rather than silently truncating it.
    let trailing_size = diff.trailing_collapsed()?;

    let mut walk = Walk {
        diff,
        style,
        window,
        unified_pos: 0,
        split_pos: 0,
        stopped: false,
    };

    for (hunk_index, hunk) in diff.hunks.iter().enumerate() {
        if walk.stopped {
            break;
        }
        tracing::trace!(hunk_index, "entering hunk");
        let region_size = hunk.collapsed_before;
        let deletion_idx_start = hunk.deletion_line_index.saturating_sub(region_size);
        let addition_idx_start = hunk.addition_line_index.saturating_sub(region_size);
        let region = resolve_region(
            region_size,
            hunk_index,
            diff.is_partial,
            expansion,
            collapsed_context_threshold,
            deletion_idx_start,
            addition_idx_start,
        );
        // A hunk's own leading region contributes `collapsed_before` on the
        // hunk's first content row only if nothing was revealed from the
        // bottom of that region (otherwise the "first line after a
        // collapsed run" is the revealed row already emitted above).
        let leading_collapsed_before = if region.from_end == 0 { region.hidden } else { 0 };
        walk.emit_region(&region, hunk_index, callback);
        if walk.stopped {
            break;
        }

        // Peek the region following this hunk: `collapsed_after` belongs on
        // the hunk's last content row only if that region reveals nothing
        // from its own top (otherwise the gap sits between two already-
        // revealed rows and carries no adjacency marker here).
        let next_hidden = if hunk_index + 1 < diff.hunks.len() {
            let next = &diff.hunks[hunk_index + 1];
            let next_region_size = next.collapsed_before;
            let next_region = resolve_region(
                next_region_size,
                hunk_index + 1,
                diff.is_partial,
                expansion,
                collapsed_context_threshold,
                next.deletion_line_index.saturating_sub(next_region_size),
                next.addition_line_index.saturating_sub(next_region_size),
            );
            if next_region.from_start == 0 {
                next_region.hidden
            } else {
                0
            }
        } else {
            trailing_size
                .map(|size| {
                    let deletion_idx_start = diff.deletion_lines.len().saturating_sub(size);
                    let addition_idx_start = diff.addition_lines.len().saturating_sub(size);
                    let trailing_region = resolve_region(
                        size,
                        diff.trailing_region_index(),
                        diff.is_partial,
                        expansion,
                        collapsed_context_threshold,
                        deletion_idx_start,
                        addition_idx_start,
                    );
                    if trailing_region.from_start == 0 {
                        trailing_region.hidden
                    } else {
                        0
                    }
                })
                .unwrap_or(0)
        };

        emit_hunk_content(
            &mut walk,
            hunk_index,
            hunk,
            leading_collapsed_before,
            next_hidden,
            callback,
        );
        if walk.stopped {
            break;
        }
    }

    if !walk.stopped {
        if let Some(size) = trailing_size {
            let region_index = diff.trailing_region_index();
            let deletion_idx_start = diff.deletion_lines.len().saturating_sub(size);
            let addition_idx_start = diff.addition_lines.len().saturating_sub(size);
            let region = resolve_region(
                size,
                region_index,
                diff.is_partial,
                expansion,
                collapsed_context_threshold,
                deletion_idx_start,
                addition_idx_start,
            );
            walk.emit_region(&region, region_index, callback);
        }
    }

    Ok(())
}

fn emit_hunk_content(
    walk: &mut Walk<'_>,
    hunk_index: usize,
    hunk: &crate::Hunk,
    leading_collapsed_before: usize,
    next_region_hidden: usize,
    callback: &mut dyn FnMut(LineRecord) -> bool,
) {
    // Flatten the hunk's runs into a single ordered list of rows so the last
    // row overall (across all runs) can be identified for `collapsed_after`.
    struct PendingRow {
        line_type: LineType,
        deletion_idx: Option<usize>,
        addition_idx: Option<usize>,
    }
    let mut rows: Vec<PendingRow> = Vec::new();
    for run in &hunk.hunk_content {
        match run {
            HunkRun::Context(ctx) => {
                for i in 0..ctx.count {
                    rows.push(PendingRow {
                        line_type: LineType::Context,
                        deletion_idx: Some(ctx.deletion_start + i),
                        addition_idx: Some(ctx.addition_start + i),
                    });
                }
            }
            HunkRun::Change(chg) => match walk.style {
                DiffStyle::Unified => {
                    for i in 0..chg.deletion_count {
                        rows.push(PendingRow {
                            line_type: LineType::Change,
                            deletion_idx: Some(chg.deletion_start + i),
                            addition_idx: None,
                        });
                    }
                    for i in 0..chg.addition_count {
                        rows.push(PendingRow {
                            line_type: LineType::Change,
                            deletion_idx: None,
                            addition_idx: Some(chg.addition_start + i),
                        });
                    }
                }
                DiffStyle::Split | DiffStyle::Both => {
                    let n = chg.deletion_count.max(chg.addition_count);
                    for i in 0..n {
                        rows.push(PendingRow {
                            line_type: LineType::Change,
                            deletion_idx: (i < chg.deletion_count).then_some(chg.deletion_start + i),
                            addition_idx: (i < chg.addition_count).then_some(chg.addition_start + i),
                        });
                    }
                }
            },
        }
    }

    let last_index = rows.len().checked_sub(1);
    for (i, row) in rows.into_iter().enumerate() {
        if walk.stopped {
            return;
        }
        if walk.past_window_end() {
            walk.stopped = true;
            return;
        }
        let visible = !walk.before_window_start();
        let collapsed_before = if i == 0 && leading_collapsed_before > 0 {
            leading_collapsed_before
        } else {
            0
        };
        let collapsed_after = if Some(i) == last_index && next_region_hidden > 0 {
            next_region_hidden
        } else {
            0
        };
        if visible {
            let deletion_line = row.deletion_idx.map(|idx| {
                let no_eof = walk.diff.deletion_no_newline_at_eof()
                    && idx + 1 == walk.diff.deletion_lines.len();
                crate::SideLineMeta {
                    unified_line_index: walk.unified_pos,
                    split_line_index: walk.split_pos,
                    side_line_index: idx,
                    side_line_number: idx + 1,
                    no_eof_cr: no_eof,
                }
            });
            let addition_line = row.addition_idx.map(|idx| {
                let no_eof = walk.diff.addition_no_newline_at_eof()
                    && idx + 1 == walk.diff.addition_lines.len();
                crate::SideLineMeta {
                    unified_line_index: walk.unified_pos,
                    split_line_index: walk.split_pos,
                    side_line_index: idx,
                    side_line_number: idx + 1,
                    no_eof_cr: no_eof,
                }
            });
            let record = LineRecord {
                hunk_index,
                line_type: row.line_type,
                collapsed_before,
                collapsed_after,
                deletion_line,
                addition_line,
            };
            if callback(record) {
                walk.stopped = true;
            }
        }
        walk.unified_pos += 1;
        walk.split_pos += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChangeRun, ContextRun, FileContents, FileDiff, FileStatus, Hunk, HunkRun};

    /// Build a diff with one hunk in the middle of a larger file: N lines of
    /// leading context, a 2-deletion/3-addition change, N lines of trailing
    /// context.
    fn sample_diff(leading: usize, trailing: usize) -> FileDiff {
        let del_total = leading + 2 + trailing;
        let add_total = leading + 3 + trailing;
        let deletion_lines: Vec<String> = (0..del_total).map(|i| format!("d{i}")).collect();
        let addition_lines: Vec<String> = (0..add_total).map(|i| format!("a{i}")).collect();
        let hunk = Hunk {
            deletion_start: leading + 1,
            deletion_count: 2,
            addition_start: leading + 1,
            addition_count: 3,
            deletion_line_index: leading,
            addition_line_index: leading,
            unified_line_start: 0,
            unified_line_count: 5,
            split_line_start: 0,
            split_line_count: 3,
            collapsed_before: leading,
            hunk_content: vec![HunkRun::Change(ChangeRun {
                deletion_start: leading,
                deletion_count: 2,
                addition_start: leading,
                addition_count: 3,
            })],
            deletion_no_newline_at_eof: false,
            addition_no_newline_at_eof: false,
        };
        FileDiff {
            old: FileContents::new("f", "old"),
            new: FileContents::new("f", "new"),
            hunks: vec![hunk],
            addition_lines,
            deletion_lines,
            is_partial: false,
            file_status: FileStatus::Modified,
            old_path: None,
        }
    }

    #[test]
    fn collapsed_threshold_fully_expands_small_regions() {
        let diff = sample_diff(3, 3);
        let expansion = ExpandedRegions::new();
        let mut rows = Vec::new();
        iterate(
            &diff,
            DiffStyle::Unified,
            None,
            &Expansion::Map(&expansion),
            10, // threshold larger than region size (3): auto-expand
            &mut |r| {
                rows.push(r);
                true
            },
        )
        .unwrap();
        // 3 leading context + 2 deletions + 3 additions + 3 trailing context.
        assert_eq!(rows.len(), 3 + 2 + 3 + 3);
        assert!(rows.iter().all(|r| r.collapsed_before == 0));
    }

    #[test]
    fn large_region_stays_collapsed_without_expansion() {
        let diff = sample_diff(50, 50);
        let expansion = ExpandedRegions::new();
        let mut rows = Vec::new();
        iterate(
            &diff,
            DiffStyle::Unified,
            None,
            &Expansion::Map(&expansion),
            5,
            &mut |r| {
                rows.push(r);
                true
            },
        )
        .unwrap();
        // No leading/trailing context revealed: only the change run's 5 rows.
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].collapsed_before, 50);
        assert_eq!(rows.last().unwrap().collapsed_after, 50);
    }

    #[test]
    fn expand_up_reveals_requested_lines() {
        let diff = sample_diff(50, 50);
        let mut expansion = ExpandedRegions::new();
        expansion.expand(0, ExpandDirection::Up, 20, 50);
        let mut rows = Vec::new();
        iterate(
            &diff,
            DiffStyle::Unified,
            None,
            &Expansion::Map(&expansion),
            5,
            &mut |r| {
                rows.push(r);
                true
            },
        )
        .unwrap();
        let expanded: Vec<_> = rows
            .iter()
            .filter(|r| r.line_type == LineType::ContextExpanded)
            .collect();
        assert_eq!(expanded.len(), 20);
        assert_eq!(rows[0].collapsed_before, 0);
        // Remaining hidden count before the change run: 50 - 20 = 30.
        let change_start = rows
            .iter()
            .position(|r| r.line_type == LineType::Change)
            .unwrap();
        assert_eq!(rows[change_start].collapsed_before, 30);
    }

    #[test]
    fn windowed_iteration_matches_full_slice() {
        let diff = sample_diff(10, 10);
        let expansion = ExpandedRegions::new();
        let mut full = Vec::new();
        iterate(
            &diff,
            DiffStyle::Unified,
            None,
            &Expansion::All,
            0,
            &mut |r| {
                full.push(r);
                true
            },
        )
        .unwrap();

        let mut windowed = Vec::new();
        iterate(
            &diff,
            DiffStyle::Unified,
            Some(ViewWindow::new(5, Some(8))),
            &Expansion::All,
            0,
            &mut |r| {
                windowed.push(r);
                true
            },
        )
        .unwrap();
        assert_eq!(windowed.len(), 8);
        assert_eq!(windowed, full[5..13]);
    }

    #[test]
    fn split_mode_omits_missing_side() {
        let diff = sample_diff(0, 0);
        let expansion = ExpandedRegions::new();
        let mut rows = Vec::new();
        iterate(
            &diff,
            DiffStyle::Split,
            None,
            &Expansion::Map(&expansion),
            0,
            &mut |r| {
                rows.push(r);
                true
            },
        )
        .unwrap();
        // max(2 deletions, 3 additions) = 3 rows.
        assert_eq!(rows.len(), 3);
        assert!(rows[0].deletion_line.is_some() && rows[0].addition_line.is_some());
        assert!(rows[1].deletion_line.is_some() && rows[1].addition_line.is_some());
        assert!(rows[2].deletion_line.is_none() && rows[2].addition_line.is_some());
    }

    #[test]
    fn line_index_monotonicity() {
        let diff = sample_diff(4, 4);
        let expansion = ExpandedRegions::new();
        let mut last = None;
        iterate(
            &diff,
            DiffStyle::Unified,
            None,
            &Expansion::All,
            0,
            &mut |r| {
                let idx = r.deletion_line.or(r.addition_line).unwrap().unified_line_index;
                if let Some(prev) = last {
                    assert!(idx >= prev);
                }
                last = Some(idx);
                true
            },
        )
        .unwrap();
    }

    #[test]
    fn trailing_mismatch_propagates_as_error() {
        let mut diff = sample_diff(2, 2);
        diff.deletion_lines.pop();
        let expansion = ExpandedRegions::new();
        let result = iterate(
            &diff,
            DiffStyle::Unified,
            None,
            &Expansion::Map(&expansion),
            0,
            &mut |_| true,
        );
        assert!(matches!(
            result,
            Err(DiffError::TrailingContextMismatch { .. })
        ));
    }

    #[test]
    fn callback_stop_halts_iteration() {
        let diff = sample_diff(4, 4);
        let expansion = ExpandedRegions::new();
        let mut count = 0;
        iterate(
            &diff,
            DiffStyle::Unified,
            None,
            &Expansion::All,
            0,
            &mut |_| {
                count += 1;
                count >= 3
            },
        )
        .unwrap();
        assert_eq!(count, 3);
    }
}
