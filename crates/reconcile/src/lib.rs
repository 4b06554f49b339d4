//! Incremental DOM reconciler: turns a previous render range and a new one
//! into the minimal set of row trims/inserts against an already-mounted row
//! buffer, instead of replacing the whole subtree on every scroll tick.
//!
//! This crate deliberately does not depend on `viewer-render`: the renderer
//! for a missing span is reached through the `RangeRenderer` seam, which the
//! host crate (`viewer-instance`) implements by delegating to
//! `viewer_render::FileRenderer`.

mod mount;

pub use mount::{MountedAst, MountedColumn};

use viewer_ast::{Ast, ColumnSide, RenderRange};

/// Failure modes `apply_partial_render` can hit. These are all considered
/// bugs in the caller's range bookkeeping, not recoverable runtime states —
/// a caller that hits one should fall back to a full render rather than
/// retry.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("trim on {side:?} column ran past the previous range's start")]
    TrimUnderflow { side: ColumnSide },
    #[error("split columns trimmed to different logical lengths: {deletions} vs {additions}")]
    SplitSideMismatch { deletions: usize, additions: usize },
    #[error("buffer row resize would go negative")]
    NegativeBufferResize,
    #[error("rendering a missing span failed: {0}")]
    RenderFailed(String),
}

/// The reconciler's only collaborator: render a fresh `Ast` for a range not
/// currently mounted. Implemented by `viewer-instance` over
/// `viewer_render::FileRenderer` so this crate stays renderer-agnostic.
pub trait RangeRenderer {
    fn render_range(&mut self, range: RenderRange) -> Result<Ast, ReconcileError>;
}

/// `spec.md` §4.4: given what is currently mounted (rendered for
/// `previous_range`) and the range that should be mounted now
/// (`next_range`), trim the parts that fell out of view and splice in the
/// parts newly in view, in place.
///
/// Returns `Ok(false)` when partial rendering does not apply at all — either
/// range is unbounded (`total_lines: None`, per the "infinite totalLines
/// disables partial rendering" invariant) or the two ranges do not overlap —
/// and the caller should fall back to a full `render_range` over the whole
/// new range instead.
pub fn apply_partial_render(
    mounted: &mut MountedAst,
    previous_range: RenderRange,
    next_range: RenderRange,
    renderer: &mut dyn RangeRenderer,
) -> Result<bool, ReconcileError> {
    let (Some(prev_total), Some(next_total)) = (previous_range.total_lines, next_range.total_lines) else {
        tracing::trace!("partial render skipped: unbounded range");
        return Ok(false);
    };

    let p0 = previous_range.starting_line;
    let p1 = p0 + prev_total;
    let n0 = next_range.starting_line;
    let n1 = n0 + next_total;

    let overlap_start = p0.max(n0);
    let overlap_end = p1.min(n1);
    if overlap_end <= overlap_start {
        tracing::trace!(p0, p1, n0, n1, "partial render skipped: no overlap");
        return Ok(false);
    }

    let front_trim = overlap_start - p0;
    let back_trim = p1 - overlap_end;

    let mut logical_lens = Vec::with_capacity(mounted.columns.len());
    for column in mounted.columns.iter_mut() {
        if front_trim > 0 {
            column.trim_front(front_trim)?;
        }
        if back_trim > 0 {
            column.trim_back(back_trim)?;
        }
        logical_lens.push(column.logical_len());
    }
    if let [deletions, additions] = logical_lens[..] {
        if deletions != additions {
            return Err(ReconcileError::SplitSideMismatch { deletions, additions });
        }
    }

    if n0 < overlap_start {
        let prefix_range = RenderRange::new(n0, Some(overlap_start - n0));
        let prefix_ast = renderer.render_range(prefix_range)?;
        let prefix_mount = MountedAst::from_ast(prefix_ast);
        splice_columns(mounted, prefix_mount, Splice::Prefix);
    }
    if overlap_end < n1 {
        let suffix_range = RenderRange::new(overlap_end, Some(n1 - overlap_end));
        let suffix_ast = renderer.render_range(suffix_range)?;
        let suffix_mount = MountedAst::from_ast(suffix_ast);
        splice_columns(mounted, suffix_mount, Splice::Suffix);
    }

    tracing::debug!(
        front_trim,
        back_trim,
        inserted_prefix = n0 < overlap_start,
        inserted_suffix = overlap_end < n1,
        row_total = mounted.row_total(),
        "applied partial render"
    );

    Ok(true)
}

enum Splice {
    Prefix,
    Suffix,
}

fn splice_columns(mounted: &mut MountedAst, mut other: MountedAst, which: Splice) {
    for column in mounted.columns.iter_mut() {
        let Some(pos) = other.columns.iter().position(|c| c.side == column.side) else {
            continue;
        };
        let other_column = other.columns.remove(pos);
        match which {
            Splice::Prefix => column.splice_prefix(other_column),
            Splice::Suffix => column.splice_suffix(other_column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewer_ast::{Column, ContentRow, GutterCell, LineIndex, RowLineType, StyledSpan};

    fn data_row(n: usize) -> (GutterCell, ContentRow) {
        (
            GutterCell::Number {
                line_index: LineIndex { unified: n, split: n },
                line_number: n,
                line_type: RowLineType::Context,
            },
            ContentRow::Data {
                line_index: LineIndex { unified: n, split: n },
                line_type: RowLineType::Context,
                spans: vec![StyledSpan::plain(n.to_string())],
            },
        )
    }

    fn unified_column(start: usize, count: usize) -> Column {
        let mut col = Column::new(ColumnSide::Unified);
        for n in start..start + count {
            let (g, c) = data_row(n);
            col.gutter.push(g);
            col.content.push(c);
        }
        col
    }

    fn mounted(start: usize, count: usize) -> MountedAst {
        let ast = Ast::new(vec![unified_column(start, count)]);
        MountedAst::from_ast(ast)
    }

    struct StubRenderer;

    impl RangeRenderer for StubRenderer {
        fn render_range(&mut self, range: RenderRange) -> Result<Ast, ReconcileError> {
            let total = range.total_lines.expect("bounded range");
            Ok(Ast::new(vec![unified_column(range.starting_line, total)]))
        }
    }

    #[test]
    fn unbounded_range_disables_partial_render() {
        let mut m = mounted(0, 10);
        let prev = RenderRange::new(0, None);
        let next = RenderRange::new(5, Some(10));
        let applied = apply_partial_render(&mut m, prev, next, &mut StubRenderer).unwrap();
        assert!(!applied);
    }

    #[test]
    fn disjoint_ranges_disable_partial_render() {
        let mut m = mounted(0, 10);
        let prev = RenderRange::new(0, Some(10));
        let next = RenderRange::new(20, Some(10));
        let applied = apply_partial_render(&mut m, prev, next, &mut StubRenderer).unwrap();
        assert!(!applied);
    }

    #[test]
    fn scroll_down_trims_front_and_appends_suffix() {
        let mut m = mounted(0, 10);
        let prev = RenderRange::new(0, Some(10));
        let next = RenderRange::new(4, Some(10));
        let applied = apply_partial_render(&mut m, prev, next, &mut StubRenderer).unwrap();
        assert!(applied);
        let col = m.column(ColumnSide::Unified).unwrap();
        assert_eq!(col.row_count(), 10);
        let first = match &col.content[0] {
            ContentRow::Data { line_index, .. } => line_index.unified,
            _ => panic!("expected data row"),
        };
        assert_eq!(first, 4);
        let last = match col.content.last().unwrap() {
            ContentRow::Data { line_index, .. } => line_index.unified,
            _ => panic!("expected data row"),
        };
        assert_eq!(last, 13);
    }

    #[test]
    fn scroll_up_prepends_prefix_and_trims_back() {
        let mut m = mounted(10, 10);
        let prev = RenderRange::new(10, Some(10));
        let next = RenderRange::new(4, Some(10));
        let applied = apply_partial_render(&mut m, prev, next, &mut StubRenderer).unwrap();
        assert!(applied);
        let col = m.column(ColumnSide::Unified).unwrap();
        assert_eq!(col.row_count(), 10);
        let first = match &col.content[0] {
            ContentRow::Data { line_index, .. } => line_index.unified,
            _ => panic!("expected data row"),
        };
        assert_eq!(first, 4);
    }

    #[test]
    fn buffer_row_shrinks_in_place_on_front_trim() {
        let mut col = unified_column(0, 0);
        col.gutter.push(GutterCell::Spacer {
            kind: viewer_ast::GutterBufferKind::Buffer,
            buffer_size: 5,
        });
        col.content.push(ContentRow::Buffer { buffer_size: 5 });
        let (g, c) = data_row(5);
        col.gutter.push(g);
        col.content.push(c);
        let ast = Ast::new(vec![col]);
        let mut m = MountedAst::from_ast(ast);
        let mc = m.column_mut(ColumnSide::Unified).unwrap();
        mc.trim_front(2).unwrap();
        assert_eq!(mc.row_count(), 2);
        match &mc.content[0] {
            ContentRow::Buffer { buffer_size } => assert_eq!(*buffer_size, 3),
            _ => panic!("expected buffer row"),
        }
    }

    #[test]
    fn trim_underflow_when_remaining_exceeds_rows() {
        let mut m = mounted(0, 3);
        let mc = m.column_mut(ColumnSide::Unified).unwrap();
        let err = mc.trim_front(10).unwrap_err();
        assert!(matches!(err, ReconcileError::TrimUnderflow { .. }));
    }

    #[test]
    fn data_row_siblings_travel_with_front_trim() {
        let mut col = Column::new(ColumnSide::Unified);
        let (g, c) = data_row(0);
        col.gutter.push(g);
        col.content.push(c);
        col.content.push(ContentRow::NoNewline {
            line_type: RowLineType::Context,
        });
        let (g, c) = data_row(1);
        col.gutter.push(g);
        col.content.push(c);
        let ast = Ast::new(vec![col]);
        let mut m = MountedAst::from_ast(ast);
        let mc = m.column_mut(ColumnSide::Unified).unwrap();
        mc.trim_front(1).unwrap();
        assert_eq!(mc.content.len(), 1);
        assert_eq!(mc.gutter.len(), 1);
    }
}
