//! Property: incrementally reconciling from one range to another must end
//! up mounting exactly the rows a full rebuild of the new range would have
//! mounted (spec.md §8's "full-equals-assembled"), grounded on
//! `core-render/tests/scheduler_properties.rs`'s `proptest!` style and on
//! this crate's own `scroll_down_trims_front_and_appends_suffix` fixture
//! shape.

use proptest::prelude::*;

use viewer_ast::{Ast, Column, ColumnSide, ContentRow, GutterCell, LineIndex, RenderRange, RowLineType, StyledSpan};
use viewer_reconcile::{apply_partial_render, MountedAst, RangeRenderer, ReconcileError};

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
    MountedAst::from_ast(Ast::new(vec![unified_column(start, count)]))
}

fn line_indices(mounted: &MountedAst) -> Vec<usize> {
    mounted
        .column(ColumnSide::Unified)
        .unwrap()
        .content
        .iter()
        .map(|row| match row {
            ContentRow::Data { line_index, .. } => line_index.unified,
            other => panic!("expected only data rows in this fixture, got {other:?}"),
        })
        .collect()
}

struct StubRenderer;

impl RangeRenderer for StubRenderer {
    fn render_range(&mut self, range: RenderRange) -> Result<Ast, ReconcileError> {
        let total = range.total_lines.expect("bounded range");
        Ok(Ast::new(vec![unified_column(range.starting_line, total)]))
    }
}

proptest! {
    // Whatever the previous range was, reconciling into an overlapping next
    // range must produce the same row sequence a cold full render of that
    // next range would have produced.
    #[test]
    fn incremental_reconcile_matches_full_rebuild(
        prev_start in 0usize..50,
        prev_len in 1usize..30,
        next_start in 0usize..50,
        next_len in 1usize..30,
    ) {
        let mut incremental = mounted(prev_start, prev_len);
        let prev_range = RenderRange::new(prev_start, Some(prev_len));
        let next_range = RenderRange::new(next_start, Some(next_len));

        let applied = apply_partial_render(&mut incremental, prev_range, next_range, &mut StubRenderer).unwrap();

        let expected = line_indices(&mounted(next_start, next_len));

        let prev_end = prev_start + prev_len;
        let next_end = next_start + next_len;
        let overlaps = next_start < prev_end && prev_start < next_end;
        prop_assert_eq!(applied, overlaps);

        if applied {
            prop_assert_eq!(line_indices(&incremental), expected);
        }
    }
}
