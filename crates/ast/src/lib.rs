//! Shared geometry and element-tree types: the vocabulary every other crate
//! in the workspace (render, highlight, instance, reconcile, virtualizer)
//! speaks when describing "what to draw" and "where it sits on screen."
//!
//! Nothing here knows how to *produce* an `Ast` (that is `viewer-render`'s
//! job) or how to *apply* one to a live DOM-like row buffer (that is
//! `viewer-reconcile`'s job); this crate only fixes the shape both agree on.

mod geometry;
mod row;
mod tree;

pub use geometry::{RenderRange, RenderWindow, VirtualFileMetrics};
pub use row::{
    ColumnSide, ContentRow, ExpandAffordance, GutterBufferKind, GutterCell, LineIndex,
    RowLineType, StyledSpan,
};
pub use tree::{Ast, Column, FileChangeKind, HeaderElement};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_range_end_and_containment() {
        let r = RenderRange::new(10, Some(5));
        assert_eq!(r.end(), Some(15));
        assert!(r.contains_line(10));
        assert!(r.contains_line(14));
        assert!(!r.contains_line(15));
        assert!(!r.contains_line(9));
    }

    #[test]
    fn render_range_unbounded_contains_everything_past_start() {
        let r = RenderRange::new(10, None);
        assert_eq!(r.end(), None);
        assert!(r.contains_line(10_000));
        assert!(!r.contains_line(9));
    }

    #[test]
    fn metrics_alignment_rounds_to_quantum() {
        let metrics = VirtualFileMetrics {
            hunk_line_count: 50,
            ..Default::default()
        };
        assert_eq!(metrics.align_down(120), 100);
        assert_eq!(metrics.align_up(120), 150);
        assert_eq!(metrics.align_down(100), 100);
        assert_eq!(metrics.align_up(100), 100);
    }

    #[test]
    fn buffer_row_grows_in_place() {
        let mut row = ContentRow::Buffer { buffer_size: 4 };
        row.grow_buffer(3);
        assert_eq!(row.buffer_size(), Some(7));
    }

    #[test]
    fn column_counts_only_data_rows() {
        let mut col = Column::new(ColumnSide::Unified);
        col.content.push(ContentRow::Data {
            line_index: LineIndex { unified: 0, split: 0 },
            line_type: RowLineType::Context,
            spans: vec![StyledSpan::plain("a")],
        });
        col.content.push(ContentRow::Separator {
            hunk_index: 0,
            hidden: 4,
            expand: None,
        });
        col.content.push(ContentRow::Buffer { buffer_size: 3 });
        assert_eq!(col.data_row_count(), 1);
    }
}
