//! The top-level element tree a render emits: header, one or two code
//! columns (each a gutter + content pair), and the pixel-space buffers that
//! sit outside the `pre` block.

use crate::row::{ColumnSide, ContentRow, GutterCell};

/// Mirrors `FileStatus` at the presentation boundary without pulling in a
/// dependency on the diff crate — the renderer maps `viewer_diff::FileStatus`
/// to this when it builds a header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileChangeKind {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderElement {
    pub file_name: String,
    pub old_path: Option<String>,
    pub status: Option<FileChangeKind>,
}

/// One code column: a gutter and a content side, always the same logical
/// row count (enforced by the reconciler's split-mode trim invariant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub side: ColumnSide,
    pub gutter: Vec<GutterCell>,
    pub content: Vec<ContentRow>,
}

impl Column {
    pub fn new(side: ColumnSide) -> Self {
        Self {
            side,
            gutter: Vec::new(),
            content: Vec::new(),
        }
    }

    pub fn data_row_count(&self) -> usize {
        self.content.iter().filter(|r| r.is_data_row()).count()
    }
}

/// The renderer's output for one render call: a `pre`-equivalent element
/// tree, carrying everything needed to splice into or replace a host's DOM
/// subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
    pub header: Option<HeaderElement>,
    pub columns: Vec<Column>,
}

impl Ast {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            header: None,
            columns,
        }
    }

    pub fn with_header(mut self, header: HeaderElement) -> Self {
        self.header = Some(header);
        self
    }

    pub fn column(&self, side: ColumnSide) -> Option<&Column> {
        self.columns.iter().find(|c| c.side == side)
    }

    pub fn column_mut(&mut self, side: ColumnSide) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.side == side)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.content.is_empty())
    }
}
