//! The reconciler's notion of "what is currently in the DOM": a row buffer
//! per column, kept in view-space order, that `apply_partial_render` trims
//! and splices in place rather than replaces wholesale.

use viewer_ast::{Ast, Column, ColumnSide, ContentRow, GutterBufferKind, GutterCell, HeaderElement};

use crate::ReconcileError;

/// One column's currently-mounted rows, exactly as the renderer emitted them.
/// `content` is the superset: a data row's `NoNewline`/`Annotation` siblings
/// live only in `content`, with no `gutter` counterpart, so the two vectors
/// are not index-aligned — trimming must track each independently.
#[derive(Debug, Clone)]
pub struct MountedColumn {
    pub side: ColumnSide,
    pub gutter: Vec<GutterCell>,
    pub content: Vec<ContentRow>,
}

impl MountedColumn {
    fn from_column(column: Column) -> Self {
        Self {
            side: column.side,
            gutter: column.gutter,
            content: column.content,
        }
    }

    pub fn row_count(&self) -> usize {
        self.content.len()
    }

    /// Count of view-space logical positions this column's content
    /// represents: one per data row, `buffer_size` per buffer row (a
    /// coalesced run of missing-side positions), zero for separators and
    /// siblings. Used to cross-check split-mode columns trim to the same
    /// length.
    pub fn logical_len(&self) -> usize {
        self.content
            .iter()
            .map(|r| match r {
                ContentRow::Data { .. } => 1,
                ContentRow::Buffer { buffer_size } => *buffer_size,
                ContentRow::Separator { .. } | ContentRow::NoNewline { .. } | ContentRow::Annotation { .. } => 0,
            })
            .sum()
    }

    /// Remove rows from the front until `remaining` logical positions have
    /// been discarded. A data row's annotation/no-newline siblings are
    /// removed alongside it; a buffer row is resized in place rather than
    /// removed when only partially inside the trim.
    pub fn trim_front(&mut self, mut remaining: usize) -> Result<(), ReconcileError> {
        while remaining > 0 {
            match self.content.first() {
                None => return Err(ReconcileError::TrimUnderflow { side: self.side }),
                Some(ContentRow::Data { .. }) => {
                    self.content.remove(0);
                    self.gutter.remove(0);
                    remaining -= 1;
                    while matches!(
                        self.content.first(),
                        Some(ContentRow::NoNewline { .. }) | Some(ContentRow::Annotation { .. })
                    ) {
                        self.content.remove(0);
                    }
                }
                Some(ContentRow::Separator { .. }) => {
                    self.content.remove(0);
                    self.gutter.remove(0);
                }
                Some(ContentRow::Buffer { buffer_size }) => {
                    let size = *buffer_size;
                    if size <= remaining {
                        self.content.remove(0);
                        self.gutter.remove(0);
                        remaining -= size;
                    } else {
                        shrink_buffer_front(self, remaining)?;
                        remaining = 0;
                    }
                }
                Some(ContentRow::NoNewline { .. }) | Some(ContentRow::Annotation { .. }) => {
                    // A sibling row stranded at the front of a well-formed
                    // mount shouldn't happen; drop it rather than loop.
                    self.content.remove(0);
                }
            }
        }
        Ok(())
    }

    /// The back-trim counterpart: pops a data row's siblings together with
    /// it when trimming from the tail.
    pub fn trim_back(&mut self, mut remaining: usize) -> Result<(), ReconcileError> {
        while remaining > 0 {
            match self.content.last() {
                None => return Err(ReconcileError::TrimUnderflow { side: self.side }),
                Some(ContentRow::Data { .. }) => {
                    self.content.pop();
                    self.gutter.pop();
                    remaining -= 1;
                }
                Some(ContentRow::Separator { .. }) => {
                    self.content.pop();
                    self.gutter.pop();
                }
                Some(ContentRow::Buffer { buffer_size }) => {
                    let size = *buffer_size;
                    if size <= remaining {
                        self.content.pop();
                        self.gutter.pop();
                        remaining -= size;
                    } else {
                        shrink_buffer_back(self, remaining)?;
                        remaining = 0;
                    }
                }
                Some(ContentRow::NoNewline { .. }) | Some(ContentRow::Annotation { .. }) => {
                    self.content.pop();
                    loop {
                        match self.content.last() {
                            Some(ContentRow::Data { .. }) => {
                                self.content.pop();
                                self.gutter.pop();
                                remaining -= 1;
                                break;
                            }
                            Some(ContentRow::NoNewline { .. }) | Some(ContentRow::Annotation { .. }) => {
                                self.content.pop();
                            }
                            _ => break,
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Prepend `prefix`'s rows, merging a trailing buffer in `prefix` with a
    /// leading buffer in `self` (the surviving mount) into one row.
    pub fn splice_prefix(&mut self, mut prefix: MountedColumn) {
        let merge = matches!(prefix.content.last(), Some(ContentRow::Buffer { .. }))
            && matches!(self.content.first(), Some(ContentRow::Buffer { .. }));
        if merge {
            let extra = match prefix.content.pop() {
                Some(ContentRow::Buffer { buffer_size }) => buffer_size,
                _ => unreachable!(),
            };
            prefix.gutter.pop();
            if let Some(ContentRow::Buffer { buffer_size }) = self.content.first_mut() {
                *buffer_size += extra;
            }
            if let Some(GutterCell::Spacer { buffer_size, .. }) = self.gutter.first_mut() {
                *buffer_size += extra;
            }
        }
        prefix.content.append(&mut self.content);
        prefix.gutter.append(&mut self.gutter);
        self.content = prefix.content;
        self.gutter = prefix.gutter;
    }

    /// Append `suffix`'s rows, merging a leading buffer in `suffix` with a
    /// trailing buffer in `self` into one row.
    pub fn splice_suffix(&mut self, mut suffix: MountedColumn) {
        let merge = matches!(self.content.last(), Some(ContentRow::Buffer { .. }))
            && matches!(suffix.content.first(), Some(ContentRow::Buffer { .. }));
        if merge {
            let extra = match suffix.content.remove(0) {
                ContentRow::Buffer { buffer_size } => buffer_size,
                _ => unreachable!(),
            };
            suffix.gutter.remove(0);
            if let Some(ContentRow::Buffer { buffer_size }) = self.content.last_mut() {
                *buffer_size += extra;
            }
            if let Some(GutterCell::Spacer { buffer_size, .. }) = self.gutter.last_mut() {
                *buffer_size += extra;
            }
        }
        self.content.append(&mut suffix.content);
        self.gutter.append(&mut suffix.gutter);
    }
}

fn shrink_buffer_front(column: &mut MountedColumn, amount: usize) -> Result<(), ReconcileError> {
    let Some(ContentRow::Buffer { buffer_size }) = column.content.first_mut() else {
        return Ok(());
    };
    *buffer_size = buffer_size.checked_sub(amount).ok_or(ReconcileError::NegativeBufferResize)?;
    if let Some(GutterCell::Spacer { buffer_size: gutter_size, kind }) = column.gutter.first_mut() {
        debug_assert_eq!(*kind, GutterBufferKind::Buffer);
        *gutter_size = gutter_size.checked_sub(amount).ok_or(ReconcileError::NegativeBufferResize)?;
    }
    Ok(())
}

fn shrink_buffer_back(column: &mut MountedColumn, amount: usize) -> Result<(), ReconcileError> {
    let Some(ContentRow::Buffer { buffer_size }) = column.content.last_mut() else {
        return Ok(());
    };
    *buffer_size = buffer_size.checked_sub(amount).ok_or(ReconcileError::NegativeBufferResize)?;
    if let Some(GutterCell::Spacer { buffer_size: gutter_size, kind }) = column.gutter.last_mut() {
        debug_assert_eq!(*kind, GutterBufferKind::Buffer);
        *gutter_size = gutter_size.checked_sub(amount).ok_or(ReconcileError::NegativeBufferResize)?;
    }
    Ok(())
}

/// The whole mounted tree for one instance: header plus one or two columns,
/// standing in for the real DOM subtree a host would otherwise own.
#[derive(Debug, Clone)]
pub struct MountedAst {
    pub header: Option<HeaderElement>,
    pub columns: Vec<MountedColumn>,
}

impl MountedAst {
    pub fn from_ast(ast: Ast) -> Self {
        Self {
            header: ast.header,
            columns: ast.columns.into_iter().map(MountedColumn::from_column).collect(),
        }
    }

    pub fn column(&self, side: ColumnSide) -> Option<&MountedColumn> {
        self.columns.iter().find(|c| c.side == side)
    }

    pub fn column_mut(&mut self, side: ColumnSide) -> Option<&mut MountedColumn> {
        self.columns.iter_mut().find(|c| c.side == side)
    }

    /// `spec.md` §4.4 "the column's `grid-row` CSS custom property is
    /// updated to span the new row total" — the reconciler doesn't own a
    /// real grid, so this is the count a host would apply to that property.
    pub fn row_total(&self) -> usize {
        self.columns.iter().map(|c| c.row_count()).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.content.is_empty())
    }
}
