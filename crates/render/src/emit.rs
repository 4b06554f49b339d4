//! Turns a windowed diff (or plain file) traversal into an `Ast`. This is
//! the emission half of `spec.md` §4.2: it consumes `viewer_diff::iterate`
//! and the annotation/option state the `FileRenderer` owns, and knows
//! nothing about caching or the highlighter worker.

use thiserror::Error;

use viewer_ast::{
    Ast, Column, ColumnSide, ContentRow, ExpandAffordance, GutterBufferKind, GutterCell,
    HeaderElement, LineIndex, RowLineType, StyledSpan,
};
use viewer_diff::{
    DiffError, DiffStyle, Expansion, FileDiff, FileStatus, LineRecord, LineType, ViewWindow,
    iterate,
};

use crate::annotations::LineAnnotations;
use crate::options::RenderOptions;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error(transparent)]
    Diff(#[from] DiffError),
}

/// Supplies the text a data row renders, decoupling emission from whether
/// the content came back highlighted, plain, or from a worker.
pub trait LineTextSource {
    fn spans(&self, side: ColumnSide, zero_based_index: usize) -> Vec<StyledSpan>;
}

/// The simplest possible source: one plain span per raw line. Used for the
/// "not ready yet" and "no highlighter attached" paths.
pub struct PlainTextSource<'a> {
    pub deletion_lines: &'a [String],
    pub addition_lines: &'a [String],
}

impl LineTextSource for PlainTextSource<'_> {
    fn spans(&self, side: ColumnSide, idx: usize) -> Vec<StyledSpan> {
        let text = match side {
            ColumnSide::Deletions => self.deletion_lines.get(idx),
            ColumnSide::Additions | ColumnSide::Unified => self.addition_lines.get(idx),
        };
        vec![StyledSpan::plain(text.cloned().unwrap_or_default())]
    }
}

struct ColumnBuilder {
    side: ColumnSide,
    gutter: Vec<GutterCell>,
    content: Vec<ContentRow>,
    pending_missing: usize,
}

impl ColumnBuilder {
    fn new(side: ColumnSide) -> Self {
        Self {
            side,
            gutter: Vec::new(),
            content: Vec::new(),
            pending_missing: 0,
        }
    }

    fn flush_missing(&mut self) {
        if self.pending_missing > 0 {
            self.gutter.push(GutterCell::Spacer {
                kind: GutterBufferKind::Buffer,
                buffer_size: self.pending_missing,
            });
            self.content.push(ContentRow::Buffer {
                buffer_size: self.pending_missing,
            });
            self.pending_missing = 0;
        }
    }

    fn note_missing(&mut self) {
        self.pending_missing += 1;
    }

    fn push_separator(&mut self, hunk_index: usize, hidden: usize, expand: Option<(usize, ExpandAffordance)>) {
        self.flush_missing();
        self.gutter.push(GutterCell::Separator {
            hunk_index,
            hidden,
            expand,
        });
        self.content.push(ContentRow::Separator {
            hunk_index,
            hidden,
            expand,
        });
    }

    fn push_data(
        &mut self,
        line_index: LineIndex,
        line_type: RowLineType,
        line_number: usize,
        spans: Vec<StyledSpan>,
        no_eof_cr: bool,
        annotations: &LineAnnotations,
    ) {
        self.flush_missing();
        self.gutter.push(GutterCell::Number {
            line_index,
            line_number,
            line_type,
        });
        self.content.push(ContentRow::Data {
            line_index,
            line_type,
            spans,
        });
        if no_eof_cr {
            self.content.push(ContentRow::NoNewline { line_type });
        }
        if self.side == ColumnSide::Unified {
            let (addition, deletion) = annotations.unified_pair(line_number);
            if addition.is_some() || deletion.is_some() {
                let (primary, secondary) = match (addition, deletion) {
                    (Some(a), d) => (a, d),
                    (None, Some(d)) => (d, None),
                    (None, None) => unreachable!(),
                };
                self.content.push(ContentRow::Annotation {
                    slot: primary.slot.clone(),
                    secondary_slot: secondary.map(|a| a.slot.clone()),
                });
            }
        } else if let Some(annotation) = annotations.get(self.side, line_number) {
            self.content.push(ContentRow::Annotation {
                slot: annotation.slot.clone(),
                secondary_slot: None,
            });
        }
    }

    fn finish(mut self) -> Column {
        self.flush_missing();
        Column {
            side: self.side,
            gutter: self.gutter,
            content: self.content,
        }
    }
}

fn row_line_type(line_type: LineType, is_addition: bool) -> RowLineType {
    match line_type {
        LineType::Context => RowLineType::Context,
        LineType::ContextExpanded => RowLineType::ContextExpanded,
        LineType::Change => {
            if is_addition {
                RowLineType::ChangeAddition
            } else {
                RowLineType::ChangeDeletion
            }
        }
    }
}

fn header_for(diff: &FileDiff) -> HeaderElement {
    use viewer_ast::FileChangeKind;
    let status = match diff.file_status {
        FileStatus::Added => FileChangeKind::Added,
        FileStatus::Modified => FileChangeKind::Modified,
        FileStatus::Deleted => FileChangeKind::Deleted,
        FileStatus::Renamed => FileChangeKind::Renamed,
        FileStatus::Copied => FileChangeKind::Copied,
    };
    HeaderElement {
        file_name: diff.new.name.clone(),
        old_path: diff.old_path.clone(),
        status: Some(status),
    }
}

/// Build an `Ast` for a windowed diff. `suppress_header` mirrors
/// `spec.md` §4.2's "header element (unless suppressed)".
#[allow(clippy::too_many_arguments)]
pub fn emit_diff(
    diff: &FileDiff,
    window: Option<ViewWindow>,
    expansion: &Expansion<'_>,
    options: &RenderOptions,
    annotations: &LineAnnotations,
    source: &dyn LineTextSource,
    suppress_header: bool,
) -> Result<Ast, EmitError> {
    let style = options.diff_style;
    match style {
        DiffStyle::Unified => emit_unified(diff, window, expansion, options, annotations, source, suppress_header),
        DiffStyle::Split | DiffStyle::Both => {
            emit_split(diff, window, expansion, options, annotations, source, suppress_header)
        }
    }
}

fn expand_affordance(record: &LineRecord, collapsed: usize) -> Option<(usize, ExpandAffordance)> {
    if collapsed == 0 {
        return None;
    }
    Some((
        record.hunk_index,
        ExpandAffordance { up: true, down: true },
    ))
}

fn emit_unified(
    diff: &FileDiff,
    window: Option<ViewWindow>,
    expansion: &Expansion<'_>,
    options: &RenderOptions,
    annotations: &LineAnnotations,
    source: &dyn LineTextSource,
    suppress_header: bool,
) -> Result<Ast, EmitError> {
    let mut column = ColumnBuilder::new(ColumnSide::Unified);
    iterate(
        diff,
        DiffStyle::Unified,
        window,
        expansion,
        options.collapsed_context_threshold,
        &mut |record| {
            if record.collapsed_before > 0 {
                column.push_separator(
                    record.hunk_index,
                    record.collapsed_before,
                    expand_affordance(&record, record.collapsed_before),
                );
            }
            let line_number = record
                .addition_line
                .map(|m| m.side_line_number)
                .or(record.deletion_line.map(|m| m.side_line_number))
                .unwrap_or(0);
            let is_addition = record.addition_line.is_some();
            let side = if record.addition_line.is_some() && record.deletion_line.is_none() {
                ColumnSide::Additions
            } else {
                ColumnSide::Deletions
            };
            let idx = record
                .addition_line
                .or(record.deletion_line)
                .map(|m| m.side_line_index)
                .unwrap_or(0);
            let spans = source.spans(
                if record.line_type == LineType::Change { side } else { ColumnSide::Additions },
                idx,
            );
            let no_eof_cr = record
                .addition_line
                .or(record.deletion_line)
                .map(|m| m.no_eof_cr)
                .unwrap_or(false);
            column.push_data(
                LineIndex {
                    unified: record
                        .addition_line
                        .or(record.deletion_line)
                        .map(|m| m.unified_line_index)
                        .unwrap_or(0),
                    split: record
                        .addition_line
                        .or(record.deletion_line)
                        .map(|m| m.split_line_index)
                        .unwrap_or(0),
                },
                row_line_type(record.line_type, is_addition),
                line_number,
                spans,
                no_eof_cr,
                annotations,
            );
            if record.collapsed_after > 0 {
                column.push_separator(
                    record.hunk_index + 1,
                    record.collapsed_after,
                    expand_affordance(&record, record.collapsed_after),
                );
            }
            false
        },
    )?;

    let mut ast = Ast::new(vec![column.finish()]);
    if !suppress_header {
        ast = ast.with_header(header_for(diff));
    }
    Ok(ast)
}

fn emit_split(
    diff: &FileDiff,
    window: Option<ViewWindow>,
    expansion: &Expansion<'_>,
    options: &RenderOptions,
    annotations: &LineAnnotations,
    source: &dyn LineTextSource,
    suppress_header: bool,
) -> Result<Ast, EmitError> {
    let mut deletions = ColumnBuilder::new(ColumnSide::Deletions);
    let mut additions = ColumnBuilder::new(ColumnSide::Additions);

    iterate(
        diff,
        options.diff_style,
        window,
        expansion,
        options.collapsed_context_threshold,
        &mut |record| {
            if record.collapsed_before > 0 {
                let expand = expand_affordance(&record, record.collapsed_before);
                deletions.push_separator(record.hunk_index, record.collapsed_before, expand);
                additions.push_separator(record.hunk_index, record.collapsed_before, expand);
            }

            if let Some(meta) = record.deletion_line {
                let spans = source.spans(ColumnSide::Deletions, meta.side_line_index);
                deletions.push_data(
                    LineIndex {
                        unified: meta.unified_line_index,
                        split: meta.split_line_index,
                    },
                    row_line_type(record.line_type, false),
                    meta.side_line_number,
                    spans,
                    meta.no_eof_cr,
                    annotations,
                );
            } else {
                deletions.note_missing();
            }

            if let Some(meta) = record.addition_line {
                let spans = source.spans(ColumnSide::Additions, meta.side_line_index);
                additions.push_data(
                    LineIndex {
                        unified: meta.unified_line_index,
                        split: meta.split_line_index,
                    },
                    row_line_type(record.line_type, true),
                    meta.side_line_number,
                    spans,
                    meta.no_eof_cr,
                    annotations,
                );
            } else {
                additions.note_missing();
            }

            if record.collapsed_after > 0 {
                let expand = expand_affordance(&record, record.collapsed_after);
                deletions.push_separator(record.hunk_index + 1, record.collapsed_after, expand);
                additions.push_separator(record.hunk_index + 1, record.collapsed_after, expand);
            }
            false
        },
    )?;

    let mut ast = Ast::new(vec![deletions.finish(), additions.finish()]);
    if !suppress_header {
        ast = ast.with_header(header_for(diff));
    }
    Ok(ast)
}

/// Plain-text source for the file (non-diff) variant: one line per entry,
/// no side distinction.
pub struct PlainFileSource<'a> {
    pub lines: &'a [&'a str],
}

impl LineTextSource for PlainFileSource<'_> {
    fn spans(&self, _side: ColumnSide, idx: usize) -> Vec<StyledSpan> {
        vec![StyledSpan::plain(self.lines.get(idx).copied().unwrap_or(""))]
    }
}

/// Build an `Ast` for a plain file window: one unified column, line by line.
pub fn emit_file(
    lines: &[&str],
    window: Option<ViewWindow>,
    source: &dyn LineTextSource,
) -> Ast {
    let mut column = ColumnBuilder::new(ColumnSide::Unified);
    let start = window.map(|w| w.starting_line).unwrap_or(0);
    let end = window
        .and_then(|w| w.total_lines)
        .map(|t| start + t)
        .unwrap_or(lines.len());
    for (idx, _) in lines.iter().enumerate().take(end.min(lines.len())).skip(start) {
        let spans = source.spans(ColumnSide::Unified, idx);
        column.push_data(
            LineIndex {
                unified: idx,
                split: idx,
            },
            RowLineType::Context,
            idx + 1,
            spans,
            false,
            &LineAnnotations::default(),
        );
    }
    Ast::new(vec![column.finish()])
}
