//! Row-level AST nodes: the gutter- and content-column elements the renderer
//! emits and the reconciler diffs against, mirroring the `data-*` attribute
//! contract a real DOM host applies CSS against.

/// `(unified, split)` view-space position of a row, carried verbatim on
/// `data-line-index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineIndex {
    pub unified: usize,
    pub split: usize,
}

/// `data-line-type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLineType {
    Context,
    ContextExpanded,
    ChangeAddition,
    ChangeDeletion,
}

/// Which code column a row or cell belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnSide {
    Unified,
    Deletions,
    Additions,
}

/// `data-gutter-buffer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GutterBufferKind {
    Annotation,
    Metadata,
    Buffer,
}

/// Which edges of a collapsed region a hunk separator can still reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExpandAffordance {
    pub up: bool,
    pub down: bool,
}

impl ExpandAffordance {
    pub fn both(&self) -> bool {
        self.up && self.down
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// A run of highlighted (or plain) text within a content row. The token
/// boundaries and `class` values originate with the external highlighter;
/// this crate only carries the shape, never interprets it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub text: String,
    pub class: Option<String>,
}

impl StyledSpan {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: None,
        }
    }

    pub fn styled(text: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: Some(class.into()),
        }
    }
}

/// One gutter-column cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GutterCell {
    Number {
        line_index: LineIndex,
        line_number: usize,
        line_type: RowLineType,
    },
    Spacer {
        kind: GutterBufferKind,
        buffer_size: usize,
    },
    Separator {
        hunk_index: usize,
        hidden: usize,
        expand: Option<(usize, ExpandAffordance)>,
    },
}

/// One content-column row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentRow {
    Data {
        line_index: LineIndex,
        line_type: RowLineType,
        spans: Vec<StyledSpan>,
    },
    Annotation {
        /// `"additions" | "deletions" | <custom id>`, matching
        /// `data-line-annotation`.
        slot: String,
        /// Populated when a unified-mode annotation collapses both sides'
        /// slots into a single row.
        secondary_slot: Option<String>,
    },
    NoNewline {
        line_type: RowLineType,
    },
    Separator {
        hunk_index: usize,
        hidden: usize,
        expand: Option<(usize, ExpandAffordance)>,
    },
    Buffer {
        buffer_size: usize,
    },
}

impl ContentRow {
    /// Data rows (and only data rows) advance the visible-line counter the
    /// reconciler's trim pass tracks; everything else is a sibling or
    /// spacer attached to the row before or after it.
    pub fn is_data_row(&self) -> bool {
        matches!(self, ContentRow::Data { .. })
    }

    pub fn is_buffer(&self) -> bool {
        matches!(self, ContentRow::Buffer { .. })
    }

    pub fn buffer_size(&self) -> Option<usize> {
        match self {
            ContentRow::Buffer { buffer_size } => Some(*buffer_size),
            _ => None,
        }
    }

    pub fn grow_buffer(&mut self, extra: usize) {
        if let ContentRow::Buffer { buffer_size } = self {
            *buffer_size += extra;
        }
    }

    /// The HTML fragment a host splices in at this row's position. The AST
    /// is the authoritative source of truth; this is templated off of it,
    /// never the other way around, so the reconciler's trim/splice pass
    /// keeps operating on the structured `ContentRow` and only calls this at
    /// the point a row actually needs to reach the host.
    pub fn to_html_fragment(&self) -> String {
        match self {
            ContentRow::Data { line_index, line_type, spans } => {
                let body: String = spans
                    .iter()
                    .map(|span| match &span.class {
                        Some(class) => format!(
                            "<span class=\"{}\">{}</span>",
                            escape_html(class),
                            escape_html(&span.text)
                        ),
                        None => escape_html(&span.text),
                    })
                    .collect();
                format!(
                    "<div data-line-index=\"{}:{}\" data-line-type=\"{}\">{}</div>",
                    line_index.unified,
                    line_index.split,
                    line_type_attr(*line_type),
                    body
                )
            }
            ContentRow::Annotation { slot, secondary_slot } => match secondary_slot {
                Some(secondary) => format!(
                    "<div data-line-annotation=\"{}\" data-line-annotation-secondary=\"{}\"></div>",
                    escape_html(slot),
                    escape_html(secondary)
                ),
                None => format!("<div data-line-annotation=\"{}\"></div>", escape_html(slot)),
            },
            ContentRow::NoNewline { line_type } => {
                format!("<div data-no-newline-at-eof data-line-type=\"{}\"></div>", line_type_attr(*line_type))
            }
            ContentRow::Separator { hunk_index, hidden, .. } => {
                format!("<div data-hunk-separator=\"{hunk_index}\" data-hidden-lines=\"{hidden}\"></div>")
            }
            ContentRow::Buffer { buffer_size } => {
                format!("<div data-gutter-buffer=\"buffer\" style=\"height:{buffer_size}px\"></div>")
            }
        }
    }
}

fn line_type_attr(line_type: RowLineType) -> &'static str {
    match line_type {
        RowLineType::Context => "context",
        RowLineType::ContextExpanded => "context-expanded",
        RowLineType::ChangeAddition => "addition",
        RowLineType::ChangeDeletion => "deletion",
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_row_escapes_span_text_and_class() {
        let row = ContentRow::Data {
            line_index: LineIndex { unified: 3, split: 1 },
            line_type: RowLineType::ChangeAddition,
            spans: vec![StyledSpan::styled("a < b && \"c\"", "tok<>")],
        };
        let html = row.to_html_fragment();
        assert!(html.contains("data-line-type=\"addition\""));
        assert!(html.contains("a &lt; b &amp;&amp; &quot;c&quot;"));
        assert!(html.contains("class=\"tok&lt;&gt;\""));
    }

    #[test]
    fn buffer_row_renders_height_style() {
        let row = ContentRow::Buffer { buffer_size: 48 };
        assert_eq!(row.to_html_fragment(), "<div data-gutter-buffer=\"buffer\" style=\"height:48px\"></div>");
    }
}
