use ahash::AHashMap;

use viewer_ast::ColumnSide;

/// A single line annotation, emitted as a sibling `ContentRow::Annotation`
/// row immediately after its target line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub slot: String,
}

/// Annotations keyed by side and 1-based displayed line number, per
/// `spec.md` §4.2 `setLineAnnotations`.
#[derive(Debug, Clone, Default)]
pub struct LineAnnotations {
    entries: AHashMap<(ColumnSide, usize), Annotation>,
}

impl LineAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, side: ColumnSide, line_number: usize, annotation: Annotation) {
        self.entries.insert((side, line_number), annotation);
    }

    pub fn get(&self, side: ColumnSide, line_number: usize) -> Option<&Annotation> {
        self.entries.get(&(side, line_number))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Unified mode collapses an addition and a deletion annotation on the
    /// same context line into one row with two named slots.
    pub fn unified_pair(&self, line_number: usize) -> (Option<&Annotation>, Option<&Annotation>) {
        (
            self.get(ColumnSide::Additions, line_number),
            self.get(ColumnSide::Deletions, line_number),
        )
    }
}
