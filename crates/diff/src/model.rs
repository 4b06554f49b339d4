use crate::DiffError;

/// A named, optionally language-tagged blob of source text.
///
/// The core never mutates a `FileContents`; it is treated as immutable by
/// identity (callers compare `stable_key`, or fall back to pointer/clone
/// identity for cache invalidation in `viewer-render`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContents {
    pub name: String,
    pub contents: String,
    pub language: Option<String>,
    pub stable_key: Option<String>,
}

impl FileContents {
    /// Construct a new `FileContents`. Rejects embedded NUL bytes: a text
    /// buffer-adjacent type in this codebase never carries content that
    /// could desynchronize byte offsets from what a terminal/DOM host can
    /// represent.
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        let contents = contents.into();
        debug_assert!(
            !contents.contains('\0'),
            "FileContents must not contain NUL bytes"
        );
        Self {
            name: name.into(),
            contents,
            language: None,
            stable_key: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_stable_key(mut self, key: impl Into<String>) -> Self {
        self.stable_key = Some(key.into());
        self
    }

    pub fn byte_len(&self) -> usize {
        self.contents.len()
    }

    pub fn line_count(&self) -> usize {
        if self.contents.is_empty() {
            return 0;
        }
        self.contents.split('\n').count()
    }
}

/// File-level change classification, following what essentially every real
/// diff model in the retrieval pack carries alongside `hunks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
}

/// A run of unchanged lines shared by both sides of a hunk's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextRun {
    pub deletion_start: usize,
    pub addition_start: usize,
    pub count: usize,
}

/// A run of changed lines: `deletions` then `additions`, each a half-open
/// index range into `FileDiff::deletion_lines` / `FileDiff::addition_lines`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRun {
    pub deletion_start: usize,
    pub deletion_count: usize,
    pub addition_start: usize,
    pub addition_count: usize,
}

impl ChangeRun {
    pub fn unified_len(&self) -> usize {
        self.deletion_count + self.addition_count
    }

    pub fn split_len(&self) -> usize {
        self.deletion_count.max(self.addition_count)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HunkRun {
    Context(ContextRun),
    Change(ChangeRun),
}

/// A contiguous change region in a diff, bracketed by unchanged context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub deletion_start: usize,
    pub deletion_count: usize,
    pub addition_start: usize,
    pub addition_count: usize,
    /// 0-based offset into `FileDiff::deletion_lines` where this hunk's
    /// lines begin.
    pub deletion_line_index: usize,
    /// 0-based offset into `FileDiff::addition_lines` where this hunk's
    /// lines begin.
    pub addition_line_index: usize,
    pub unified_line_start: usize,
    pub unified_line_count: usize,
    pub split_line_start: usize,
    pub split_line_count: usize,
    /// Number of unchanged lines elided immediately before this hunk.
    pub collapsed_before: usize,
    pub hunk_content: Vec<HunkRun>,
    pub deletion_no_newline_at_eof: bool,
    pub addition_no_newline_at_eof: bool,
}

/// A parsed diff between two `FileContents`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub old: FileContents,
    pub new: FileContents,
    pub hunks: Vec<Hunk>,
    pub addition_lines: Vec<String>,
    pub deletion_lines: Vec<String>,
    /// True when trailing context beyond the last hunk is not available
    /// (e.g. the parser only had a partial blob).
    pub is_partial: bool,
    pub file_status: FileStatus,
    pub old_path: Option<String>,
}

impl FileDiff {
    /// The synthetic region index identifying the trailing collapsed region
    /// in an expanded-regions map (spec: "reserve `hunks.length` as its
    /// key").
    pub fn trailing_region_index(&self) -> usize {
        self.hunks.len()
    }

    pub fn deletion_no_newline_at_eof(&self) -> bool {
        self.hunks
            .last()
            .map(|h| h.deletion_no_newline_at_eof)
            .unwrap_or(false)
    }

    pub fn addition_no_newline_at_eof(&self) -> bool {
        self.hunks
            .last()
            .map(|h| h.addition_no_newline_at_eof)
            .unwrap_or(false)
    }

    /// Number of lines elided after the last hunk, if the diff is well
    /// formed. `Ok(None)` means the last hunk reaches both files' ends (no
    /// trailing region). `Ok(Some(0))` is a valid, empty trailing region
    /// (the two files end exactly where the last hunk ends).
    pub fn trailing_collapsed(&self) -> Result<Option<usize>, DiffError> {
        if self.is_partial {
            return Ok(None);
        }
        let Some(last) = self.hunks.last() else {
            // No hunks at all: the whole file, if any, is one trailing region.
            let addition_remaining = self.addition_lines.len();
            let deletion_remaining = self.deletion_lines.len();
            if addition_remaining != deletion_remaining {
                return Err(DiffError::TrailingContextMismatch {
                    addition_remaining,
                    deletion_remaining,
                });
            }
            return Ok(Some(addition_remaining));
        };
        let addition_end = last.addition_line_index + last.addition_count;
        let deletion_end = last.deletion_line_index + last.deletion_count;
        let addition_remaining = self.addition_lines.len().saturating_sub(addition_end);
        let deletion_remaining = self.deletion_lines.len().saturating_sub(deletion_end);
        let addition_reaches_end = addition_end >= self.addition_lines.len();
        let deletion_reaches_end = deletion_end >= self.deletion_lines.len();
        if addition_reaches_end != deletion_reaches_end {
            return Err(DiffError::TrailingContextMismatch {
                addition_remaining,
                deletion_remaining,
            });
        }
        if addition_reaches_end {
            return Ok(None);
        }
        if addition_remaining != deletion_remaining {
            return Err(DiffError::TrailingContextMismatch {
                addition_remaining,
                deletion_remaining,
            });
        }
        Ok(Some(addition_remaining))
    }
}
