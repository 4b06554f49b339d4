//! Diff data model and the diff iterator.
//!
//! This crate owns the shape of a parsed diff (`FileDiff`) and the single
//! traversal primitive (`iterate`) that every other crate in the workspace
//! reuses for total-line counting, height estimation, window selection, and
//! AST emission. It does not parse diffs from raw file blobs — that is an
//! external collaborator's job (see `DiffParser`); this crate only specifies
//! the shape the collaborator must produce.

mod iter;
mod model;

pub use iter::{
    ExpandDirection, ExpandedRegions, Expansion, LineRecord, LineType, RegionExpansion,
    SideLineMeta, ViewWindow, iterate,
};
pub use model::{ChangeRun, ContextRun, FileContents, FileDiff, FileStatus, Hunk, HunkRun};

use thiserror::Error;

/// Either presentation the iterator (and everything downstream) can be asked
/// to walk in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStyle {
    Unified,
    Split,
    Both,
}

/// Errors the diff model and iterator can raise. These are all contract
/// violations (§7 kind 1 in SPEC_FULL.md): the caller is expected to treat
/// them as unrecoverable for the current diff, never to paper over them.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiffError {
    #[error(
        "trailing context mismatch: addition_remaining={addition_remaining} deletion_remaining={deletion_remaining}"
    )]
    TrailingContextMismatch {
        addition_remaining: usize,
        deletion_remaining: usize,
    },
    #[error("hunk index {0} out of range")]
    HunkIndexOutOfRange(usize),
    #[error("expansion direction requires a trailing or leading region, but hunk {0} has none")]
    NoExpandableRegion(usize),
}

/// Shape a diff parser external to this crate must produce. Parsing from two
/// raw blobs is explicitly out of scope (spec.md §1); this trait exists only
/// to name the seam.
pub trait DiffParser {
    fn parse(&self, old: &FileContents, new: &FileContents) -> Result<FileDiff, DiffError>;
}
