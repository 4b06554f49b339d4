//! Scroll-driven, incrementally rendered, syntax-highlighted code/diff
//! viewer core. This crate is the facade: it doesn't add behavior of its
//! own beyond wiring the lower crates together for the common case of one
//! source file or diff per instance — `viewer-diff` parses nothing,
//! `viewer-render` produces an `Ast`, `viewer-instance` turns that into a
//! windowed render decision, `viewer-reconcile` applies it incrementally,
//! and `viewer-virtualizer` drives the whole set across frames.

mod adapter;
mod collaborators;

pub use adapter::{FileDiffInstanceAdapter, FileInstanceAdapter};
pub use collaborators::{notify_collaborators, MouseEventManager, ResizeManager, SelectionManager};

pub use viewer_ast::{
    Ast, Column, ColumnSide, ContentRow, ExpandAffordance, FileChangeKind, GutterBufferKind,
    GutterCell, HeaderElement, LineIndex, RenderRange, RenderWindow, RowLineType, StyledSpan,
    VirtualFileMetrics,
};
pub use viewer_diff::{
    iterate, ChangeRun, ContextRun, DiffError, DiffParser, DiffStyle, ExpandDirection,
    ExpandedRegions, Expansion, FileContents, FileDiff, FileStatus, Hunk, HunkRun, LineRecord,
    LineType, RegionExpansion, SideLineMeta, ViewWindow,
};
pub use viewer_highlight::{HighlightError, HighlightRequest, Highlighter};
pub use viewer_instance::{
    approximate_diff_height, approximate_file_height, count_visible_lines,
    derive_diff_render_range, derive_file_render_range, load_from_str, FileDiffInstance,
    FileGeometry, FileInstance, HeightCache, InstanceError, InstanceId, ViewerConfig,
    ViewerConfigContext, ViewerConfigFile,
};
pub use viewer_reconcile::{MountedAst, MountedColumn, ReconcileError};
pub use viewer_render::{FileRenderer, RenderError, RenderOptions, RenderOutcome};
pub use viewer_virtualizer::{
    create_window_from_scroll_position, in_window, DomDirty, FrameClock, FrameOutcome,
    InstanceIdSet, ScrollMetrics, VirtualInstance, Virtualizer, VirtualizerError,
};
