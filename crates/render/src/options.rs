use std::sync::Arc;

use viewer_ast::{ExpandAffordance, StyledSpan};
use viewer_diff::DiffStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overflow {
    Scroll,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorStyle {
    Bars,
    Classic,
}

/// Renders the content of a hunk separator row. Not `PartialEq`-able (it is
/// a closure), so `RenderOptions` tracks *whether* one is set separately —
/// the instance crate only needs to know that, never to compare two
/// closures for equality.
pub type HunkSeparatorRenderer =
    Arc<dyn Fn(usize, ExpandAffordance) -> Vec<StyledSpan> + Send + Sync>;

/// Presentation options, mirroring `spec.md` §4.2 `setOptions`.
#[derive(Clone)]
pub struct RenderOptions {
    pub diff_style: DiffStyle,
    pub overflow: Overflow,
    pub indicators: IndicatorStyle,
    pub disable_line_numbers: bool,
    pub background: bool,
    pub tokenize_max_line_length: Option<usize>,
    pub collapsed_context_threshold: usize,
    pub diff_algorithm: Option<String>,
    pub custom_hunk_separator: Option<HunkSeparatorRenderer>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            diff_style: DiffStyle::Unified,
            overflow: Overflow::Scroll,
            indicators: IndicatorStyle::Bars,
            disable_line_numbers: false,
            background: true,
            tokenize_max_line_length: None,
            collapsed_context_threshold: 3,
            diff_algorithm: None,
            custom_hunk_separator: None,
        }
    }
}

impl RenderOptions {
    /// True when a caller-supplied hunk-separator renderer makes partial
    /// rendering over the instance's reconciler unsafe (`spec.md` §4.3
    /// render-decision precondition): its output can't be assumed stable
    /// without re-invoking it, so the instance must fall back to a full
    /// rebuild whenever this is set.
    pub fn has_function_valued_hunk_separator(&self) -> bool {
        self.custom_hunk_separator.is_some()
    }
}

/// The subset of `RenderOptions` (plus theme) that actually invalidates the
/// highlight cache, per `spec.md` §4.2 caching rule: "does not invalidate
/// the highlight cache unless the theme, per-line tokenization limit, or
/// per-line diff algorithm changes."
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheFingerprint {
    pub theme_name: String,
    pub tokenize_max_line_length: Option<usize>,
    pub diff_algorithm: Option<String>,
}

impl CacheFingerprint {
    pub fn new(theme_name: impl Into<String>, options: &RenderOptions) -> Self {
        Self {
            theme_name: theme_name.into(),
            tokenize_max_line_length: options.tokenize_max_line_length,
            diff_algorithm: options.diff_algorithm.clone(),
        }
    }
}
