//! The syntax-highlighter seam: request/response types, the `Highlighter`
//! trait an external implementation (Tree-sitter, syntect, a WASM
//! shiki-alike, …) provides, and a worker-channel wrapper for running it off
//! the render thread.
//!
//! Token computation itself is explicitly out of scope (`spec.md` §1); this
//! crate only specifies the shape the core consumes.

mod cache;
mod theme;
mod worker;

pub use cache::{CacheKey, HighlightCache};
pub use theme::{ThemePreference, ThemeSet};
pub use worker::{HighlightWorkerPool, Job, JobResult, WorkerMode};

use thiserror::Error;
use viewer_ast::StyledSpan;

/// A `codeToHast`-equivalent request: source text plus the attributes that
/// change its tokenization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightRequest {
    pub source: String,
    pub lang: Option<String>,
    pub themes: ThemeSet,
    pub tokenize_max_line_length: Option<usize>,
}

/// One highlighted line, already split into styled spans ready to drop into
/// an `ast::ContentRow::Data`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightedLine {
    pub spans: Vec<StyledSpan>,
}

/// A full highlight result: per-line spans plus the theme CSS custom
/// properties the core injects on the `pre` block's `style=` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HighlightResult {
    pub lines: Vec<HighlightedLine>,
    pub theme_css_vars: Vec<(String, String)>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HighlightError {
    #[error("highlighter has no language attached for {0:?}")]
    LanguageNotAttached(Option<String>),
    #[error("worker channel disconnected")]
    WorkerDisconnected,
    #[error("highlight request referred to a source no longer current")]
    StaleSource,
}

/// Shape an in-process highlighter external to this crate must implement.
/// A real implementation wraps a tokenizer with its own language/theme
/// caches; this crate treats it as an opaque synchronous function.
pub trait Highlighter: Send + 'static {
    fn code_to_hast(&self, request: &HighlightRequest) -> Result<HighlightResult, HighlightError>;

    /// Whether `lang` is attached and ready for synchronous highlighting.
    /// A highlighter that attaches languages lazily can call this before
    /// `code_to_hast` to let the caller choose the plain-text-now,
    /// highlighted-later path (`spec.md` §4.2 policy 2).
    fn has_language(&self, lang: &str) -> bool;

    /// Begin attaching `lang` for future calls. No-op for a highlighter
    /// that has all languages available up front.
    fn attach_language(&mut self, lang: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubHighlighter {
        attached: Vec<String>,
    }

    impl Highlighter for StubHighlighter {
        fn code_to_hast(&self, request: &HighlightRequest) -> Result<HighlightResult, HighlightError> {
            let lang = request.lang.clone();
            if let Some(lang) = &lang {
                if !self.has_language(lang) {
                    return Err(HighlightError::LanguageNotAttached(Some(lang.clone())));
                }
            }
            let lines = request
                .source
                .lines()
                .map(|l| HighlightedLine {
                    spans: vec![StyledSpan::plain(l)],
                })
                .collect();
            Ok(HighlightResult {
                lines,
                theme_css_vars: vec![],
            })
        }

        fn has_language(&self, lang: &str) -> bool {
            self.attached.iter().any(|l| l == lang)
        }

        fn attach_language(&mut self, lang: &str) {
            self.attached.push(lang.to_string());
        }
    }

    #[test]
    fn rejects_unattached_language() {
        let highlighter = StubHighlighter { attached: vec![] };
        let request = HighlightRequest {
            source: "a\nb\n".into(),
            lang: Some("rust".into()),
            themes: ThemeSet::Single("dark".into()),
            tokenize_max_line_length: None,
        };
        let err = highlighter.code_to_hast(&request).unwrap_err();
        assert_eq!(err, HighlightError::LanguageNotAttached(Some("rust".into())));
    }

    #[test]
    fn attached_language_highlights_line_by_line() {
        let mut highlighter = StubHighlighter { attached: vec![] };
        highlighter.attach_language("rust");
        let request = HighlightRequest {
            source: "a\nb\n".into(),
            lang: Some("rust".into()),
            themes: ThemeSet::Single("dark".into()),
            tokenize_max_line_length: None,
        };
        let result = highlighter.code_to_hast(&request).unwrap();
        assert_eq!(result.lines.len(), 2);
    }
}
