//! The file renderer: turns a `FileContents` or `FileDiff`, windowed by an
//! optional `RenderRange`, into an `Ast`. Owns the render and highlight
//! caches and the policy for choosing between worker-backed, in-process, and
//! plain-text highlighting (`spec.md` §4.2).

mod annotations;
mod cache;
mod emit;
mod options;

pub use annotations::{Annotation, LineAnnotations};
pub use emit::{EmitError, LineTextSource, PlainFileSource, PlainTextSource};
pub use options::{CacheFingerprint, HunkSeparatorRenderer, IndicatorStyle, Overflow, RenderOptions};

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, trace};

use viewer_ast::{Ast, ExpandAffordance, RenderRange};
use viewer_diff::{DiffError, Expansion, ExpandedRegions, ExpandDirection, FileContents, FileDiff};
use viewer_highlight::{
    HighlightCache, HighlightError, HighlightRequest, HighlightWorkerPool, Highlighter,
    ThemePreference, ThemeSet, WorkerMode,
};

use cache::{RenderCacheEntry, SourceIdentity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(pub usize);

/// The renderer's synchronous result contract, replacing a duck-typed
/// sentinel: ready to paint, or not-ready (the caller reschedules when
/// `on_render_update` fires).
#[derive(Debug, Clone)]
pub enum RenderOutcome {
    Ready(Ast),
    Pending,
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Diff(#[from] DiffError),
    #[error(transparent)]
    Emit(#[from] EmitError),
    #[error(transparent)]
    Highlight(#[from] HighlightError),
}

enum RenderSource {
    File(Arc<FileContents>),
    Diff(Arc<FileDiff>),
}

/// One host element's renderer. An instance (`viewer-instance`) owns
/// exactly one of these per `fileContainer`.
pub struct FileRenderer {
    instance_id: InstanceId,
    options: RenderOptions,
    annotations: LineAnnotations,
    theme_preference: ThemePreference,
    themes: Option<ThemeSet>,
    system_is_dark: bool,
    expanded_regions: ExpandedRegions,
    highlighter: Option<Box<dyn Highlighter>>,
    worker_pool: Option<HighlightWorkerPool>,
    highlight_cache: HighlightCache,
    render_cache: Option<RenderCacheEntry>,
    on_render_update: Option<Box<dyn FnMut(InstanceId) + Send>>,
    hydrated: bool,
}

impl FileRenderer {
    pub fn new(instance_id: InstanceId) -> Self {
        Self {
            instance_id,
            options: RenderOptions::default(),
            annotations: LineAnnotations::new(),
            theme_preference: ThemePreference::System,
            themes: None,
            system_is_dark: false,
            expanded_regions: ExpandedRegions::new(),
            highlighter: None,
            worker_pool: None,
            highlight_cache: HighlightCache::new(),
            render_cache: None,
            on_render_update: None,
            hydrated: false,
        }
    }

    pub fn set_highlighter(&mut self, highlighter: Box<dyn Highlighter>) {
        self.highlighter = Some(highlighter);
        self.render_cache = None;
        self.hydrated = false;
    }

    pub fn set_worker_pool(&mut self, pool: HighlightWorkerPool) {
        self.worker_pool = Some(pool);
    }

    pub fn set_themes(&mut self, themes: ThemeSet) {
        self.themes = Some(themes);
        self.render_cache = None;
        self.hydrated = false;
    }

    pub fn set_on_render_update(&mut self, callback: Box<dyn FnMut(InstanceId) + Send>) {
        self.on_render_update = Some(callback);
    }

    /// `spec.md` §4.2 `setOptions`: never invalidates the highlight cache by
    /// itself (that is keyed separately and keyed correctly regardless), but
    /// always invalidates this instance's own render cache since the
    /// options are part of its key.
    pub fn set_options(&mut self, options: RenderOptions) {
        self.options = options;
        self.render_cache = None;
        self.hydrated = false;
    }

    pub fn set_line_annotations(&mut self, annotations: LineAnnotations) {
        self.annotations = annotations;
        self.render_cache = None;
        self.hydrated = false;
    }

    pub fn set_theme_type(&mut self, preference: ThemePreference, system_is_dark: bool) {
        self.theme_preference = preference;
        self.system_is_dark = system_is_dark;
        self.render_cache = None;
        self.hydrated = false;
    }

    pub fn expand_hunk(
        &mut self,
        hunk_index: usize,
        direction: ExpandDirection,
        amount: usize,
        region_size: usize,
    ) {
        self.expanded_regions
            .expand(hunk_index, direction, amount, region_size);
        self.render_cache = None;
        self.hydrated = false;
        trace!(hunk_index, amount, "expanded hunk region");
    }

    /// `spec.md` §4.2 `hydrate`: the host already has an SSR-produced DOM
    /// tree for this source, so the next `render_diff`/`render_file` call
    /// returns `RenderOutcome::Pending` instead of emitting a fresh `Ast`,
    /// one time only. Any options change before that call (`set_options`,
    /// `set_line_annotations`, `set_theme_type`, `set_highlighter`,
    /// `set_themes`, `expand_hunk`) revokes the skip.
    pub fn hydrate(&mut self) {
        self.hydrated = true;
    }

    pub fn cleanup(&mut self) {
        self.render_cache = None;
        self.highlight_cache.clear();
        self.worker_pool = None;
        self.hydrated = false;
        debug!(instance = self.instance_id.0, "renderer cache dropped");
    }

    fn theme_name(&self) -> String {
        self.themes
            .as_ref()
            .map(|t| t.resolve(self.theme_preference, self.system_is_dark).to_string())
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn render_diff(
        &mut self,
        diff: Arc<FileDiff>,
        range: Option<RenderRange>,
    ) -> Result<RenderOutcome, RenderError> {
        let window = range.map(|r| viewer_diff::ViewWindow::new(r.starting_line, r.total_lines));
        let identity = SourceIdentity::of(&diff);
        let fingerprint = CacheFingerprint::new(self.theme_name(), &self.options);

        if let Some(entry) = &self.render_cache {
            if entry.satisfies(identity, &fingerprint, range) {
                trace!(instance = self.instance_id.0, "render cache hit");
                return Ok(RenderOutcome::Ready(entry.result.clone()));
            }
        }

        if self.hydrated {
            self.hydrated = false;
            trace!(instance = self.instance_id.0, "skipping emission for hydrated DOM");
            return Ok(RenderOutcome::Pending);
        }

        let lang = diff.new.language.clone();
        let expansion = Expansion::Map(&self.expanded_regions);

        if let Some(pool) = &mut self.worker_pool {
            if pool.mode() == WorkerMode::Working {
                let plain_source = PlainTextSource {
                    deletion_lines: &diff.deletion_lines,
                    addition_lines: &diff.addition_lines,
                };
                let ast = emit::emit_diff(
                    &diff,
                    window,
                    &expansion,
                    &self.options,
                    &self.annotations,
                    &plain_source,
                    false,
                )?;
                self.render_cache = Some(RenderCacheEntry {
                    source_identity: identity,
                    fingerprint: fingerprint.clone(),
                    highlighted: false,
                    result: ast.clone(),
                    render_range: range,
                });
                let request = HighlightRequest {
                    source: diff.new.contents.clone(),
                    lang,
                    themes: self.themes.clone().unwrap_or(ThemeSet::Single("default".into())),
                    tokenize_max_line_length: self.options.tokenize_max_line_length,
                };
                pool.request(request);
                return Ok(RenderOutcome::Ready(ast));
            }
        }

        if let Some(highlighter) = &mut self.highlighter {
            let has_lang = lang.as_deref().map(|l| highlighter.has_language(l)).unwrap_or(true);
            if has_lang {
                let request = HighlightRequest {
                    source: diff.new.contents.clone(),
                    lang: lang.clone(),
                    themes: self.themes.clone().unwrap_or(ThemeSet::Single("default".into())),
                    tokenize_max_line_length: self.options.tokenize_max_line_length,
                };
                let result = highlighter.code_to_hast(&request)?;
                let highlighted_source = HighlightedLineSource { result: &result };
                let ast = emit::emit_diff(
                    &diff,
                    window,
                    &expansion,
                    &self.options,
                    &self.annotations,
                    &highlighted_source,
                    false,
                )?;
                self.render_cache = Some(RenderCacheEntry {
                    source_identity: identity,
                    fingerprint,
                    highlighted: true,
                    result: ast.clone(),
                    render_range: range,
                });
                return Ok(RenderOutcome::Ready(ast));
            } else if let Some(l) = &lang {
                highlighter.attach_language(l);
            }
        }

        // No warm highlight available: always produce the plain-text
        // windowed result rather than blocking scrolling, per the
        // "scrolling is never blocked" policy — Pending is reserved for the
        // genuine absence of any highlighting mechanism.
        let plain_source = PlainTextSource {
            deletion_lines: &diff.deletion_lines,
            addition_lines: &diff.addition_lines,
        };
        let ast = emit::emit_diff(
            &diff,
            window,
            &expansion,
            &self.options,
            &self.annotations,
            &plain_source,
            false,
        )?;
        self.render_cache = Some(RenderCacheEntry {
            source_identity: identity,
            fingerprint,
            highlighted: false,
            result: ast.clone(),
            render_range: range,
        });
        Ok(RenderOutcome::Ready(ast))
    }

    /// The `file` (non-diff) counterpart to `render_diff`: same caching and
    /// three-tier highlight policy, emitting through `emit::emit_file`
    /// instead of `emit::emit_diff`.
    pub fn render_file(
        &mut self,
        file: Arc<FileContents>,
        range: Option<RenderRange>,
    ) -> Result<RenderOutcome, RenderError> {
        let window = range.map(|r| viewer_diff::ViewWindow::new(r.starting_line, r.total_lines));
        let identity = SourceIdentity::of(&file);
        let fingerprint = CacheFingerprint::new(self.theme_name(), &self.options);

        if let Some(entry) = &self.render_cache {
            if entry.satisfies(identity, &fingerprint, range) {
                trace!(instance = self.instance_id.0, "render cache hit");
                return Ok(RenderOutcome::Ready(entry.result.clone()));
            }
        }

        if self.hydrated {
            self.hydrated = false;
            trace!(instance = self.instance_id.0, "skipping emission for hydrated DOM");
            return Ok(RenderOutcome::Pending);
        }

        let lines: Vec<&str> = file.contents.split('\n').collect();
        let lang = file.language.clone();

        if let Some(pool) = &mut self.worker_pool {
            if pool.mode() == WorkerMode::Working {
                let plain_source = PlainFileSource { lines: &lines };
                let ast = emit::emit_file(&lines, window, &plain_source);
                self.render_cache = Some(RenderCacheEntry {
                    source_identity: identity,
                    fingerprint: fingerprint.clone(),
                    highlighted: false,
                    result: ast.clone(),
                    render_range: range,
                });
                let request = HighlightRequest {
                    source: file.contents.clone(),
                    lang,
                    themes: self.themes.clone().unwrap_or(ThemeSet::Single("default".into())),
                    tokenize_max_line_length: self.options.tokenize_max_line_length,
                };
                pool.request(request);
                return Ok(RenderOutcome::Ready(ast));
            }
        }

        if let Some(highlighter) = &mut self.highlighter {
            let has_lang = lang.as_deref().map(|l| highlighter.has_language(l)).unwrap_or(true);
            if has_lang {
                let request = HighlightRequest {
                    source: file.contents.clone(),
                    lang: lang.clone(),
                    themes: self.themes.clone().unwrap_or(ThemeSet::Single("default".into())),
                    tokenize_max_line_length: self.options.tokenize_max_line_length,
                };
                let result = highlighter.code_to_hast(&request)?;
                let highlighted_source = HighlightedLineSource { result: &result };
                let ast = emit::emit_file(&lines, window, &highlighted_source);
                self.render_cache = Some(RenderCacheEntry {
                    source_identity: identity,
                    fingerprint,
                    highlighted: true,
                    result: ast.clone(),
                    render_range: range,
                });
                return Ok(RenderOutcome::Ready(ast));
            } else if let Some(l) = &lang {
                highlighter.attach_language(l);
            }
        }

        let plain_source = PlainFileSource { lines: &lines };
        let ast = emit::emit_file(&lines, window, &plain_source);
        self.render_cache = Some(RenderCacheEntry {
            source_identity: identity,
            fingerprint,
            highlighted: false,
            result: ast.clone(),
            render_range: range,
        });
        Ok(RenderOutcome::Ready(ast))
    }

    /// Drains any results the worker pool has produced since the last call,
    /// discarding any whose source has since been replaced, and firing
    /// `on_render_update` for the ones that still match. Call once per
    /// frame after checking for visible diff instances.
    pub fn poll_highlight_results(&mut self, current: &Arc<FileDiff>) {
        let Some(pool) = &mut self.worker_pool else {
            return;
        };
        let current_identity = SourceIdentity::of(current);
        for (_, result) in pool.poll_results() {
            match result {
                Ok(_) if self.render_cache.as_ref().map(|e| e.source_identity) != Some(current_identity) => {
                    trace!("discarding stale highlight result: source replaced");
                }
                Ok(highlight_result) => {
                    let window = self
                        .render_cache
                        .as_ref()
                        .and_then(|e| e.render_range)
                        .map(|r| viewer_diff::ViewWindow::new(r.starting_line, r.total_lines));
                    let expansion = Expansion::Map(&self.expanded_regions);
                    let source = HighlightedLineSource {
                        result: &highlight_result,
                    };
                    if let Ok(ast) = emit::emit_diff(
                        current,
                        window,
                        &expansion,
                        &self.options,
                        &self.annotations,
                        &source,
                        false,
                    ) {
                        let fingerprint = CacheFingerprint::new(self.theme_name(), &self.options);
                        self.render_cache = Some(RenderCacheEntry {
                            source_identity: current_identity,
                            fingerprint,
                            highlighted: true,
                            result: ast,
                            render_range: None,
                        });
                        if let Some(cb) = &mut self.on_render_update {
                            cb(self.instance_id);
                        }
                    }
                }
                Err(err) => {
                    trace!(?err, "async highlight failed");
                }
            }
        }
    }

    /// The `file` counterpart to `poll_highlight_results`.
    pub fn poll_highlight_results_file(&mut self, current: &Arc<FileContents>) {
        let Some(pool) = &mut self.worker_pool else {
            return;
        };
        let current_identity = SourceIdentity::of(current);
        let lines: Vec<&str> = current.contents.split('\n').collect();
        for (_, result) in pool.poll_results() {
            match result {
                Ok(_) if self.render_cache.as_ref().map(|e| e.source_identity) != Some(current_identity) => {
                    trace!("discarding stale highlight result: source replaced");
                }
                Ok(highlight_result) => {
                    let window = self
                        .render_cache
                        .as_ref()
                        .and_then(|e| e.render_range)
                        .map(|r| viewer_diff::ViewWindow::new(r.starting_line, r.total_lines));
                    let source = HighlightedLineSource {
                        result: &highlight_result,
                    };
                    let ast = emit::emit_file(&lines, window, &source);
                    let fingerprint = CacheFingerprint::new(self.theme_name(), &self.options);
                    self.render_cache = Some(RenderCacheEntry {
                        source_identity: current_identity,
                        fingerprint,
                        highlighted: true,
                        result: ast,
                        render_range: None,
                    });
                    if let Some(cb) = &mut self.on_render_update {
                        cb(self.instance_id);
                    }
                }
                Err(err) => {
                    trace!(?err, "async highlight failed");
                }
            }
        }
    }
}

struct HighlightedLineSource<'a> {
    result: &'a viewer_highlight::HighlightResult,
}

impl LineTextSource for HighlightedLineSource<'_> {
    fn spans(&self, _side: viewer_ast::ColumnSide, idx: usize) -> Vec<viewer_ast::StyledSpan> {
        self.result
            .lines
            .get(idx)
            .map(|l| l.spans.clone())
            .unwrap_or_default()
    }
}

pub fn expand_affordance_for(up: bool, down: bool) -> ExpandAffordance {
    ExpandAffordance { up, down }
}

#[cfg(test)]
mod tests {
    use super::*;
    use viewer_diff::{ChangeRun, FileStatus, Hunk, HunkRun};

    fn sample_diff() -> Arc<FileDiff> {
        let hunk = Hunk {
            deletion_start: 1,
            deletion_count: 1,
            addition_start: 1,
            addition_count: 1,
            deletion_line_index: 0,
            addition_line_index: 0,
            unified_line_start: 0,
            unified_line_count: 2,
            split_line_start: 0,
            split_line_count: 1,
            collapsed_before: 0,
            hunk_content: vec![HunkRun::Change(ChangeRun {
                deletion_start: 0,
                deletion_count: 1,
                addition_start: 0,
                addition_count: 1,
            })],
            deletion_no_newline_at_eof: false,
            addition_no_newline_at_eof: false,
        };
        Arc::new(FileDiff {
            old: FileContents::new("f.rs", "old"),
            new: FileContents::new("f.rs", "new"),
            hunks: vec![hunk],
            addition_lines: vec!["new line".into()],
            deletion_lines: vec!["old line".into()],
            is_partial: false,
            file_status: FileStatus::Modified,
            old_path: None,
        })
    }

    #[test]
    fn render_without_highlighter_produces_plain_ast() {
        let mut renderer = FileRenderer::new(InstanceId(1));
        let diff = sample_diff();
        let outcome = renderer.render_diff(diff, None).unwrap();
        match outcome {
            RenderOutcome::Ready(ast) => assert!(!ast.is_empty()),
            RenderOutcome::Pending => panic!("expected a ready plain render"),
        }
    }

    #[test]
    fn render_cache_hits_on_identical_request() {
        let mut renderer = FileRenderer::new(InstanceId(1));
        let diff = sample_diff();
        renderer.render_diff(diff.clone(), None).unwrap();
        assert!(renderer.render_cache.is_some());
        let outcome = renderer.render_diff(diff, None).unwrap();
        assert!(matches!(outcome, RenderOutcome::Ready(_)));
    }

    #[test]
    fn render_cache_misses_on_option_change() {
        let mut renderer = FileRenderer::new(InstanceId(1));
        let diff = sample_diff();
        renderer.render_diff(diff.clone(), None).unwrap();
        renderer.set_options(RenderOptions {
            diff_style: viewer_diff::DiffStyle::Split,
            ..Default::default()
        });
        assert!(renderer.render_cache.is_none());
        renderer.render_diff(diff, None).unwrap();
        assert!(renderer.render_cache.as_ref().unwrap().highlighted == false);
    }

    #[test]
    fn hydrate_skips_emission_once_then_resumes_normal_rendering() {
        let mut renderer = FileRenderer::new(InstanceId(1));
        let diff = sample_diff();
        renderer.hydrate();

        let first = renderer.render_diff(diff.clone(), None).unwrap();
        assert!(matches!(first, RenderOutcome::Pending));
        assert!(renderer.render_cache.is_none());

        let second = renderer.render_diff(diff, None).unwrap();
        assert!(matches!(second, RenderOutcome::Ready(_)));
    }

    #[test]
    fn options_change_before_first_render_revokes_hydration_skip() {
        let mut renderer = FileRenderer::new(InstanceId(1));
        let diff = sample_diff();
        renderer.hydrate();
        renderer.set_options(RenderOptions {
            diff_style: viewer_diff::DiffStyle::Split,
            ..Default::default()
        });

        let outcome = renderer.render_diff(diff, None).unwrap();
        assert!(matches!(outcome, RenderOutcome::Ready(_)));
    }

    #[test]
    fn cleanup_drops_caches() {
        let mut renderer = FileRenderer::new(InstanceId(1));
        let diff = sample_diff();
        renderer.render_diff(diff, None).unwrap();
        renderer.cleanup();
        assert!(renderer.render_cache.is_none());
    }
}
