//! Instance-level tunables, deserialized from an optional TOML document the
//! same way `core-config::ConfigFile` is: `#[serde(default)]` throughout, so
//! a missing document or a document missing individual tables still yields a
//! usable config, and a companion `*Context` clamps the parsed values
//! against runtime geometry the file itself can't know.

use serde::Deserialize;

/// Runtime geometry `ViewerConfigContext::clamp` needs that isn't knowable
/// from the config file alone — the viewport height in pixels and the
/// metrics the file was parsed against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerConfigContext {
    pub viewport_height_px: f64,
    pub line_height_px: f64,
}

impl ViewerConfigContext {
    pub fn new(viewport_height_px: f64, line_height_px: f64) -> Self {
        Self {
            viewport_height_px,
            line_height_px,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ViewerConfigFile {
    #[serde(default = "ViewerConfigFile::default_overscan_px")]
    pub overscan_px: f64,
    #[serde(default = "ViewerConfigFile::default_hunk_line_count")]
    pub hunk_line_count: usize,
    #[serde(default = "ViewerConfigFile::default_collapsed_context_threshold")]
    pub collapsed_context_threshold: usize,
    #[serde(default = "ViewerConfigFile::default_expansion_line_count")]
    pub expansion_line_count: usize,
    #[serde(default = "ViewerConfigFile::default_intersection_observer_margin_factor")]
    pub intersection_observer_margin_factor: f64,
}

impl ViewerConfigFile {
    const fn default_overscan_px() -> f64 {
        600.0
    }
    const fn default_hunk_line_count() -> usize {
        50
    }
    const fn default_collapsed_context_threshold() -> usize {
        5
    }
    const fn default_expansion_line_count() -> usize {
        20
    }
    const fn default_intersection_observer_margin_factor() -> f64 {
        4.0
    }
}

impl Default for ViewerConfigFile {
    fn default() -> Self {
        Self {
            overscan_px: Self::default_overscan_px(),
            hunk_line_count: Self::default_hunk_line_count(),
            collapsed_context_threshold: Self::default_collapsed_context_threshold(),
            expansion_line_count: Self::default_expansion_line_count(),
            intersection_observer_margin_factor: Self::default_intersection_observer_margin_factor(),
        }
    }
}

/// The parsed file plus its runtime-clamped effective values. Mirrors
/// `core_config::Config`'s `{raw, file, effective_*}` split.
#[derive(Debug, Clone, Default)]
pub struct ViewerConfig {
    pub file: ViewerConfigFile,
    pub effective_overscan_px: f64,
    pub effective_hunk_line_count: usize,
}

/// Parses `text` as TOML; unknown keys are ignored exactly like
/// `core-config`, and a parse error falls back to all-default rather than
/// failing the caller's render path over a malformed config file.
pub fn load_from_str(text: &str) -> ViewerConfig {
    let file = toml::from_str::<ViewerConfigFile>(text).unwrap_or_default();
    let mut config = ViewerConfig {
        file,
        effective_overscan_px: 0.0,
        effective_hunk_line_count: 0,
    };
    config.apply_context(ViewerConfigContext::new(0.0, 0.0));
    config
}

impl ViewerConfig {
    pub fn apply_context(&mut self, ctx: ViewerConfigContext) -> (f64, usize) {
        // overscan is never allowed to collapse the render window to nothing:
        // clamp to at least one viewport height so `intersectionObserverMargin`
        // (4x overscan) still gives the instance room to render ahead of scroll.
        let min_overscan = ctx.line_height_px.max(1.0);
        self.effective_overscan_px = self.file.overscan_px.max(min_overscan);
        self.effective_hunk_line_count = self.file.hunk_line_count.max(1);
        (self.effective_overscan_px, self.effective_hunk_line_count)
    }

    pub fn intersection_observer_margin(&self) -> f64 {
        self.effective_overscan_px * self.file.intersection_observer_margin_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_document_empty() {
        let cfg = load_from_str("");
        assert_eq!(cfg.file.hunk_line_count, 50);
        assert_eq!(cfg.file.collapsed_context_threshold, 5);
    }

    #[test]
    fn parses_partial_document() {
        let cfg = load_from_str("hunk_line_count = 80\n");
        assert_eq!(cfg.file.hunk_line_count, 80);
        assert_eq!(cfg.file.overscan_px, 600.0);
    }

    #[test]
    fn malformed_document_falls_back_to_defaults() {
        let cfg = load_from_str("not valid toml {{{");
        assert_eq!(cfg.file, ViewerConfigFile::default());
    }

    #[test]
    fn overscan_clamped_to_at_least_one_line() {
        let mut cfg = load_from_str("overscan_px = 0\n");
        cfg.apply_context(ViewerConfigContext::new(400.0, 20.0));
        assert!(cfg.effective_overscan_px >= 20.0);
    }

    #[test]
    fn intersection_margin_is_four_times_overscan_by_default() {
        let mut cfg = load_from_str("overscan_px = 100\n");
        cfg.apply_context(ViewerConfigContext::new(400.0, 20.0));
        assert_eq!(cfg.intersection_observer_margin(), 400.0);
    }
}
