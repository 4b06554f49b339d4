//! Default [`VirtualInstance`] adapters over `viewer-instance`'s two
//! concrete instance types. `viewer-virtualizer` deliberately leaves this
//! wiring to "the host" rather than owning it (its own `FileInstance`/
//! `FileDiffInstance` split has no shared trait); this facade is that host
//! for the common single-source-per-instance case, so it owns the adapters
//! rather than making every caller reinvent them.

use std::sync::Arc;

use viewer_ast::{ContentRow, LineIndex, RenderWindow};
use viewer_diff::{DiffStyle, FileContents, FileDiff};
use viewer_instance::{FileDiffInstance, FileGeometry, FileInstance, InstanceId};
use viewer_virtualizer::VirtualInstance;

/// Wraps a [`FileInstance`] with the position and current source a host
/// updates once per frame before handing the adapter to
/// [`viewer_virtualizer::Virtualizer::run_frame`].
pub struct FileInstanceAdapter {
    instance: FileInstance,
    geometry: FileGeometry,
    source: Option<Arc<FileContents>>,
}

impl FileInstanceAdapter {
    pub fn new(instance: FileInstance, geometry: FileGeometry) -> Self {
        Self { instance, geometry, source: None }
    }

    pub fn instance(&self) -> &FileInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut FileInstance {
        &mut self.instance
    }

    pub fn set_geometry(&mut self, geometry: FileGeometry) {
        self.geometry = geometry;
    }

    pub fn set_source(&mut self, source: Arc<FileContents>) {
        self.source = Some(source);
    }
}

impl VirtualInstance for FileInstanceAdapter {
    fn id(&self) -> InstanceId {
        self.instance.id()
    }

    fn file_top(&self) -> f64 {
        self.geometry.file_top
    }

    fn file_height(&self) -> f64 {
        self.geometry.file_height
    }

    fn is_visible(&self) -> bool {
        self.instance.is_visible()
    }

    fn set_visibility(&mut self, visible: bool) {
        self.instance.set_visibility(visible);
    }

    fn on_render(&mut self, forced: bool, window: RenderWindow) -> Result<bool, anyhow::Error> {
        let Some(source) = self.source.clone() else {
            return Ok(false);
        };
        Ok(self.instance.on_render(forced, source, self.geometry, window)?)
    }

    fn reconcile_heights(&mut self, measured: &[(usize, bool, f64)]) -> bool {
        self.instance.reconcile_heights(measured)
    }

    fn topmost_data_row(&self) -> Option<LineIndex> {
        self.instance.topmost_data_row()
    }

    fn row_offset_from_top(&self, target: LineIndex) -> Option<f64> {
        self.instance.row_offset_from_top(target)
    }

    fn mounted_rows(&self) -> &[ContentRow] {
        self.instance
            .mounted()
            .and_then(|mounted| mounted.columns.first())
            .map(|column| column.content.as_slice())
            .unwrap_or(&[])
    }
}

/// Wraps a [`FileDiffInstance`] the same way [`FileInstanceAdapter`] wraps a
/// [`FileInstance`].
pub struct FileDiffInstanceAdapter {
    instance: FileDiffInstance,
    geometry: FileGeometry,
    style: DiffStyle,
    source: Option<Arc<FileDiff>>,
}

impl FileDiffInstanceAdapter {
    pub fn new(instance: FileDiffInstance, geometry: FileGeometry, style: DiffStyle) -> Self {
        Self { instance, geometry, style, source: None }
    }

    pub fn instance(&self) -> &FileDiffInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut FileDiffInstance {
        &mut self.instance
    }

    pub fn set_geometry(&mut self, geometry: FileGeometry) {
        self.geometry = geometry;
    }

    pub fn set_style(&mut self, style: DiffStyle) {
        self.style = style;
    }

    pub fn set_source(&mut self, source: Arc<FileDiff>) {
        self.source = Some(source);
    }
}

impl VirtualInstance for FileDiffInstanceAdapter {
    fn id(&self) -> InstanceId {
        self.instance.id()
    }

    fn file_top(&self) -> f64 {
        self.geometry.file_top
    }

    fn file_height(&self) -> f64 {
        self.geometry.file_height
    }

    fn is_visible(&self) -> bool {
        self.instance.is_visible()
    }

    fn set_visibility(&mut self, visible: bool) {
        self.instance.set_visibility(visible);
    }

    fn on_render(&mut self, dirty: bool, window: RenderWindow) -> Result<bool, anyhow::Error> {
        let Some(source) = self.source.clone() else {
            return Ok(false);
        };
        Ok(self.instance.on_render(dirty, source, self.style, self.geometry, window)?)
    }

    fn reconcile_heights(&mut self, measured: &[(usize, bool, f64)]) -> bool {
        self.instance.reconcile_heights(measured)
    }

    fn topmost_data_row(&self) -> Option<LineIndex> {
        self.instance.topmost_data_row()
    }

    fn row_offset_from_top(&self, target: LineIndex) -> Option<f64> {
        self.instance.row_offset_from_top(target)
    }

    fn mounted_rows(&self) -> &[ContentRow] {
        self.instance
            .mounted()
            .and_then(|mounted| mounted.columns.first())
            .map(|column| column.content.as_slice())
            .unwrap_or(&[])
    }
}
