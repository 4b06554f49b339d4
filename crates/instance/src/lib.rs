//! The windowed file/file-diff instance (`spec.md` §4.3): owns one host
//! element's rendering lifecycle, derives render ranges from the shared
//! scroll window, and decides between no-op, partial-via-reconciler, and
//! full-rebuild renders.

mod config;
mod error;
mod height;
mod instance;
mod range;

pub use config::{ViewerConfig, ViewerConfigContext, ViewerConfigFile, load_from_str};
pub use error::InstanceError;
pub use height::HeightCache;
pub use instance::{FileDiffInstance, FileInstance};
pub use range::{
    approximate_diff_height, approximate_file_height, count_visible_lines, derive_diff_render_range,
    derive_file_render_range, FileGeometry,
};
pub use viewer_render::InstanceId;
