//! Coordinates scroll, intersection, and resize signals across the set of
//! instances sharing one scroll container, driving each through the
//! [`VirtualInstance`] seam a host implements over its own instance
//! adapters.

mod anchor;
mod clock;
mod error;
mod instance_trait;
mod signals;
mod virtualizer;
mod window;

pub use clock::FrameClock;
pub use error::VirtualizerError;
pub use instance_trait::VirtualInstance;
pub use signals::{DomDirty, InstanceIdSet};
pub use virtualizer::{FrameOutcome, Virtualizer};
pub use window::{create_window_from_scroll_position, in_window, ScrollMetrics};
