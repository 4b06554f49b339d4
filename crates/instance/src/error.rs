use thiserror::Error;

use viewer_reconcile::ReconcileError;
use viewer_render::RenderError;

/// `SPEC_FULL.md` §8 kind 4 ("resource cleanup races") plus the propagation
/// wrapper for the two deeper crates' own error kinds (kinds 1 and 3). Kind 2
/// ("data absence") is not a variant here at all — it is `RenderOutcome::Pending`,
/// not an error, all the way up through this crate.
#[derive(Debug, Error)]
pub enum InstanceError {
    /// A render was requested after `cleanup()` on an instance that requires
    /// `enabled` to be checked (the diff instance; `spec.md` §7 kind 4).
    #[error("render requested after cleanup")]
    RenderAfterCleanup,
    /// Calling `cleanup()` itself is idempotent and never raises this; it is
    /// reserved for a caller that re-enters `cleanup` reentrantly from within
    /// a callback this crate does not expect to be reentered from.
    #[error("cleanup invoked while already cleaned up from a nested call")]
    AlreadyCleanedUp,
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}
