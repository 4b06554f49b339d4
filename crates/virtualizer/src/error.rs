use thiserror::Error;

/// The virtualizer aggregates render failures across a heterogeneous set of
/// host-owned instances, so it carries them as `anyhow::Error` rather than
/// a closed `thiserror` enum — the concrete error type underneath (almost
/// always `viewer_instance::InstanceError`) isn't something this crate can
/// or should name.
#[derive(Debug, Error)]
pub enum VirtualizerError {
    #[error("instance {instance:?} failed to render: {source}")]
    InstanceRender {
        instance: viewer_instance::InstanceId,
        #[source]
        source: anyhow::Error,
    },
}
