//! Errors for sandbox operations.

use thiserror::Error;

/// Errors from [`crate::SandboxManager`] operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum SandboxError {
    /// The worker that owns this sandbox has shut down or panicked.
    #[error("sandbox worker for {0} is gone")]
    WorkerGone(String),

    /// A submitted job's own closure returned an error, surfaced verbatim.
    #[error("sandbox job failed: {0}")]
    JobFailed(String),

    /// The manager has already been shut down.
    #[error("sandbox manager is shut down")]
    ShutDown,
}
