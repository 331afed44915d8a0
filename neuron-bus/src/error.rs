//! Errors for bus operations.

use thiserror::Error;

/// Errors `EventBus::publish` can return.
#[non_exhaustive]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    /// A `TaskResponse` was already published for this task; the single-
    /// terminator invariant (§3, §8) forbids publishing anything further.
    #[error("task {0} already has a published TaskResponse; no further messages allowed")]
    TaskAlreadyTerminated(String),
}
