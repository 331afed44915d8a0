//! Errors from executing a single effect.

use layer0::error::StateError;
use thiserror::Error;

/// Errors that can occur while interpreting an [`crate::Effect`][layer0::Effect].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum EffectError {
    /// The state backend rejected a memory read/write/delete.
    #[error("state error: {0}")]
    State(#[from] StateError),

    /// The executor failed for a reason outside the state/orchestrator boundary.
    #[error("effect execution failed: {0}")]
    Failed(String),
}
