//! Errors produced while running a task to completion (§7).

use thiserror::Error;

/// Terminal failure classes a [`crate::TaskResponse`] can carry, and the
/// ones the scheduler itself can raise before a response is ever produced.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TaskError {
    /// The swarm's declared topology is unusable: an edge names an agent
    /// outside the known set, a workflow edge forms a cycle, or a team
    /// swarm declares more than one root agent.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// An agent emitted a handoff or delegate action naming a peer the
    /// topology does not permit from that agent.
    #[error("edge not permitted: {0}")]
    EdgeNotPermitted(String),

    /// The underlying operator invocation failed (model error, tool error,
    /// or any other [`layer0::error::OperatorError`]).
    #[error("agent failed: {0}")]
    AgentFailed(String),

    /// The task's step budget (`TaskConf::max_steps`) was exhausted before
    /// a final answer was reached.
    #[error("step limit exceeded (max_steps={0})")]
    StepLimit(u32),

    /// The same (from, to, observation) handoff repeated
    /// `endless_threshold` times in a row — almost certainly a loop.
    #[error("endless loop detected: {from} -> {to} repeated {count} times")]
    EndlessLoop {
        /// The agent handing off.
        from: String,
        /// The agent receiving control.
        to: String,
        /// How many consecutive identical handoffs were observed.
        count: u32,
    },

    /// The task's deadline elapsed before it finished.
    #[error("task timed out after {0}ms")]
    Timeout(u64),

    /// The task's `Context` was cancelled (caller requested cancellation or
    /// a parent task was cancelled) before it finished.
    #[error("task cancelled")]
    Cancelled,

    /// The event bus rejected a publish (§3/§8 single-terminator invariant).
    #[error("bus error: {0}")]
    Bus(String),

    /// Catch-all for conditions the other variants don't name.
    #[error("{0}")]
    Internal(String),
}

impl TaskError {
    /// The bit-stable short tag this error surfaces as `TaskResponse.msg`
    /// (§7, §8: `TaskResponse.msg == "step_limit"` iff the step bound was
    /// hit, etc.). Distinct from `Display`, which carries human detail for
    /// logs — the wire format freezes on these exact strings.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::InvalidTopology(_) => "invalid_topology",
            TaskError::EdgeNotPermitted(_) => "invalid_topology",
            TaskError::AgentFailed(_) => "tool_failed",
            TaskError::StepLimit(_) => "step_limit",
            TaskError::EndlessLoop { .. } => "endless_loop",
            TaskError::Timeout(_) => "timeout",
            TaskError::Cancelled => "cancelled",
            TaskError::Bus(_) => "internal",
            TaskError::Internal(_) => "internal",
        }
    }
}
