#![deny(missing_docs)]
//! Task scheduling, swarm topology, and the task-scoped `Context` for neuron
//! (spec components C4/C8/C9/C10/C11).
//!
//! Four pieces compose here:
//!
//! - [`Context`] — per-task shared state (token usage, cancellation,
//!   agent scratch info) threaded through every agent invocation.
//! - [`Swarm`] — a fixed, validated graph of agents and the `Workflow` /
//!   `Handoff` / `Team` edges between them.
//! - [`SwarmRunner`] — drives one task's agent-loop steps against a swarm
//!   (or a single agent), publishing every step to an `EventBus` and
//!   enforcing step limits and endless-loop detection.
//! - [`TaskScheduler`] — the submission surface: single/batch/streaming
//!   run, sequence-dependent batches, and timeout/cancellation.

mod context;
mod error;
mod runner;
mod scheduler;
mod swarm;
mod task;

pub use context::{Context, TokenUsage};
pub use error::TaskError;
pub use runner::SwarmRunner;
pub use scheduler::{Engine, RunConf, TaskScheduler};
pub use swarm::{Edge, EdgeKind, Swarm, SwarmBuildType};
pub use task::{AgentTarget, StreamingMode, Task, TaskConf, TaskResponse, TrajectoryStep};
