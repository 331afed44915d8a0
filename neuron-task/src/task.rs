//! What gets submitted to a [`crate::TaskScheduler`] and what comes back
//! (spec component C10, wire format §6).

use crate::context::TokenUsage;
use crate::error::TaskError;
use crate::swarm::Swarm;
use layer0::content::Content;
use layer0::id::{AgentId, SessionId, TaskId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Whether a task streams intermediate messages or only returns the final
/// [`TaskResponse`] (§4.1, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingMode {
    /// Only the final `TaskResponse` is observable.
    Off,
    /// Every message published for this task is observable via the
    /// `EventBus`'s per-task stream as it happens.
    Core,
}

/// What a task is dispatched to: a single agent, or a declared [`Swarm`].
#[derive(Clone)]
pub enum AgentTarget {
    /// Dispatch directly to one agent by name.
    Single(AgentId),
    /// Dispatch into a swarm's topology, starting at its root agent(s).
    Swarm(Arc<Swarm>),
}

/// Per-task configuration (§4.8, §6).
#[derive(Debug, Clone)]
pub struct TaskConf {
    /// Upper bound on agent-loop steps for this task.
    pub max_steps: u32,
    /// Consecutive identical (from, to, observation) handoffs allowed
    /// before the runner raises [`TaskError::EndlessLoop`].
    pub endless_threshold: u32,
    /// Wall-clock budget for the whole task, if any.
    pub timeout_ms: Option<u64>,
    /// Extra time given to an in-flight step to wind down after the
    /// timeout fires before it is forcibly aborted.
    pub grace_ms: u64,
    /// Whether intermediate messages are observable as they're published.
    pub streaming: StreamingMode,
    /// When running as part of a `batch_run`, whether this task must
    /// complete before the next one in the batch starts.
    pub sequence_dependent: bool,
}

impl Default for TaskConf {
    fn default() -> Self {
        Self {
            max_steps: 25,
            endless_threshold: 3,
            timeout_ms: None,
            grace_ms: 2_000,
            streaming: StreamingMode::Off,
            sequence_dependent: false,
        }
    }
}

/// A unit of work submitted to a [`crate::TaskScheduler`].
#[derive(Clone)]
pub struct Task {
    /// This task's id.
    pub id: TaskId,
    /// The session it belongs to.
    pub session_id: SessionId,
    /// Optional caller-supplied grouping key (§6 `group_id`), used only
    /// for log correlation — the scheduler does not interpret it.
    pub group_id: Option<String>,
    /// The task that spawned this one, if this is a sub-task.
    pub parent_task_id: Option<TaskId>,
    /// The message that triggers the first agent invocation.
    pub input: Content,
    /// Which agent or swarm this task is dispatched to.
    pub target: AgentTarget,
    /// Tools the dispatched agent(s) may use. `None` defers to each
    /// operator's own defaults.
    pub tools_allowed: Option<HashSet<String>>,
    /// Per-task configuration.
    pub conf: TaskConf,
}

impl Task {
    /// Build a task dispatched to a single agent, with default configuration.
    pub fn single(id: TaskId, session_id: SessionId, agent: AgentId, input: Content) -> Self {
        Self {
            id,
            session_id,
            group_id: None,
            parent_task_id: None,
            input,
            target: AgentTarget::Single(agent),
            tools_allowed: None,
            conf: TaskConf::default(),
        }
    }

    /// Build a task dispatched into a swarm, with default configuration.
    pub fn swarm(id: TaskId, session_id: SessionId, swarm: Arc<Swarm>, input: Content) -> Self {
        let max_steps = swarm.max_steps;
        Self {
            id,
            session_id,
            group_id: None,
            parent_task_id: None,
            input,
            target: AgentTarget::Swarm(swarm),
            tools_allowed: None,
            conf: TaskConf {
                max_steps,
                ..TaskConf::default()
            },
        }
    }
}

/// One entry in a [`TaskResponse`]'s trajectory — a record of a single
/// agent-loop step, kept for audit/replay (§4.8, §6).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrajectoryStep {
    /// Position of this step within the task (1-indexed).
    pub step: u32,
    /// The agent that executed this step.
    pub agent: String,
    /// Short human-readable summary of what the step produced.
    pub summary: String,
    /// The operator's reported exit reason for this step.
    pub exit_reason: String,
}

/// The terminal outcome of a task (§6 wire format:
/// `eval_task_digest|group_id|task_id|duration_s|usage_json`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TaskResponse {
    /// The task this is the response for. Serialized as `"id"` (§6 wire
    /// contract), not `"task_id"`.
    #[serde(rename = "id")]
    pub task_id: TaskId,
    /// Whether the task reached a final answer without error.
    pub success: bool,
    /// The final answer text. Empty on failure.
    pub answer: String,
    /// Human-readable failure reason. Empty on success.
    pub msg: String,
    /// Token usage accumulated across every agent invoked, keyed by name.
    pub usage: HashMap<String, TokenUsage>,
    /// Ordered record of every agent-loop step taken.
    pub trajectory: Vec<TrajectoryStep>,
    /// Total wall-clock time the task took to run.
    pub time_cost_ms: u64,
}

impl TaskResponse {
    /// Build a successful response.
    pub fn success(
        task_id: TaskId,
        answer: impl Into<String>,
        usage: HashMap<String, TokenUsage>,
        trajectory: Vec<TrajectoryStep>,
        time_cost_ms: u64,
    ) -> Self {
        Self {
            task_id,
            success: true,
            answer: answer.into(),
            msg: String::new(),
            usage,
            trajectory,
            time_cost_ms,
        }
    }

    /// Build a failed response from a [`TaskError`], preserving whatever
    /// usage/trajectory had already accumulated. `msg` is the error's
    /// bit-stable `kind()` tag (e.g. `"step_limit"`, `"timeout"`), not its
    /// `Display` text — §7/§8 fix this as the wire contract.
    pub fn failure(
        task_id: TaskId,
        err: &TaskError,
        usage: HashMap<String, TokenUsage>,
        trajectory: Vec<TrajectoryStep>,
        time_cost_ms: u64,
    ) -> Self {
        Self {
            task_id,
            success: false,
            answer: String::new(),
            msg: err.kind().to_string(),
            usage,
            trajectory,
            time_cost_ms,
        }
    }
}
