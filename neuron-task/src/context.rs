//! The task-scoped `Context` (spec component C4).
//!
//! Distinct from `neuron-context`'s `ContextStrategy`, which compacts an
//! individual operator's conversation history. This `Context` is the
//! per-task envelope a [`crate::SwarmRunner`] threads through every agent
//! invocation: identity, accumulated token usage, per-agent scratch info,
//! and the cancellation/deadline signals that let a running task be cut
//! short cleanly.

use layer0::id::{SessionId, TaskId};
use neuron_ids::{Clock, MonotonicInstant};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Token counts for one agent's contribution to a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt/context.
    pub input_tokens: u64,
    /// Tokens generated in the response.
    pub output_tokens: u64,
    /// `input_tokens + output_tokens`, tracked separately so callers don't
    /// have to recompute it and risk drifting from what the provider billed.
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Build a usage record, deriving `total_tokens`.
    pub fn new(input_tokens: u64, output_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }

    fn accumulate(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

/// Per-task shared state threaded through every agent invocation in a
/// [`crate::SwarmRunner::run`] call.
///
/// Cheap to clone — the cancellation flag and deadline are shared across
/// clones, so cancelling one handle cancels every agent still running
/// under the same task.
#[derive(Clone)]
pub struct Context {
    /// The conversation session this task belongs to.
    pub session_id: SessionId,
    /// This task's id.
    pub task_id: TaskId,
    /// The task that spawned this one, if this is a sub-task.
    pub parent_task_id: Option<TaskId>,
    usage: Arc<Mutex<HashMap<String, TokenUsage>>>,
    agent_info: Arc<Mutex<HashMap<String, serde_json::Value>>>,
    cancelled: Arc<AtomicBool>,
    deadline: Option<MonotonicInstant>,
}

impl Context {
    /// Build a fresh context with no accumulated usage and no deadline.
    pub fn new(session_id: SessionId, task_id: TaskId, parent_task_id: Option<TaskId>) -> Self {
        Self {
            session_id,
            task_id,
            parent_task_id,
            usage: Arc::new(Mutex::new(HashMap::new())),
            agent_info: Arc::new(Mutex::new(HashMap::new())),
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: None,
        }
    }

    /// Attach a deadline, computed from `clock` and a millisecond budget.
    pub fn with_deadline(mut self, clock: &dyn Clock, budget_ms: u64) -> Self {
        self.deadline = Some(clock.monotonic_now().after(budget_ms));
        self
    }

    /// Add a usage record for `agent`, accumulating into any existing total.
    pub fn add_token(&self, agent: &str, usage: TokenUsage) {
        let mut map = self.usage.lock().unwrap();
        map.entry(agent.to_string())
            .or_insert_with(TokenUsage::default)
            .accumulate(usage);
    }

    /// Snapshot of accumulated usage, keyed by agent name.
    pub fn token_usage(&self) -> HashMap<String, TokenUsage> {
        self.usage.lock().unwrap().clone()
    }

    /// Record opaque per-agent scratch info (e.g. the last model used).
    pub fn set_agent_info(&self, agent: &str, info: serde_json::Value) {
        self.agent_info
            .lock()
            .unwrap()
            .insert(agent.to_string(), info);
    }

    /// Snapshot of per-agent scratch info.
    pub fn agent_info(&self) -> HashMap<String, serde_json::Value> {
        self.agent_info.lock().unwrap().clone()
    }

    /// Mark this task (and every clone sharing this context) as cancelled.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether [`Context::cancel`] has been called.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether `now` is at or past the configured deadline. Always `false`
    /// if no deadline was set.
    pub fn is_expired(&self, now: MonotonicInstant) -> bool {
        match self.deadline {
            Some(deadline) => now >= deadline,
            None => false,
        }
    }

    /// Fork an independent copy of the mutable bookkeeping (usage,
    /// agent_info) for a concurrent branch (e.g. parallel root agents),
    /// while still sharing the cancellation flag and deadline so a
    /// cancellation on one branch reaches every branch.
    pub fn deep_copy(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            task_id: self.task_id.clone(),
            parent_task_id: self.parent_task_id.clone(),
            usage: Arc::new(Mutex::new(self.usage.lock().unwrap().clone())),
            agent_info: Arc::new(Mutex::new(self.agent_info.lock().unwrap().clone())),
            cancelled: Arc::clone(&self.cancelled),
            deadline: self.deadline,
        }
    }

    /// Merge another context's accumulated usage into this one. Used to
    /// fold a `deep_copy`'d branch's usage back into the parent after it
    /// completes.
    pub fn merge_usage_from(&self, other: &Context) {
        let other_usage = other.token_usage();
        let mut map = self.usage.lock().unwrap();
        for (agent, usage) in other_usage {
            map.entry(agent)
                .or_insert_with(TokenUsage::default)
                .accumulate(usage);
        }
    }
}
