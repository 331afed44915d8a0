//! `TaskScheduler` — submission entry points, timeout/cancellation
//! enforcement, and batch execution over a [`SwarmRunner`] (§4.9, spec
//! component C10).

use crate::context::Context;
use crate::error::TaskError;
use crate::runner::SwarmRunner;
use crate::task::{Task, TaskConf, TaskResponse};
use layer0::content::Content;
use layer0::id::{SessionId, TaskId};
use neuron_bus::{CallType, Message, MessageCategory, TaskStream, Topic};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Which runtime engine a task is executed on (§4.9). Correctness does not
/// depend on the choice — `Pool` and `Distributed` are accepted as
/// configuration so callers can route work today and swap the execution
/// substrate later without touching call sites; both currently run the
/// same in-process path as `Local`, since a worker-loop pool and an RPC
/// stub are deployment concerns outside this crate's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// Run on the current process's event loop (default).
    #[default]
    Local,
    /// Run on a dedicated loop from a reusable worker pool.
    Pool,
    /// Dispatch to a remote runtime over RPC.
    Distributed,
}

/// Configuration for one [`TaskScheduler::run_task`]/[`TaskScheduler::batch_run`]
/// call, distinct from the per-task [`TaskConf`] carried on each [`Task`].
#[derive(Debug, Clone, Default)]
pub struct RunConf {
    /// Which engine executes the task(s).
    pub engine: Engine,
}

/// Accepts [`Task`]s and drives them to a [`TaskResponse`] through a
/// [`SwarmRunner`], applying the per-task timeout/cancellation contract
/// (§4.9, §4.3) uniformly regardless of submission shape.
pub struct TaskScheduler {
    runner: Arc<SwarmRunner>,
}

impl TaskScheduler {
    /// Build a scheduler over a runner.
    pub fn new(runner: Arc<SwarmRunner>) -> Self {
        Self { runner }
    }

    /// Run a single task to completion.
    pub async fn run_task(&self, task: Task, _run_conf: RunConf) -> TaskResponse {
        run_with_timeout(&self.runner, task).await
    }

    /// Run many tasks concurrently, returning a response per task id.
    pub async fn run_tasks(
        &self,
        tasks: Vec<Task>,
        _run_conf: RunConf,
    ) -> HashMap<TaskId, TaskResponse> {
        let runner = &self.runner;
        let futures = tasks.into_iter().map(|task| async move {
            let id = task.id.clone();
            (id, run_with_timeout(runner, task).await)
        });
        futures_util::future::join_all(futures)
            .await
            .into_iter()
            .collect()
    }

    /// Start a task and return a live view of its message stream, ordered,
    /// terminated by the task's `TaskResponse` (§4.1, §4.10). The task runs
    /// concurrently in the background; callers that also want the final
    /// `TaskResponse` value can read it off the last message the stream
    /// yields, since that message's payload *is* the response (§6).
    pub async fn streaming_run_task(&self, task: Task) -> TaskStream {
        let bus = self.runner.bus();
        bus.register_task(task.id.clone()).await;
        let stream = bus
            .get(&task.id)
            .await
            .expect("freshly registered task stream is never already taken");

        let runner = Arc::clone(&self.runner);
        tokio::spawn(async move {
            run_with_timeout(&runner, task).await;
        });

        stream
    }

    /// Run `inputs` against `agent_or_swarm` as independent tasks with
    /// fresh ids and session ids, `batch_size` at a time. When
    /// `conf.sequence_dependent` is set, tasks instead run strictly one
    /// after another, each receiving the previous task's answer as its
    /// input; the first failure halts the sequence and the remaining
    /// inputs are not run (§4.9).
    pub async fn batch_run(
        &self,
        make_task: impl Fn(TaskId, SessionId, Content) -> Task,
        inputs: Vec<Content>,
        batch_size: usize,
        conf: &TaskConf,
        _run_conf: RunConf,
    ) -> Vec<TaskResponse> {
        if conf.sequence_dependent {
            return self.run_sequence_dependent(make_task, inputs).await;
        }

        let batch_size = batch_size.max(1);
        let mut responses = Vec::with_capacity(inputs.len());
        for chunk in inputs.chunks(batch_size) {
            let tasks: Vec<Task> = chunk
                .iter()
                .map(|input| {
                    make_task(
                        neuron_ids::new_task_id(),
                        SessionId::new(neuron_ids::new_opaque_id()),
                        input.clone(),
                    )
                })
                .collect();
            let runner = &self.runner;
            let futures = tasks.into_iter().map(|task| run_with_timeout(runner, task));
            responses.extend(futures_util::future::join_all(futures).await);
        }
        responses
    }

    async fn run_sequence_dependent(
        &self,
        make_task: impl Fn(TaskId, SessionId, Content) -> Task,
        inputs: Vec<Content>,
    ) -> Vec<TaskResponse> {
        let mut responses = Vec::with_capacity(inputs.len());
        let mut next_input = None;
        for input in inputs {
            let input = next_input.take().unwrap_or(input);
            let task = make_task(
                neuron_ids::new_task_id(),
                SessionId::new(neuron_ids::new_opaque_id()),
                input,
            );
            let response = run_with_timeout(&self.runner, task).await;
            let halt = !response.success;
            next_input = Some(Content::text(response.answer.clone()));
            responses.push(response);
            if halt {
                break;
            }
        }
        responses
    }

    /// A blocking wrapper over [`Self::run_task`], for callers (e.g. a CLI
    /// entry point) without their own async runtime already driving.
    pub fn sync_run(&self, task: Task, run_conf: RunConf) -> TaskResponse {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => tokio::task::block_in_place(|| handle.block_on(self.run_task(task, run_conf))),
            Err(_) => {
                let rt = tokio::runtime::Runtime::new().expect("failed to start a runtime for sync_run");
                rt.block_on(self.run_task(task, run_conf))
            }
        }
    }
}

/// Runs `task` to completion, enforcing `task.conf.timeout_ms` by cancelling
/// its `Context` and giving it `grace_ms` to wind down before abandoning it
/// (§4.3, §4.9, §7). The `TaskResponse` is still always published — on a
/// timeout with `success: false, msg: "timeout"`.
async fn run_with_timeout(runner: &SwarmRunner, task: Task) -> TaskResponse {
    let context = Context::new(
        task.session_id.clone(),
        task.id.clone(),
        task.parent_task_id.clone(),
    );
    let group_id = task.group_id.clone();

    let response = match task.conf.timeout_ms {
        None => runner.run(&task, &context).await,
        Some(timeout_ms) => {
            let grace_ms = task.conf.grace_ms;
            let run = runner.run(&task, &context);
            match tokio::time::timeout(Duration::from_millis(timeout_ms), run).await {
                Ok(response) => response,
                Err(_) => {
                    context.cancel();
                    let task_id = task.id.clone();
                    // Best-effort grace window: give the in-flight step a
                    // chance to observe cancellation and stop before we
                    // abandon it outright.
                    tokio::time::sleep(Duration::from_millis(grace_ms)).await;
                    let response = TaskResponse::failure(
                        task_id,
                        &TaskError::Timeout(timeout_ms),
                        context.token_usage(),
                        Vec::new(),
                        timeout_ms + grace_ms,
                    );
                    // `runner.run` never got to publish its own `TASK_RESPONSE`
                    // (its future was abandoned above), so the bus never sees
                    // a terminator for this task unless we publish one here —
                    // a streaming consumer would otherwise hang forever.
                    publish_timeout_response(runner, &task, &response).await;
                    response
                }
            }
        }
    };

    log_digest(&response, group_id.as_deref());
    response
}

/// Publish the terminal `TASK_RESPONSE` and close the task's stream when a
/// timeout abandons `runner.run` before it could do so itself (§4.1, §4.9,
/// §8 "single terminator"). Mirrors `SwarmRunner::run`'s own publish of its
/// final message.
async fn publish_timeout_response(runner: &SwarmRunner, task: &Task, response: &TaskResponse) {
    let bus = runner.bus();
    let message = Message::new(
        task.id.clone(),
        task.session_id.clone(),
        MessageCategory::Control,
        Topic::TaskResponse,
        "scheduler",
        CallType::AgentDirect,
        serde_json::to_value(response).unwrap_or(serde_json::Value::Null),
        None,
    );
    if let Err(e) = bus.publish(message).await {
        tracing::warn!(error = %e, "failed to publish timeout task response");
    }
    bus.done(&task.id).await;
}

/// Emit the optional digest log line (§6):
/// `eval_task_digest|group_id|task_id|duration_s|usage_json`. Only emitted
/// when the caller supplied a `group_id` — the persisted-state surface this
/// line belongs to is optional, and the core does not invent a grouping key
/// for tasks that were never given one.
fn log_digest(response: &TaskResponse, group_id: Option<&str>) {
    let Some(group_id) = group_id else {
        return;
    };
    let duration_s = response.time_cost_ms as f64 / 1000.0;
    let usage_json = serde_json::to_string(&response.usage).unwrap_or_default();
    tracing::info!(
        "eval_task_digest|{}|{}|{:.3}|{}",
        group_id,
        response.task_id,
        duration_s,
        usage_json
    );
}
