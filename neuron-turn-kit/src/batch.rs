//! Executes a step's dispatch plan: sequential tools run one at a time,
//! `parallel_safe` runs are dispatched concurrently, and idempotent tools are
//! retried on transient failure with jittered exponential backoff. Results
//! are always returned in the order the agent submitted the calls.

use crate::concurrency::{plan_batches, Batch};
use crate::planner::DispatchItem;
use futures_util::future::join_all;
use neuron_tool::{ToolError, ToolRegistry};
use std::collections::HashMap;
use std::time::Duration;

/// Outcome of dispatching a single tool call, possibly after retries.
#[derive(Debug, Clone)]
pub struct ActionResult {
    /// The model's tool-use id this result answers.
    pub call_id: String,
    /// The tool that was invoked.
    pub tool_name: String,
    /// The tool's output, or the final error after retries were exhausted.
    pub output: Result<serde_json::Value, String>,
    /// How many attempts were made (1 = succeeded or failed on the first try).
    pub attempts: u32,
}

impl ActionResult {
    /// Whether the call ultimately succeeded.
    pub fn is_error(&self) -> bool {
        self.output.is_err()
    }
}

/// Bounded, jittered exponential backoff for retried idempotent tool calls.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts per call, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(10);
        let exp = self.base_delay.saturating_mul(1u32 << shift);
        let capped = exp.min(self.max_delay);
        let jitter = (jitter_fraction() * 0.5) + 0.5; // in [0.5, 1.0)
        capped.mul_f64(jitter)
    }
}

fn jitter_fraction() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    (nanos % 1000) as f64 / 1000.0
}

/// Only `ExecutionFailed` is treated as a transient, retryable error —
/// `NotFound`/`InvalidInput` are caller mistakes that retrying won't fix.
fn is_transient(err: &ToolError) -> bool {
    matches!(err, ToolError::ExecutionFailed(_))
}

/// Dispatches one agent step's tool calls against a [`ToolRegistry`].
pub struct BatchExecutor<'a> {
    tools: &'a ToolRegistry,
    retry: RetryPolicy,
}

impl<'a> BatchExecutor<'a> {
    /// Create an executor with the default retry policy.
    pub fn new(tools: &'a ToolRegistry) -> Self {
        Self {
            tools,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Execute every item in the plan, returning results in submission order.
    pub async fn execute(&self, items: Vec<DispatchItem>) -> Vec<ActionResult> {
        let order: Vec<String> = items.iter().map(|i| i.call_id.clone()).collect();
        let batches = plan_batches(items);
        let mut by_id: HashMap<String, ActionResult> = HashMap::new();

        for batch in batches {
            match batch {
                Batch::Sequential(item) => {
                    let result = self.call_with_retry(&item).await;
                    by_id.insert(item.call_id, result);
                }
                Batch::Concurrent(group) => {
                    let results = join_all(group.iter().map(|item| self.call_with_retry(item))).await;
                    for (item, result) in group.into_iter().zip(results) {
                        by_id.insert(item.call_id, result);
                    }
                }
            }
        }

        order
            .into_iter()
            .map(|id| {
                by_id
                    .remove(&id)
                    .expect("every submitted call_id produces exactly one result")
            })
            .collect()
    }

    async fn call_with_retry(&self, item: &DispatchItem) -> ActionResult {
        let Some(tool) = self.tools.get(&item.tool_name).cloned() else {
            return ActionResult {
                call_id: item.call_id.clone(),
                tool_name: item.tool_name.clone(),
                output: Err(ToolError::NotFound(item.tool_name.clone()).to_string()),
                attempts: 0,
            };
        };

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match tool.call(item.input.clone()).await {
                Ok(value) => {
                    return ActionResult {
                        call_id: item.call_id.clone(),
                        tool_name: item.tool_name.clone(),
                        output: Ok(value),
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    let retryable =
                        item.idempotent && is_transient(&err) && attempt < self.retry.max_attempts;
                    if !retryable {
                        return ActionResult {
                            call_id: item.call_id.clone(),
                            tool_name: item.tool_name.clone(),
                            output: Err(err.to_string()),
                            attempts: attempt,
                        };
                    }
                    tracing::debug!(
                        tool = %item.tool_name,
                        attempt,
                        "retrying idempotent tool after transient error"
                    );
                    tokio::time::sleep(self.retry.delay_for(attempt)).await;
                }
            }
        }
    }
}
