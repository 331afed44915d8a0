//! `Invoker` — uniform `invoke(action_list, context) -> List[ActionResult]`
//! over the [`ToolRegistry`] (§4.4).

use crate::action::{ActionModel, ActionResult, ActionResultMetadata};
use crate::registry::ToolRegistry;
use crate::schema;
use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Maximum number of attempts (including the first) for a retried action.
const MAX_ATTEMPTS: u32 = 4;
/// Base backoff before the first retry.
const BASE_BACKOFF_MS: u64 = 50;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Whether an error message looks like a transient condition worth retrying:
/// rate limiting, server errors, or a dropped connection (§4.4).
fn looks_transient(message: &str) -> bool {
    let m = message.to_ascii_lowercase();
    m.contains("429")
        || m.contains("500")
        || m.contains("502")
        || m.contains("503")
        || m.contains("504")
        || m.contains("timeout")
        || m.contains("connection reset")
        || m.contains("connection refused")
}

/// Deterministic-enough jitter without pulling in a `rand` dependency: mixes
/// the attempt number with the current monotonic clock's subsecond reading.
fn jittered_backoff_ms(attempt: u32) -> u64 {
    let base = BASE_BACKOFF_MS.saturating_mul(1u64 << attempt.min(10));
    let nanos = std::time::Instant::now().elapsed().subsec_nanos() as u64;
    let jitter = nanos % (base / 2 + 1);
    base + jitter
}

/// Executes [`ActionModel`] lists against a [`ToolRegistry`].
pub struct Invoker<'a> {
    registry: &'a ToolRegistry,
}

impl<'a> Invoker<'a> {
    /// Build an invoker over `registry`.
    pub fn new(registry: &'a ToolRegistry) -> Self {
        Self { registry }
    }

    /// Execute every tool-call action in `actions`, in the submitted order.
    ///
    /// - Actions naming a tool outside `allowed` are dropped before
    ///   invocation (§3 invariant) and produce no result.
    /// - Non-tool actions (handoffs, final answers) are skipped; callers
    ///   route those separately.
    /// - Actions whose tool is `parallel_safe` run concurrently with each
    ///   other; all others run sequentially, in order. Either way, results
    ///   are returned in the original submission order (§4.4).
    /// - Only `idempotent` tools are retried, and only on transient errors,
    ///   with jittered exponential backoff up to a bounded attempt count.
    pub async fn invoke(
        &self,
        actions: &[ActionModel],
        allowed: &HashSet<String>,
    ) -> Vec<ActionResult> {
        let mut slots: Vec<Option<ActionResult>> = vec![None; actions.len()];
        let mut parallel_indices = Vec::new();

        for (idx, action) in actions.iter().enumerate() {
            let Some(tool_name) = &action.tool_name else {
                continue; // handoff or final answer — not this invoker's job
            };
            if !allowed.contains(tool_name.as_str()) {
                continue; // dropped silently per the tools_allowed invariant
            }
            let Some(tool) = self.registry.get(tool_name) else {
                slots[idx] = Some(ActionResult::err(
                    format!("tool not found: {tool_name}"),
                    meta(action, now_ms(), now_ms()),
                ));
                continue;
            };

            if tool.parallel_safe() {
                parallel_indices.push(idx);
                continue;
            }

            slots[idx] = Some(self.invoke_one(action).await);
        }

        if !parallel_indices.is_empty() {
            let futures = parallel_indices
                .iter()
                .map(|idx| self.invoke_one(&actions[*idx]));
            let results = futures_util::future::join_all(futures).await;
            for (idx, result) in parallel_indices.into_iter().zip(results) {
                slots[idx] = Some(result);
            }
        }

        slots.into_iter().flatten().collect()
    }

    async fn invoke_one(&self, action: &ActionModel) -> ActionResult {
        let start = now_ms();
        let tool_name = action.tool_name.as_deref().unwrap_or_default();
        let Some(tool) = self.registry.get(tool_name) else {
            return ActionResult::err(
                format!("tool not found: {tool_name}"),
                meta(action, start, now_ms()),
            );
        };

        if let Err(reason) = schema::validate(&tool.input_schema(), &action.params) {
            return ActionResult::err(format!("schema: {reason}"), meta(action, start, now_ms()));
        }

        let mut attempt = 0u32;
        loop {
            match tool.call(action.params.clone()).await {
                Ok(content) => return ActionResult::ok(content, meta(action, start, now_ms())),
                Err(e) => {
                    let message = e.to_string();
                    let retryable = tool.idempotent() && looks_transient(&message);
                    attempt += 1;
                    if retryable && attempt < MAX_ATTEMPTS {
                        tokio::time::sleep(Duration::from_millis(jittered_backoff_ms(attempt)))
                            .await;
                        continue;
                    }
                    return ActionResult::err(message, meta(action, start, now_ms()));
                }
            }
        }
    }
}

fn meta(action: &ActionModel, start_ms: u64, end_ms: u64) -> ActionResultMetadata {
    ActionResultMetadata {
        start_ms,
        end_ms,
        tool_name: action.tool_name.clone().unwrap_or_default(),
        action_name: action.action_name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ToolDyn;
    use serde_json::json;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct FlakyTool {
        fails_remaining: AtomicU32,
        idempotent: bool,
    }

    impl ToolDyn for FlakyTool {
        fn name(&self) -> &str {
            "flaky"
        }
        fn description(&self) -> &str {
            "fails a configured number of times with a transient error"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"a": {"type": "integer"}}, "required": ["a"]})
        }
        fn call(
            &self,
            input: serde_json::Value,
        ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, crate::ToolError>> + Send + '_>>
        {
            Box::pin(async move {
                if self.fails_remaining.fetch_sub(1, Ordering::SeqCst) > 0 {
                    Err(crate::ToolError::ExecutionFailed("503 unavailable".into()))
                } else {
                    Ok(input)
                }
            })
        }
        fn idempotent(&self) -> bool {
            self.idempotent
        }
    }

    struct EchoTool;
    impl ToolDyn for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes input"
        }
        fn input_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        fn call(
            &self,
            input: serde_json::Value,
        ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, crate::ToolError>> + Send + '_>>
        {
            Box::pin(async move { Ok(input) })
        }
        fn parallel_safe(&self) -> bool {
            true
        }
    }

    fn allow(names: &[&str]) -> HashSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn disallowed_tool_is_dropped_silently() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        let invoker = Invoker::new(&reg);

        let actions = vec![ActionModel::tool_call("echo", None, json!({}))];
        let results = invoker.invoke(&actions, &allow(&["other"])).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn schema_violation_does_not_invoke_tool() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(FlakyTool {
            fails_remaining: AtomicU32::new(0),
            idempotent: false,
        }));
        let invoker = Invoker::new(&reg);

        let actions = vec![ActionModel::tool_call("flaky", None, json!({}))]; // missing "a"
        let results = invoker.invoke(&actions, &allow(&["flaky"])).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].error.as_ref().unwrap().starts_with("schema:"));
    }

    #[tokio::test]
    async fn idempotent_tool_retries_transient_failure_and_succeeds() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(FlakyTool {
            fails_remaining: AtomicU32::new(2),
            idempotent: true,
        }));
        let invoker = Invoker::new(&reg);

        let actions = vec![ActionModel::tool_call("flaky", None, json!({"a": 1}))];
        let results = invoker.invoke(&actions, &allow(&["flaky"])).await;
        assert_eq!(results.len(), 1);
        assert!(!results[0].is_error(), "{:?}", results[0].error);
    }

    #[tokio::test]
    async fn non_idempotent_tool_does_not_retry() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(FlakyTool {
            fails_remaining: AtomicU32::new(1),
            idempotent: false,
        }));
        let invoker = Invoker::new(&reg);

        let actions = vec![ActionModel::tool_call("flaky", None, json!({"a": 1}))];
        let results = invoker.invoke(&actions, &allow(&["flaky"])).await;
        assert!(results[0].is_error());
    }

    #[tokio::test]
    async fn results_preserve_submission_order() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(EchoTool));
        let invoker = Invoker::new(&reg);

        let actions: Vec<ActionModel> = (0..5)
            .map(|n| ActionModel::tool_call("echo", None, json!({"n": n})))
            .collect();
        let results = invoker.invoke(&actions, &allow(&["echo"])).await;
        assert_eq!(results.len(), 5);
        for (n, result) in results.iter().enumerate() {
            assert_eq!(result.content, json!({"n": n}));
        }
    }

    #[tokio::test]
    async fn non_tool_actions_are_skipped() {
        let reg = ToolRegistry::new();
        let invoker = Invoker::new(&reg);
        let actions = vec![ActionModel::agent_call("peer", json!({}))];
        let results = invoker.invoke(&actions, &allow(&[])).await;
        assert!(results.is_empty());
    }
}
