//! A custom [`Operator`] built without a model or a ReAct loop at all.
//!
//! `BarrierOperator` fans its input out to every tool in a [`ToolRegistry`]
//! concurrently and only produces output once all of them have returned —
//! a barrier. This is the shape you reach for when an agent invocation is
//! really "run these N independent checks and combine the results" rather
//! than "reason step by step": a health-check aggregator, a multi-source
//! lookup, a fan-out approval gate.
//!
//! It exists to show that [`Operator`] is a protocol, not a framework:
//! anything that can turn an [`OperatorInput`] into an [`OperatorOutput`]
//! qualifies, including code with no LLM call in it anywhere.

use async_trait::async_trait;
use futures_util::future::join_all;
use layer0::effect::LogLevel;
use layer0::{
    Content, DurationMs, Effect, ExitReason, Operator, OperatorError, OperatorInput,
    OperatorMetadata, OperatorOutput, ToolCallRecord,
};
use neuron_tool::{ToolError, ToolRegistry};
use std::time::Instant;
use thiserror::Error;

/// Errors constructing a [`BarrierOperator`].
#[derive(Debug, Error)]
pub enum BarrierError {
    /// The registry passed to [`BarrierOperator::new`] had no tools in it.
    #[error("barrier operator requires at least one tool")]
    Empty,
}

/// How a failing member affects the barrier as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Any member failure fails the whole invocation.
    FailFast,
    /// Member failures are recorded as failed tool calls and folded into
    /// the combined output; the barrier still completes.
    BestEffort,
}

/// An [`Operator`] that runs every tool in its registry against the same
/// input, waits for all of them (the barrier), and merges the results
/// into a single response.
///
/// The input's [`Content`] is passed verbatim as each tool's JSON input
/// (tools that expect structured input should accept a `{"message": ...}`
/// shaped payload, or parse the raw string).
pub struct BarrierOperator {
    tools: ToolRegistry,
    failure_mode: FailureMode,
}

impl BarrierOperator {
    /// Build a barrier over every tool currently registered.
    pub fn new(tools: ToolRegistry, failure_mode: FailureMode) -> Result<Self, BarrierError> {
        if tools.is_empty() {
            return Err(BarrierError::Empty);
        }
        Ok(Self {
            tools,
            failure_mode,
        })
    }
}

#[async_trait]
impl Operator for BarrierOperator {
    async fn execute(&self, input: OperatorInput) -> Result<OperatorOutput, OperatorError> {
        let tool_input = match &input.message {
            Content::Text(text) => serde_json::json!({ "message": text }),
            other => serde_json::to_value(other).unwrap_or(serde_json::Value::Null),
        };

        let calls = self.tools.iter().map(|tool| {
            let tool = tool.clone();
            let tool_input = tool_input.clone();
            async move {
                let start = Instant::now();
                let result = tool.call(tool_input).await;
                (tool.name().to_string(), DurationMs::from(start.elapsed()), result)
            }
        });

        let results: Vec<(String, DurationMs, Result<serde_json::Value, ToolError>)> =
            join_all(calls).await;

        let mut lines = Vec::with_capacity(results.len());
        let mut tools_called = Vec::with_capacity(results.len());
        let mut effects = Vec::new();
        let mut failed = Vec::new();

        for (name, duration, result) in results {
            match result {
                Ok(value) => {
                    tools_called.push(ToolCallRecord::new(name.clone(), duration, true));
                    lines.push(format!("{name}: {value}"));
                }
                Err(err) => {
                    tools_called.push(ToolCallRecord::new(name.clone(), duration, false));
                    lines.push(format!("{name}: error: {err}"));
                    effects.push(Effect::Log {
                        level: LogLevel::Warn,
                        message: format!("barrier member {name} failed: {err}"),
                        data: None,
                    });
                    failed.push(name);
                }
            }
        }

        if self.failure_mode == FailureMode::FailFast && !failed.is_empty() {
            return Err(OperatorError::Tool {
                tool: failed.join(", "),
                message: "barrier member(s) failed".to_string(),
            });
        }

        let duration = tools_called
            .iter()
            .map(|t| t.duration.as_millis())
            .max()
            .unwrap_or(0);

        let mut metadata = OperatorMetadata::default();
        metadata.turns_used = 1;
        metadata.tools_called = tools_called;
        metadata.duration = DurationMs::from_millis(duration);

        let mut output = OperatorOutput::new(Content::text(lines.join("\n")), ExitReason::Complete);
        output.metadata = metadata;
        output.effects = effects;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct SlowEcho {
        name: &'static str,
        delay_ms: u64,
        calls: Arc<AtomicUsize>,
    }

    impl neuron_tool::ToolDyn for SlowEcho {
        fn name(&self) -> &str {
            self.name
        }
        fn description(&self) -> &str {
            "echoes after a delay"
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        fn call(
            &self,
            input: serde_json::Value,
        ) -> Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>>
        {
            let delay = self.delay_ms;
            let calls = self.calls.clone();
            Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(delay)).await;
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(input)
            })
        }
    }

    struct AlwaysFails;

    impl neuron_tool::ToolDyn for AlwaysFails {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "always errors"
        }
        fn input_schema(&self) -> serde_json::Value {
            serde_json::json!({"type": "object"})
        }
        fn call(
            &self,
            _input: serde_json::Value,
        ) -> Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>>
        {
            Box::pin(async { Err(ToolError::ExecutionFailed("nope".into())) })
        }
    }

    fn sample_input() -> OperatorInput {
        OperatorInput::new(Content::text("ping"), layer0::TriggerType::User)
    }

    #[test]
    fn empty_registry_rejected() {
        let err = BarrierOperator::new(ToolRegistry::new(), FailureMode::FailFast);
        assert!(matches!(err, Err(BarrierError::Empty)));
    }

    #[tokio::test]
    async fn waits_for_every_member() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(SlowEcho {
            name: "a",
            delay_ms: 30,
            calls: calls.clone(),
        }));
        reg.register(Arc::new(SlowEcho {
            name: "b",
            delay_ms: 5,
            calls: calls.clone(),
        }));

        let op = BarrierOperator::new(reg, FailureMode::FailFast).unwrap();
        let out = op.execute(sample_input()).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(out.metadata.tools_called.len(), 2);
        assert_eq!(out.exit_reason, ExitReason::Complete);
    }

    #[tokio::test]
    async fn fail_fast_propagates_member_error() {
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(AlwaysFails));

        let op = BarrierOperator::new(reg, FailureMode::FailFast).unwrap();
        let err = op.execute(sample_input()).await.unwrap_err();
        assert!(matches!(err, OperatorError::Tool { .. }));
    }

    #[tokio::test]
    async fn best_effort_folds_failure_into_output() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut reg = ToolRegistry::new();
        reg.register(Arc::new(AlwaysFails));
        reg.register(Arc::new(SlowEcho {
            name: "ok",
            delay_ms: 0,
            calls: calls.clone(),
        }));

        let op = BarrierOperator::new(reg, FailureMode::BestEffort).unwrap();
        let out = op.execute(sample_input()).await.unwrap();

        assert_eq!(out.exit_reason, ExitReason::Complete);
        assert_eq!(out.effects.len(), 1);
        let failures = out
            .metadata
            .tools_called
            .iter()
            .filter(|t| !t.success)
            .count();
        assert_eq!(failures, 1);
    }
}
