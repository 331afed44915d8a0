//! Turns a step's raw tool-use requests into a resolved dispatch plan.

use neuron_tool::{ToolDyn, ToolRegistry};
use neuron_turn::ContentPart;
use serde_json::Value;

/// A single tool invocation requested by the model within one agent step,
/// with its parallel-safety/idempotency resolved against the registry.
#[derive(Debug, Clone)]
pub struct DispatchItem {
    /// The model's tool-use id for this call.
    pub call_id: String,
    /// The tool being invoked.
    pub tool_name: String,
    /// The input the model supplied.
    pub input: Value,
    /// Whether the tool may run concurrently with its neighbors this step.
    pub parallel_safe: bool,
    /// Whether the tool is safe to retry on a transient failure.
    pub idempotent: bool,
}

/// Result of resolving a step's requested tool calls against the registry.
#[derive(Debug, Clone, Default)]
pub struct StepPlan {
    /// Calls that resolved to a known tool, in submission order.
    pub items: Vec<DispatchItem>,
    /// Tool names the model requested that aren't in the registry.
    /// Callers surface these as schema-validation failures before dispatch.
    pub unknown: Vec<String>,
}

/// Resolve a step's tool-use requests, extracted from the model's response
/// content parts, into a [`StepPlan`]. Non-tool-use parts are ignored.
pub fn plan_step_from_content(tools: &ToolRegistry, content: &[ContentPart]) -> StepPlan {
    let requests: Vec<(String, String, Value)> = content
        .iter()
        .filter_map(|part| match part {
            ContentPart::ToolUse { id, name, input } => {
                Some((id.clone(), name.clone(), input.clone()))
            }
            _ => None,
        })
        .collect();
    plan_step(tools, &requests)
}

/// Resolve a step's `(call_id, tool_name, input)` requests into a [`StepPlan`].
pub fn plan_step(tools: &ToolRegistry, requests: &[(String, String, Value)]) -> StepPlan {
    let mut plan = StepPlan::default();
    for (call_id, tool_name, input) in requests {
        match tools.get(tool_name) {
            Some(tool) => plan.items.push(DispatchItem {
                call_id: call_id.clone(),
                tool_name: tool_name.clone(),
                input: input.clone(),
                parallel_safe: tool.parallel_safe(),
                idempotent: tool.idempotent(),
            }),
            None => plan.unknown.push(tool_name.clone()),
        }
    }
    plan
}
