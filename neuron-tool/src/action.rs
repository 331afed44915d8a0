//! `ActionModel` / `ActionResult` — the agent's unit of output and the
//! invoker's unit of response (§3).

/// An agent's intent for one step: invoke a tool, hand off to another
/// agent, or (if neither name is set) give a final answer.
///
/// When both `tool_name` and `agent_name` are `None`, the action is a
/// final answer and `policy_info` carries the answer text; the invoker
/// never sees such actions (the agent loop handles them directly).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionModel {
    /// Name of the tool to invoke, resolved against a [`crate::ToolRegistry`].
    pub tool_name: Option<String>,
    /// Name of the peer agent to route to (handoff or agent-as-tool).
    pub agent_name: Option<String>,
    /// Named action/operation within the tool, if the tool exposes more
    /// than one (e.g. `calculator.add`). `None` means the tool's single
    /// default action.
    pub action_name: Option<String>,
    /// Parameters passed to the tool/action.
    pub params: serde_json::Value,
    /// Free-form text from the policy. Doubles as the final answer when
    /// neither `tool_name` nor `agent_name` is set.
    pub policy_info: Option<String>,
    /// Correlates this action to its result in logs/traces.
    pub tool_call_id: Option<String>,
}

impl ActionModel {
    /// Build a tool-call action.
    pub fn tool_call(
        tool_name: impl Into<String>,
        action_name: Option<String>,
        params: serde_json::Value,
    ) -> Self {
        Self {
            tool_name: Some(tool_name.into()),
            action_name,
            params,
            ..Default::default()
        }
    }

    /// Build a handoff/agent-as-tool action.
    pub fn agent_call(agent_name: impl Into<String>, params: serde_json::Value) -> Self {
        Self {
            agent_name: Some(agent_name.into()),
            params,
            ..Default::default()
        }
    }

    /// Build a final-answer action.
    pub fn final_answer(text: impl Into<String>) -> Self {
        Self {
            policy_info: Some(text.into()),
            ..Default::default()
        }
    }

    /// Whether this action is a final answer (no tool, no agent named).
    pub fn is_final_answer(&self) -> bool {
        self.tool_name.is_none() && self.agent_name.is_none()
    }

    /// The registry key this action resolves to, `tool_name.action_name` if
    /// an action is named, else just `tool_name`.
    pub fn resolved_name(&self) -> Option<String> {
        let tool = self.tool_name.as_ref()?;
        Some(match &self.action_name {
            Some(action) => format!("{tool}.{action}"),
            None => tool.clone(),
        })
    }
}

/// What executing one [`ActionModel`] produced.
#[derive(Debug, Clone)]
pub struct ActionResult {
    /// The tool's output, on success.
    pub content: serde_json::Value,
    /// Populated on failure; `content` is typically `Null` when this is set.
    pub error: Option<String>,
    /// Whether this result should end the agent loop after the current
    /// step's remaining actions finish executing (§4.4 tie-break rule).
    pub is_done: bool,
    /// Whether the result should be kept in the observation passed back to
    /// the agent (vs. discarded once its side effect has run).
    pub keep: bool,
    /// Bookkeeping about the invocation.
    pub metadata: ActionResultMetadata,
}

/// Bookkeeping attached to every [`ActionResult`].
#[derive(Debug, Clone)]
pub struct ActionResultMetadata {
    /// Unix-ms timestamp when the action started executing.
    pub start_ms: u64,
    /// Unix-ms timestamp when the action finished.
    pub end_ms: u64,
    /// The tool name this result came from.
    pub tool_name: String,
    /// The action name this result came from, if named.
    pub action_name: Option<String>,
}

impl ActionResult {
    /// Build a successful result.
    pub fn ok(content: serde_json::Value, metadata: ActionResultMetadata) -> Self {
        Self {
            content,
            error: None,
            is_done: false,
            keep: true,
            metadata,
        }
    }

    /// Build an error result. `content` is left `Null`.
    pub fn err(error: impl Into<String>, metadata: ActionResultMetadata) -> Self {
        Self {
            content: serde_json::Value::Null,
            error: Some(error.into()),
            is_done: false,
            keep: true,
            metadata,
        }
    }

    /// Mark this result as terminating the agent loop.
    pub fn with_done(mut self, is_done: bool) -> Self {
        self.is_done = is_done;
        self
    }

    /// Whether this result represents a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
