//! Per-task agent-call DAG, keyed by message id (§3: `AgentCallTracker` state).
//!
//! Built by feeding every [`Message`] with an agent sender/receiver through
//! [`AgentCallTracker::track`] as it is published. Levels are derived purely
//! from the causal chain (`pre_message_id`) and `call_type`, never from a
//! separately maintained counter, so a tracker reconstructed from a task's
//! full message log always agrees with one built incrementally.

use std::collections::{HashMap, HashSet};

use layer0::id::MessageId;

use crate::message::{CallType, Message};

/// One recorded call from `caller` to `callee`.
#[derive(Debug, Clone)]
pub struct AgentCall {
    /// The message that carried this call.
    pub message_id: MessageId,
    /// Agent that initiated the call.
    pub caller: String,
    /// Agent the call targets.
    pub callee: String,
    /// Whether the callee was invoked as a tool (team topology) rather than
    /// a direct handoff.
    pub as_tool: bool,
}

/// A node in the call hierarchy: one agent invocation, keyed by the message
/// that represents it.
#[derive(Debug, Clone)]
pub struct CallNode {
    /// The message this node represents.
    pub message_id: MessageId,
    /// Agent this node belongs to.
    pub agent_id: String,
    /// Depth in the call tree; root invocations are level 0.
    pub level: u32,
    /// Messages causally downstream of this one that were tracked as
    /// as-tool calls rooted here.
    pub children: Vec<MessageId>,
}

/// Tracks direct calls, as-tool calls, and the resulting call hierarchy for
/// one task. Not shared across tasks.
#[derive(Debug, Default)]
pub struct AgentCallTracker {
    direct_calls: HashMap<String, Vec<AgentCall>>,
    as_tool_calls: HashMap<String, HashMap<String, Vec<AgentCall>>>,
    nodes: HashMap<MessageId, CallNode>,
    agent_levels: HashMap<String, u32>,
    processed: HashSet<MessageId>,
}

impl AgentCallTracker {
    /// Start an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `message` as a call from `caller` to `callee`. Returns `false`
    /// without modifying any state if this message id was already tracked
    /// (replaying the same message twice must be a no-op).
    pub fn track(&mut self, message: &Message, caller: &str, callee: &str, as_tool: bool) -> bool {
        if self.processed.contains(&message.id) {
            return false;
        }

        let pre_level = message
            .headers
            .pre_message_id
            .as_ref()
            .and_then(|id| self.nodes.get(id))
            .map(|node| node.level)
            .unwrap_or(0);

        let level = if as_tool {
            pre_level + 1
        } else if matches!(message.call_type, CallType::ToolResult) {
            pre_level
        } else if self.is_tool_caller(callee, caller) {
            // `callee` previously called `caller` as a tool; this message is
            // that tool result unwinding back down one level.
            pre_level.saturating_sub(1)
        } else {
            pre_level
        };

        if as_tool {
            if let Some(pre_id) = &message.headers.pre_message_id {
                if let Some(pre_node) = self.nodes.get_mut(pre_id) {
                    pre_node.children.push(message.id.clone());
                }
            }
        }

        self.nodes.insert(
            message.id.clone(),
            CallNode {
                message_id: message.id.clone(),
                agent_id: callee.to_string(),
                level,
                children: Vec::new(),
            },
        );

        self.agent_levels
            .entry(callee.to_string())
            .and_modify(|existing| *existing = (*existing).min(level))
            .or_insert(level);

        let call = AgentCall {
            message_id: message.id.clone(),
            caller: caller.to_string(),
            callee: callee.to_string(),
            as_tool,
        };
        if as_tool {
            self.as_tool_calls
                .entry(caller.to_string())
                .or_default()
                .entry(callee.to_string())
                .or_default()
                .push(call);
        } else {
            self.direct_calls.entry(caller.to_string()).or_default().push(call);
        }

        self.processed.insert(message.id.clone());
        true
    }

    fn is_tool_caller(&self, caller: &str, callee: &str) -> bool {
        self.as_tool_calls
            .get(caller)
            .map(|callees| callees.contains_key(callee))
            .unwrap_or(false)
    }

    /// The level most recently observed for `agent_id`, or 0 if never seen.
    pub fn level_of(&self, agent_id: &str) -> u32 {
        *self.agent_levels.get(agent_id).unwrap_or(&0)
    }

    /// Agents whose lowest observed level is 0 — the task's root invocations.
    pub fn root_agents(&self) -> Vec<String> {
        self.agent_levels
            .iter()
            .filter(|(_, level)| **level == 0)
            .map(|(agent, _)| agent.clone())
            .collect()
    }

    /// `(callee, as_tool)` pairs for every call `agent_id` made, direct
    /// handoffs first, then as-tool calls.
    pub fn children_of(&self, agent_id: &str) -> Vec<(String, bool)> {
        let mut children: Vec<(String, bool)> = self
            .direct_calls
            .get(agent_id)
            .into_iter()
            .flatten()
            .map(|call| (call.callee.clone(), false))
            .collect();
        if let Some(callees) = self.as_tool_calls.get(agent_id) {
            children.extend(
                callees
                    .iter()
                    .filter(|(_, calls)| !calls.is_empty())
                    .map(|(callee, _)| (callee.clone(), true)),
            );
        }
        children
    }

    /// The call node recorded for a given message, if any.
    pub fn node(&self, message_id: &MessageId) -> Option<&CallNode> {
        self.nodes.get(message_id)
    }
}
