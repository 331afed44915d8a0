//! The `Message` type — the unit of observability on the event bus (§3, §6).

use layer0::id::{MessageId, SessionId, TaskId};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;

/// Coarse-grained classification of a message. Closed per §3 — the source's
/// informal `call_type` strings are frozen here instead of left as free text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageCategory {
    /// An agent policy step (observation in, actions out).
    Agent,
    /// A tool invocation or its result.
    Tool,
    /// A streaming text/content fragment.
    Chunk,
    /// A cancellation request or acknowledgement.
    Cancel,
    /// Scheduler-internal control (task start/end, housekeeping).
    Control,
}

/// Routing key within a category. The well-known topics from §3/§4.1 are
/// named variants; `Custom` exists only for forward-compatible transformer
/// registration and is never produced by the core itself.
///
/// Serializes as the flat string from [`Topic::as_str`] (§6: `"topic": str`),
/// not as an internally-tagged object — an internally-tagged enum can't
/// represent the `Custom(String)` newtype variant at all, and would wrap
/// unit variants in a nested `{"topic": "..."}` object either way.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Task has been accepted; context constructed.
    TaskStart,
    /// One agent-loop step (policy invocation).
    Step,
    /// A tool/action call was dispatched.
    ToolCall,
    /// A tool/action call returned.
    ToolResult,
    /// Control routed from one agent to another.
    Handoff,
    /// A streaming content fragment.
    Chunk,
    /// The task's terminal response.
    TaskResponse,
    /// Out-of-band topic, keyed by name. Used by transformer registration
    /// for domain extensions; the core publishes only the named variants.
    Custom(String),
}

impl Topic {
    /// Stable string form, used for transformer registration keys, logs, and
    /// the wire format.
    pub fn as_str(&self) -> &str {
        match self {
            Topic::TaskStart => "task_start",
            Topic::Step => "step",
            Topic::ToolCall => "tool_call",
            Topic::ToolResult => "tool_result",
            Topic::Handoff => "handoff",
            Topic::Chunk => "chunk",
            Topic::TaskResponse => "task_response",
            Topic::Custom(s) => s.as_str(),
        }
    }

    /// Parse the wire string form back into a `Topic`, falling back to
    /// `Custom` for anything that isn't one of the named variants.
    fn from_str(s: &str) -> Topic {
        match s {
            "task_start" => Topic::TaskStart,
            "step" => Topic::Step,
            "tool_call" => Topic::ToolCall,
            "tool_result" => Topic::ToolResult,
            "handoff" => Topic::Handoff,
            "chunk" => Topic::Chunk,
            "task_response" => Topic::TaskResponse,
            other => Topic::Custom(other.to_string()),
        }
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TopicVisitor;

        impl de::Visitor<'_> for TopicVisitor {
            type Value = Topic;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a topic string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Topic, E> {
                Ok(Topic::from_str(v))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Topic, E> {
                Ok(Topic::from_str(&v))
            }
        }

        deserializer.deserialize_str(TopicVisitor)
    }
}

/// How this message's sender relates to its receiver. Frozen set (§3): the
/// source had informal strings here, the spec closes the enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallType {
    /// One agent invoking another directly (handoff tree call).
    AgentDirect,
    /// One agent invoking another as if it were a tool (team topology).
    AgentAsTool,
    /// A tool result flowing back to the calling agent.
    ToolResult,
    /// A handoff transferring control to a peer agent.
    Handoff,
}

/// Headers carried alongside every message's payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageHeaders {
    /// Opaque reference to the task's `Context` (not the context itself —
    /// the bus carries ids, not shared mutable state).
    pub context_ref: Option<String>,
    /// Causal predecessor: the message this one responds to or follows.
    /// `None` only for the task's root (first) message.
    pub pre_message_id: Option<MessageId>,
    /// The agent or component that caused this message to be emitted,
    /// when that differs from `sender` (e.g. a hook rewriting a message).
    pub caller: Option<String>,
    /// Extension slot for fields not yet promoted to named headers.
    #[serde(default)]
    pub extra: serde_json::Value,
}

/// A single typed event flowing through the bus. Immutable once published.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique id of this message.
    pub id: MessageId,
    /// The task this message belongs to.
    pub task_id: TaskId,
    /// The session this task belongs to.
    pub session_id: SessionId,
    /// Coarse classification.
    pub category: MessageCategory,
    /// Routing key within the category.
    pub topic: Topic,
    /// Name of the agent/tool/component that emitted this message.
    pub sender: String,
    /// Name of the intended recipient, if directed.
    pub receiver: Option<String>,
    /// Relationship between sender and receiver.
    pub call_type: CallType,
    /// Message body.
    pub payload: serde_json::Value,
    /// Causal / routing headers.
    pub headers: MessageHeaders,
}

impl Message {
    /// Build a message, filling in a fresh id.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_id: TaskId,
        session_id: SessionId,
        category: MessageCategory,
        topic: Topic,
        sender: impl Into<String>,
        call_type: CallType,
        payload: serde_json::Value,
        pre_message_id: Option<MessageId>,
    ) -> Self {
        Self {
            id: neuron_ids::new_message_id(),
            task_id,
            session_id,
            category,
            topic,
            sender: sender.into(),
            receiver: None,
            call_type,
            payload,
            headers: MessageHeaders {
                pre_message_id,
                ..Default::default()
            },
        }
    }

    /// Whether this message is the terminal `TaskResponse` for its task.
    pub fn is_task_response(&self) -> bool {
        matches!(self.topic, Topic::TaskResponse)
    }

    /// Set the receiver.
    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }
}
