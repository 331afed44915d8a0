//! Streaming completion types: incremental events and the stream handle.

use std::fmt;
use std::pin::Pin;

use futures::Stream;

use crate::types::{Message, TokenUsage};

/// An incremental event emitted while a completion streams in.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// A chunk of assistant text.
    TextDelta(String),
    /// A chunk of extended-thinking text.
    ThinkingDelta(String),
    /// A chunk of the cryptographic signature for a thinking block.
    SignatureDelta(String),
    /// The model began a tool call.
    ToolUseStart {
        /// The tool call id, used to demux interleaved parallel tool calls.
        id: String,
        /// The tool name.
        name: String,
    },
    /// A chunk of a tool call's JSON input, keyed by tool call id.
    ToolUseInputDelta {
        /// The tool call id this delta belongs to.
        id: String,
        /// The JSON text fragment.
        delta: String,
    },
    /// A tool call's input finished streaming.
    ToolUseEnd {
        /// The tool call id that ended.
        id: String,
    },
    /// Token usage, typically emitted once near the end of the stream.
    Usage(TokenUsage),
    /// The complete assembled message, emitted once the stream finishes.
    MessageComplete(Message),
    /// A streaming error. Terminal unless the provider emits further events.
    Error(StreamError),
}

/// An error encountered while consuming a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    /// Human-readable description of what went wrong.
    pub message: String,
    /// Whether the caller can retry the request and expect success.
    pub is_retryable: bool,
}

impl StreamError {
    /// Build a non-retryable stream error.
    pub fn non_retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_retryable: false,
        }
    }

    /// Build a retryable stream error.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_retryable: true,
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for StreamError {}

/// A live completion stream.
///
/// Wraps a boxed, pinned `Stream` of [`StreamEvent`]s so providers can return
/// a concrete type regardless of the underlying transport (SSE, websocket,
/// chunked HTTP, ...).
pub struct StreamHandle {
    /// The underlying event stream.
    pub receiver: Pin<Box<dyn Stream<Item = StreamEvent> + Send>>,
}

impl fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

impl Stream for StreamHandle {
    type Item = StreamEvent;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        self.receiver.as_mut().poll_next(cx)
    }
}
