#![deny(missing_docs)]
//! Typed `Message` and topic-routed `EventBus` for neuron (spec component C2).
//!
//! Every step of a task's execution — agent policy, tool call, LLM chunk,
//! handoff, task response — is published as a [`Message`] on an [`EventBus`].
//! Subscribers attach by predicate; transformers rewrite or drop messages
//! before delivery; a per-task streaming queue gives callers an ordered view
//! terminated by the task's `TaskResponse`.

mod bus;
mod error;
mod message;
mod tracker;

pub use bus::{EventBus, TaskStream};
pub use error::BusError;
pub use message::{CallType, Message, MessageCategory, MessageHeaders, Topic};
pub use tracker::{AgentCall, AgentCallTracker, CallNode};
