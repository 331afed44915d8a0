#![deny(missing_docs)]
//! Shared primitives for ReAct-style `layer0::Operator` implementations.
//!
//! This crate does not implement [`layer0::Operator`] itself — it provides
//! the pieces `neuron-op-react` and `neuron-op-single-shot` assemble into
//! one: a provider abstraction, context-compaction strategies, and the
//! request/response types the ReAct loop turns messages into.
//!
//! Key traits defined here:
//! - [`Provider`] — LLM provider interface (not object-safe, uses RPITIT)
//! - [`ContextStrategy`] — context window management

pub mod config;
pub mod context;
pub mod convert;
pub mod provider;
pub mod types;

// Re-exports
pub use config::NeuronTurnConfig;
pub use context::{ContextStrategy, NoCompaction};
pub use convert::{
    content_block_to_part, content_part_to_block, content_to_parts, content_to_user_message,
    parts_to_content,
};
pub use provider::{Provider, ProviderError};
pub use types::*;
