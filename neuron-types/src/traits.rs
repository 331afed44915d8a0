//! Provider, Tool, and context-strategy traits shared across neuron crates.
//!
//! These are intentionally framework-agnostic: a type implementing [`Provider`]
//! or [`Tool`] has no dependency on any other neuron crate.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ContextError, EmbeddingError, ProviderError, ToolError};
use crate::stream::StreamHandle;
use crate::types::{
    CompletionRequest, CompletionResponse, EmbeddingRequest, EmbeddingResponse, Message,
    ToolContext, ToolDefinition, ToolOutput,
};
use crate::wasm::WasmBoxedFuture;

/// An LLM provider: turns a [`CompletionRequest`] into a [`CompletionResponse`],
/// with an optional streaming variant.
///
/// Implementations use return-position `impl Future` so they stay object-safe
/// from the caller's perspective without boxing on the hot path; callers that
/// need a trait object should box through [`WasmBoxedFuture`] at the seam.
pub trait Provider: Send + Sync {
    /// Send a completion request and await the full response.
    fn complete(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<CompletionResponse, ProviderError>> + Send;

    /// Send a completion request and receive a stream of incremental events.
    fn complete_stream(
        &self,
        request: CompletionRequest,
    ) -> impl Future<Output = Result<StreamHandle, ProviderError>> + Send;
}

/// A strongly-typed tool: validated arguments in, a structured result out.
///
/// Implementations describe their own JSON Schema via [`Tool::definition`] and
/// are bridged to the dynamic, object-safe [`ToolDyn`] trait by a blanket impl.
pub trait Tool: Send + Sync {
    /// The tool's unique name, used for dispatch and in [`ToolDefinition::name`].
    const NAME: &'static str;

    /// Deserialized, schema-validated input.
    type Args: DeserializeOwned + Send;

    /// Successful output, serialized into [`ToolOutput::structured_content`].
    type Output: Serialize + Send;

    /// Domain-specific error type, mapped to [`ToolError::ExecutionFailed`] when
    /// called through [`ToolDyn`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// The tool's definition: name, description, and JSON Schema for its input.
    fn definition(&self) -> ToolDefinition;

    /// Run the tool against validated arguments.
    fn call(
        &self,
        args: Self::Args,
        ctx: &ToolContext,
    ) -> impl Future<Output = Result<Self::Output, Self::Error>> + Send;
}

/// Object-safe counterpart of [`Tool`], used to store heterogeneous tools in a
/// single registry (e.g. `neuron_tool::ToolRegistry`).
///
/// Blanket-implemented for every [`Tool`]: input is deserialized from raw JSON
/// and validated, and the output is serialized into [`ToolOutput`].
pub trait ToolDyn: Send + Sync {
    /// The tool's name (forwarded from [`Tool::NAME`]).
    fn name(&self) -> &str;

    /// The tool's definition (forwarded from [`Tool::definition`]).
    fn definition_dyn(&self) -> ToolDefinition;

    /// Deserialize `input`, run the tool, and serialize the result.
    ///
    /// Deserialization failures surface as [`ToolError::InvalidInput`]; runtime
    /// failures surface as [`ToolError::ExecutionFailed`].
    fn call_dyn<'a>(
        &'a self,
        input: serde_json::Value,
        ctx: &'a ToolContext,
    ) -> WasmBoxedFuture<'a, Result<ToolOutput, ToolError>>;
}

impl<T: Tool> ToolDyn for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn definition_dyn(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    fn call_dyn<'a>(
        &'a self,
        input: serde_json::Value,
        ctx: &'a ToolContext,
    ) -> WasmBoxedFuture<'a, Result<ToolOutput, ToolError>> {
        Box::pin(async move {
            let args: T::Args = serde_json::from_value(input)
                .map_err(|e| ToolError::InvalidInput(e.to_string()))?;

            let output = self
                .call(args, ctx)
                .await
                .map_err(|e| ToolError::ExecutionFailed(Box::new(e)))?;

            let structured = serde_json::to_value(&output)
                .map_err(|e| ToolError::ExecutionFailed(Box::new(e)))?;

            Ok(ToolOutput {
                content: vec![crate::types::ContentItem::Text(structured.to_string())],
                structured_content: Some(structured),
                is_error: false,
            })
        })
    }
}

/// An embedding provider: turns input strings into vectors.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed `request.input`, returning one vector per input string.
    fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> impl Future<Output = Result<EmbeddingResponse, EmbeddingError>> + Send;
}

/// A strategy for keeping a conversation's message history within a context
/// budget: deciding when to compact, and how.
pub trait ContextStrategy: Send + Sync {
    /// Compact `messages`, returning a (typically shorter) replacement history.
    fn compact(
        &self,
        messages: Vec<Message>,
    ) -> impl Future<Output = Result<Vec<Message>, ContextError>> + Send;

    /// Estimate the token count of `messages`. An approximation is fine; used
    /// to decide whether to compact, not for provider-side accounting.
    fn token_estimate(&self, messages: &[Message]) -> usize;

    /// Whether `messages` (whose estimated token count is `token_count`) should
    /// be compacted before the next request.
    fn should_compact(&self, messages: &[Message], token_count: usize) -> bool;
}
