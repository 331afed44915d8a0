#![deny(missing_docs)]
//! Tool interface, registry, and invocation for neuron (spec component C5).
//!
//! [`ToolDyn`] is the object-safe abstraction any tool source implements
//! (local function, MCP server, sandboxed subprocess). [`ToolRegistry`]
//! holds a named collection of them. [`Invoker`] is the uniform
//! `invoke(actions, allowed) -> results` boundary: it validates parameters
//! against each tool's schema, drops calls to disallowed tools, dispatches
//! `parallel_safe` tools concurrently while keeping everything else
//! sequential, and retries idempotent tools on transient failures.

mod action;
mod invoker;
mod registry;
mod schema;

pub use action::{ActionModel, ActionResult, ActionResultMetadata};
pub use invoker::Invoker;
pub use registry::{ToolDyn, ToolError, ToolRegistry};
pub use schema::validate as validate_params;
