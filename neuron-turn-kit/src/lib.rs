#![deny(missing_docs)]
//! Turn-level planning and execution primitives: planner, concurrency
//! decider, batch executor, and steering.
//!
//! These sit between an [`Operator`][layer0::Operator] implementation (e.g.
//! `neuron-op-react`) and a [`ToolRegistry`][neuron_tool::ToolRegistry]. They
//! answer one question: given the tool calls a model emitted in one step,
//! how do they get dispatched? Sequentially unless a tool opts into
//! `parallel_safe`, retried only when a tool opts into `idempotent`, and
//! abandonable mid-flight when the turn is cancelled.

mod batch;
mod concurrency;
mod planner;
mod steering;

pub use batch::{ActionResult, BatchExecutor, RetryPolicy};
pub use concurrency::{plan_batches, Batch};
pub use planner::{plan_step, plan_step_from_content, DispatchItem, StepPlan};
pub use steering::SteeringToken;
