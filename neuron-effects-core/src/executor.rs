//! The executor seam: how a declared [`Effect`] turns into something that happened.

use crate::{EffectError, ExecutionTrace};
use async_trait::async_trait;
use layer0::effect::Effect;
use layer0::id::AgentId;
use layer0::operator::OperatorInput;

/// Effect execution policy.
///
/// The default runner in `neuron-orch-kit` uses this trait as the single seam
/// where a product can override effect semantics without adopting a DSL: swap
/// in an executor that ships `Delegate`/`Handoff` into a durable workflow
/// engine, or one that fans `WriteMemory` out to a remote store, without
/// touching the dispatch loop itself.
#[async_trait]
pub trait EffectExecutor: Send + Sync {
    /// Execute a single effect and optionally enqueue follow-up dispatches.
    ///
    /// Implementations push onto `followups` for effects that request another
    /// agent invocation (`Delegate`, `Handoff`) and onto `trace.events` for
    /// anything worth recording. They do not dispatch followups themselves —
    /// the caller owns the dispatch loop.
    async fn execute_effect(
        &self,
        effect: &Effect,
        followups: &mut Vec<(AgentId, OperatorInput)>,
        trace: &mut ExecutionTrace,
    ) -> Result<(), EffectError>;
}
