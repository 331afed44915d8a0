use layer0::effect::Effect;
use layer0::error::OrchError;
use layer0::id::AgentId;
use layer0::operator::OperatorInput;
use layer0::orchestrator::Orchestrator;
use neuron_effects_core::{EffectError, EffectExecutor, ExecutionEvent, ExecutionTrace};
use std::sync::Arc;
use thiserror::Error;

/// Errors returned by `neuron-orch-kit`.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum KitError {
    /// Orchestrator error.
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchError),
    /// Effect execution failed (includes state errors from memory effects).
    #[error("effect execution failed: {0}")]
    Effect(#[from] EffectError),
    /// The runner could not be built as configured (e.g. no state backend).
    #[error("{0}")]
    Config(String),
    /// The runner detected a loop or exceeded a safety bound.
    #[error("execution exceeded safety bounds: {0}")]
    Safety(String),
}

/// A small runner that executes an initial dispatch, then interprets effects
/// into follow-up dispatches until the queue is empty.
///
/// This is the core "glue" promised by `neuron-orch-kit`: it proves that the
/// effect vocabulary is executable without forcing a DSL. Effect semantics
/// live in `neuron-effects-core`/`neuron-effects-local`; this runner owns
/// only the dispatch loop and the safety bound.
pub struct OrchestratedRunner<E: EffectExecutor> {
    orch: Arc<dyn Orchestrator>,
    effects: Arc<E>,
    max_followups: usize,
}

impl<E: EffectExecutor> OrchestratedRunner<E> {
    /// Create a new orchestrated runner.
    pub fn new(orch: Arc<dyn Orchestrator>, effects: Arc<E>) -> Self {
        Self {
            orch,
            effects,
            max_followups: 128,
        }
    }

    /// Set a safety bound on the number of follow-up dispatches.
    pub fn with_max_followups(mut self, max_followups: usize) -> Self {
        self.max_followups = max_followups;
        self
    }

    /// Dispatch an agent and interpret its effects until completion.
    pub async fn run(
        &self,
        agent: AgentId,
        input: OperatorInput,
    ) -> Result<ExecutionTrace, KitError> {
        let mut trace = ExecutionTrace::new();
        let mut queue: Vec<(AgentId, OperatorInput)> = vec![(agent, input)];
        let mut followups_executed = 0usize;

        while let Some((agent_id, agent_input)) = queue.pop() {
            trace.events.push(ExecutionEvent::Dispatched {
                agent: agent_id.clone(),
            });
            let output = self.orch.dispatch(&agent_id, agent_input).await?;

            // Interpret effects into state updates + followups.
            let mut followups: Vec<(AgentId, OperatorInput)> = vec![];
            for effect in &output.effects {
                // Signals go over the Orchestrator here, not inside the executor,
                // so products that swap executors don't also have to re-plumb signal
                // transport.
                if let Effect::Signal { target, payload } = effect {
                    self.orch.signal(target, payload.clone()).await?;
                }
                self.effects
                    .execute_effect(effect, &mut followups, &mut trace)
                    .await?;
            }

            trace.outputs.push(output);

            // Depth-first: push followups onto the queue.
            if !followups.is_empty() {
                followups_executed = followups_executed.saturating_add(followups.len());
                if followups_executed > self.max_followups {
                    return Err(KitError::Safety(format!(
                        "followup dispatch count exceeded max_followups={}",
                        self.max_followups
                    )));
                }
                queue.extend(followups);
            }
        }

        Ok(trace)
    }
}
