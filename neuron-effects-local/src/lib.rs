#![deny(missing_docs)]
//! Local effect executor implementation using `StateStore` and `Orchestrator`.
//!
//! Executes state effects directly against a supplied state store and turns
//! `Delegate`/`Handoff` into follow-up dispatches the caller can feed back into
//! the same orchestrator. `Signal` is recorded only — sending it is the
//! runner's job, since the signal transport is `Orchestrator::signal`, not
//! something this executor has a reference to.

use async_trait::async_trait;
use layer0::content::Content;
use layer0::effect::Effect;
use layer0::id::AgentId;
use layer0::operator::{OperatorInput, TriggerType};
use layer0::state::StateStore;
use neuron_effects_core::{EffectError, EffectExecutor, ExecutionEvent, ExecutionTrace};
use std::sync::Arc;

/// Default effect executor for local (single-process) composition.
pub struct LocalEffectExecutor<S: StateStore + ?Sized> {
    /// State backend used for memory effects.
    pub state: Arc<S>,
}

impl<S: StateStore + ?Sized> LocalEffectExecutor<S> {
    /// Create a new local effect executor.
    pub fn new(state: Arc<S>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl<S: StateStore + ?Sized + 'static> EffectExecutor for LocalEffectExecutor<S> {
    async fn execute_effect(
        &self,
        effect: &Effect,
        followups: &mut Vec<(AgentId, OperatorInput)>,
        trace: &mut ExecutionTrace,
    ) -> Result<(), EffectError> {
        match effect {
            Effect::WriteMemory { scope, key, value } => {
                self.state.write(scope, key, value.clone()).await?;
                tracing::debug!(key = %key, "effect: wrote memory");
                trace
                    .events
                    .push(ExecutionEvent::MemoryWritten { key: key.clone() });
            }
            Effect::DeleteMemory { scope, key } => {
                self.state.delete(scope, key).await?;
                tracing::debug!(key = %key, "effect: deleted memory");
                trace
                    .events
                    .push(ExecutionEvent::MemoryDeleted { key: key.clone() });
            }
            Effect::Signal { target, payload } => {
                tracing::debug!(target = %target, signal_type = %payload.signal_type, "effect: signal recorded");
                trace.events.push(ExecutionEvent::Signaled {
                    target: target.clone(),
                    signal_type: payload.signal_type.clone(),
                });
                // The runner sends signals via the Orchestrator; this executor only records.
            }
            Effect::Delegate { agent, input } => {
                tracing::debug!(agent = %agent, "effect: delegate enqueued");
                followups.push((agent.clone(), input.as_ref().clone()));
                trace.events.push(ExecutionEvent::DelegateEnqueued {
                    agent: agent.clone(),
                });
            }
            Effect::Handoff { agent, state } => {
                // v0 semantics: handoff state is serialized into a new task input.
                tracing::debug!(agent = %agent, "effect: handoff enqueued");
                let input = OperatorInput::new(Content::text(state.to_string()), TriggerType::Task);
                followups.push((agent.clone(), input));
                trace.events.push(ExecutionEvent::HandoffEnqueued {
                    agent: agent.clone(),
                });
            }
            Effect::Log { .. } | Effect::Custom { .. } => {
                // v0: the local executor ignores logs/custom effects by default.
                // Products that need these wire their own EffectExecutor.
            }
            _ => {
                // `Effect` is non_exhaustive; ignore forward-compatible variants by default.
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer0::effect::{Scope, SignalPayload};
    use layer0::error::StateError;
    use layer0::id::WorkflowId;
    use layer0::state::SearchResult;
    use serde_json::json;
    use std::collections::HashMap;
    use tokio::sync::RwLock;

    struct MemStore {
        data: RwLock<HashMap<String, serde_json::Value>>,
    }

    impl MemStore {
        fn new() -> Self {
            Self {
                data: RwLock::new(HashMap::new()),
            }
        }
    }

    #[async_trait]
    impl StateStore for MemStore {
        async fn read(
            &self,
            _scope: &Scope,
            key: &str,
        ) -> Result<Option<serde_json::Value>, StateError> {
            Ok(self.data.read().await.get(key).cloned())
        }

        async fn write(
            &self,
            _scope: &Scope,
            key: &str,
            value: serde_json::Value,
        ) -> Result<(), StateError> {
            self.data.write().await.insert(key.to_string(), value);
            Ok(())
        }

        async fn delete(&self, _scope: &Scope, key: &str) -> Result<(), StateError> {
            self.data.write().await.remove(key);
            Ok(())
        }

        async fn list(&self, _scope: &Scope, _prefix: &str) -> Result<Vec<String>, StateError> {
            Ok(vec![])
        }

        async fn search(
            &self,
            _scope: &Scope,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<SearchResult>, StateError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn write_memory_persists_and_records_event() {
        let store = Arc::new(MemStore::new());
        let exec = LocalEffectExecutor::new(store.clone());
        let mut followups = vec![];
        let mut trace = ExecutionTrace::new();

        exec.execute_effect(
            &Effect::WriteMemory {
                scope: Scope::Global,
                key: "a".into(),
                value: json!(1),
            },
            &mut followups,
            &mut trace,
        )
        .await
        .unwrap();

        assert_eq!(store.read(&Scope::Global, "a").await.unwrap(), Some(json!(1)));
        assert!(matches!(trace.events[0], ExecutionEvent::MemoryWritten { .. }));
        assert!(followups.is_empty());
    }

    #[tokio::test]
    async fn delete_memory_removes_key() {
        let store = Arc::new(MemStore::new());
        store.write(&Scope::Global, "a", json!(1)).await.unwrap();
        let exec = LocalEffectExecutor::new(store.clone());
        let mut followups = vec![];
        let mut trace = ExecutionTrace::new();

        exec.execute_effect(
            &Effect::DeleteMemory {
                scope: Scope::Global,
                key: "a".into(),
            },
            &mut followups,
            &mut trace,
        )
        .await
        .unwrap();

        assert_eq!(store.read(&Scope::Global, "a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn delegate_enqueues_followup_without_dispatching() {
        let store = Arc::new(MemStore::new());
        let exec = LocalEffectExecutor::new(store);
        let mut followups = vec![];
        let mut trace = ExecutionTrace::new();

        exec.execute_effect(
            &Effect::Delegate {
                agent: AgentId::new("child"),
                input: Box::new(OperatorInput::new(Content::text("hi"), TriggerType::Task)),
            },
            &mut followups,
            &mut trace,
        )
        .await
        .unwrap();

        assert_eq!(followups.len(), 1);
        assert_eq!(followups[0].0, AgentId::new("child"));
    }

    #[tokio::test]
    async fn handoff_serializes_state_into_followup_message() {
        let store = Arc::new(MemStore::new());
        let exec = LocalEffectExecutor::new(store);
        let mut followups = vec![];
        let mut trace = ExecutionTrace::new();

        exec.execute_effect(
            &Effect::Handoff {
                agent: AgentId::new("next"),
                state: json!({"ticket": 7}),
            },
            &mut followups,
            &mut trace,
        )
        .await
        .unwrap();

        let text = followups[0].1.message.as_text().unwrap();
        assert!(text.contains("7"));
    }

    #[tokio::test]
    async fn signal_is_recorded_but_not_sent() {
        let store = Arc::new(MemStore::new());
        let exec = LocalEffectExecutor::new(store);
        let mut followups = vec![];
        let mut trace = ExecutionTrace::new();

        exec.execute_effect(
            &Effect::Signal {
                target: WorkflowId::new("wf"),
                payload: SignalPayload::new("t", json!(null)),
            },
            &mut followups,
            &mut trace,
        )
        .await
        .unwrap();

        assert!(followups.is_empty());
        assert!(matches!(trace.events[0], ExecutionEvent::Signaled { .. }));
    }

    #[tokio::test]
    async fn log_and_custom_effects_are_ignored() {
        let store = Arc::new(MemStore::new());
        let exec = LocalEffectExecutor::new(store);
        let mut followups = vec![];
        let mut trace = ExecutionTrace::new();

        exec.execute_effect(
            &Effect::Log {
                level: layer0::effect::LogLevel::Info,
                message: "hi".into(),
                data: None,
            },
            &mut followups,
            &mut trace,
        )
        .await
        .unwrap();

        assert!(trace.events.is_empty());
        assert!(followups.is_empty());
    }
}
