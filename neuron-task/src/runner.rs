//! `SwarmRunner` — drives a task from its root agent(s) to a final answer,
//! interpreting `Handoff`/`Delegate` effects as swarm routing and publishing
//! every step to the `EventBus` (spec components C8/C9).

use crate::context::{Context, TokenUsage};
use crate::error::TaskError;
use crate::swarm::Swarm;
use crate::task::{Task, TaskConf, TaskResponse, TrajectoryStep};
use layer0::content::Content;
use layer0::effect::Effect;
use layer0::hook::{HookAction, HookContext, HookPoint};
use layer0::id::{AgentId, MessageId};
use layer0::operator::{OperatorConfig, OperatorInput, OperatorOutput, TriggerType};
use layer0::orchestrator::Orchestrator;
use layer0::state::StateStore;
use neuron_bus::{CallType, EventBus, Message, MessageCategory, Topic};
use neuron_hooks::HookRegistry;
use std::collections::hash_map::DefaultHasher;
use std::future::Future;
use std::hash::{Hash, Hasher};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Drives agent-loop steps for a [`Task`], resolving `Handoff`/`Delegate`
/// effects against the task's [`Swarm`] (if any) and publishing every step
/// on an [`EventBus`].
///
/// Does not hold its own agent registry: agent names are resolved through
/// whatever [`Orchestrator`] it is built with, the same way `neuron-orch-kit`
/// resolves them. `Swarm` only narrows which routes between those names are
/// legal.
pub struct SwarmRunner {
    orch: Arc<dyn Orchestrator>,
    hooks: Arc<HookRegistry>,
    bus: EventBus,
    state: Option<Arc<dyn StateStore>>,
}

impl SwarmRunner {
    /// Build a runner over an orchestrator, hook pipeline, and event bus.
    pub fn new(orch: Arc<dyn Orchestrator>, hooks: Arc<HookRegistry>, bus: EventBus) -> Self {
        Self {
            orch,
            hooks,
            bus,
            state: None,
        }
    }

    /// Attach a state store so `WriteMemory`/`DeleteMemory` effects are
    /// actually applied. Without one, those effects are accepted but
    /// silently dropped.
    pub fn with_state(mut self, state: Arc<dyn StateStore>) -> Self {
        self.state = Some(state);
        self
    }

    /// The event bus this runner publishes to, for callers that want to
    /// subscribe or open a streaming handle before calling [`Self::run`].
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Run `task` to completion against `context`, returning its final
    /// [`TaskResponse`]. Never panics on agent/topology failure — those
    /// become a `success: false` response carrying the error in `msg`.
    pub async fn run(&self, task: &Task, context: &Context) -> TaskResponse {
        let start = Instant::now();
        self.bus.register_task(task.id.clone()).await;
        let _ = self
            .publish(
                task,
                None,
                MessageCategory::Control,
                Topic::TaskStart,
                "scheduler",
                CallType::AgentDirect,
                serde_json::json!({ "input": task.input.as_text() }),
            )
            .await;

        let outcome = self.dispatch_target(task, context).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;
        let usage = context.token_usage();

        let response = match outcome {
            Ok((output, trajectory)) => TaskResponse::success(
                task.id.clone(),
                output.message.as_text().unwrap_or_default(),
                usage,
                trajectory,
                elapsed_ms,
            ),
            Err((err, trajectory)) => {
                TaskResponse::failure(task.id.clone(), &err, usage, trajectory, elapsed_ms)
            }
        };

        let _ = self
            .publish(
                task,
                None,
                MessageCategory::Control,
                Topic::TaskResponse,
                "scheduler",
                CallType::AgentDirect,
                serde_json::to_value(&response).unwrap_or(serde_json::Value::Null),
            )
            .await;
        self.bus.done(&task.id).await;
        response
    }

    async fn dispatch_target(
        &self,
        task: &Task,
        context: &Context,
    ) -> Result<(OperatorOutput, Vec<TrajectoryStep>), (TaskError, Vec<TrajectoryStep>)> {
        use crate::task::AgentTarget;

        match &task.target {
            AgentTarget::Single(agent) => {
                let mut steps = 0u32;
                let mut history = Vec::new();
                let mut trajectory = Vec::new();
                let input = OperatorInput::new(task.input.clone(), TriggerType::Task);
                let result = self
                    .run_agent(
                        None,
                        agent.clone(),
                        input,
                        context,
                        &mut steps,
                        &mut history,
                        &mut trajectory,
                        &task.conf,
                        task,
                    )
                    .await;
                result.map(|o| (o, trajectory.clone())).map_err(|e| (e, trajectory))
            }
            AgentTarget::Swarm(swarm) if swarm.root_agents.len() == 1 => {
                let mut steps = 0u32;
                let mut history = Vec::new();
                let mut trajectory = Vec::new();
                let input = OperatorInput::new(task.input.clone(), TriggerType::Task);
                let result = self
                    .run_agent(
                        Some(swarm.as_ref()),
                        swarm.root_agents[0].clone(),
                        input,
                        context,
                        &mut steps,
                        &mut history,
                        &mut trajectory,
                        &task.conf,
                        task,
                    )
                    .await;
                result.map(|o| (o, trajectory.clone())).map_err(|e| (e, trajectory))
            }
            AgentTarget::Swarm(swarm) => {
                // Multiple roots run concurrently on the same input; their
                // text outputs merge into one downstream message (§4.7).
                let branches = swarm.root_agents.iter().map(|root| {
                    let branch_ctx = context.deep_copy();
                    let input = OperatorInput::new(task.input.clone(), TriggerType::Task);
                    let root = root.clone();
                    async move {
                        let mut steps = 0u32;
                        let mut history = Vec::new();
                        let mut trajectory = Vec::new();
                        let result = self
                            .run_agent(
                                Some(swarm.as_ref()),
                                root,
                                input,
                                &branch_ctx,
                                &mut steps,
                                &mut history,
                                &mut trajectory,
                                &task.conf,
                                task,
                            )
                            .await;
                        (result, branch_ctx, trajectory)
                    }
                });

                let results: Vec<_> = futures_util::future::join_all(branches).await;
                let mut merged_trajectory = Vec::new();
                let mut texts = Vec::new();
                for (result, branch_ctx, trajectory) in results {
                    context.merge_usage_from(&branch_ctx);
                    merged_trajectory.extend(trajectory.clone());
                    match result {
                        Ok(output) => texts.push(output.message.as_text().unwrap_or_default().to_string()),
                        Err(e) => return Err((e, merged_trajectory)),
                    }
                }
                let merged = OperatorOutput::new(
                    Content::text(texts.join("\n\n")),
                    layer0::operator::ExitReason::Complete,
                );
                Ok((merged, merged_trajectory))
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn run_agent<'a>(
        &'a self,
        swarm: Option<&'a Swarm>,
        agent: AgentId,
        input: OperatorInput,
        context: &'a Context,
        step_count: &'a mut u32,
        handoff_history: &'a mut Vec<(AgentId, AgentId, u64)>,
        trajectory: &'a mut Vec<TrajectoryStep>,
        conf: &'a TaskConf,
        task: &'a Task,
    ) -> Pin<Box<dyn Future<Output = Result<OperatorOutput, TaskError>> + Send + 'a>> {
        Box::pin(async move {
            if context.is_cancelled() {
                return Err(TaskError::Cancelled);
            }
            *step_count += 1;
            if *step_count > conf.max_steps {
                return Err(TaskError::StepLimit(conf.max_steps));
            }

            if let HookAction::Halt { reason } =
                self.hooks.dispatch(&HookContext::new(HookPoint::PreAgentStep)).await
            {
                return Err(TaskError::Internal(format!("halted by hook: {reason}")));
            }

            let mut op_input = input;
            if op_input.config.is_none() {
                if let Some(tools) = &task.tools_allowed {
                    op_input.config = Some(OperatorConfig {
                        allowed_tools: Some(tools.iter().cloned().collect()),
                        ..OperatorConfig::default()
                    });
                }
            }
            if op_input.session.is_none() {
                op_input.session = Some(task.session_id.clone());
            }

            let step_msg_id = self
                .publish(
                    task,
                    None,
                    MessageCategory::Agent,
                    Topic::Step,
                    agent.as_str(),
                    CallType::AgentDirect,
                    serde_json::json!({ "step": *step_count }),
                )
                .await;

            let output = self
                .orch
                .dispatch(&agent, op_input)
                .await
                .map_err(|e| TaskError::AgentFailed(e.to_string()))?;

            context.add_token(
                agent.as_str(),
                TokenUsage::new(output.metadata.tokens_in, output.metadata.tokens_out),
            );

            trajectory.push(TrajectoryStep {
                step: *step_count,
                agent: agent.to_string(),
                summary: output
                    .message
                    .as_text()
                    .unwrap_or_default()
                    .chars()
                    .take(200)
                    .collect(),
                exit_reason: format!("{:?}", output.exit_reason),
            });

            if let HookAction::Halt { reason } =
                self.hooks.dispatch(&HookContext::new(HookPoint::PostAgentStep)).await
            {
                return Err(TaskError::Internal(format!("halted by hook: {reason}")));
            }

            self.run_side_effects(task, &output, &step_msg_id).await;

            if let Some((to_ref, state_ref)) = find_handoff(&output.effects) {
                let to = to_ref.clone();
                let state = state_ref.clone();
                let swarm = swarm
                    .ok_or_else(|| TaskError::EdgeNotPermitted("handoff outside a swarm".into()))?;
                if !swarm.allows_handoff(&agent, &to) {
                    return Err(TaskError::EdgeNotPermitted(format!(
                        "{agent} -> {to} is not a declared handoff edge"
                    )));
                }
                let hash = hash_value(&state);
                record_and_check_endless(
                    handoff_history,
                    agent.clone(),
                    to.clone(),
                    hash,
                    conf.endless_threshold,
                )?;
                let _ = self
                    .publish(
                        task,
                        step_msg_id,
                        MessageCategory::Control,
                        Topic::Handoff,
                        agent.as_str(),
                        CallType::Handoff,
                        serde_json::json!({ "to": to.as_str() }),
                    )
                    .await;
                let next_input = OperatorInput::new(Content::text(state.to_string()), TriggerType::Task);
                return self
                    .run_agent(
                        Some(swarm),
                        to,
                        next_input,
                        context,
                        step_count,
                        handoff_history,
                        trajectory,
                        conf,
                        task,
                    )
                    .await;
            }

            if let Some((to_ref, delegate_input_ref)) = find_delegate(&output.effects) {
                let to = to_ref.clone();
                let delegate_input = delegate_input_ref.clone();
                let swarm_ref = swarm
                    .ok_or_else(|| TaskError::EdgeNotPermitted("delegate outside a swarm".into()))?;
                if !swarm_ref.allows_delegate(&agent, &to) {
                    return Err(TaskError::EdgeNotPermitted(format!(
                        "{agent} -> {to} is not a declared team edge"
                    )));
                }
                let _ = self
                    .publish(
                        task,
                        step_msg_id,
                        MessageCategory::Tool,
                        Topic::ToolCall,
                        agent.as_str(),
                        CallType::AgentAsTool,
                        serde_json::json!({ "to": to.as_str() }),
                    )
                    .await;
                let callee_output = self
                    .run_agent(
                        Some(swarm_ref),
                        to,
                        delegate_input,
                        context,
                        step_count,
                        handoff_history,
                        trajectory,
                        conf,
                        task,
                    )
                    .await?;
                let resumed_input = OperatorInput::new(callee_output.message, TriggerType::Task);
                return self
                    .run_agent(
                        swarm,
                        agent,
                        resumed_input,
                        context,
                        step_count,
                        handoff_history,
                        trajectory,
                        conf,
                        task,
                    )
                    .await;
            }

            if let Some(swarm) = swarm {
                if let Some(next) = swarm.workflow_next(&agent) {
                    let next_input = OperatorInput::new(output.message.clone(), TriggerType::Task);
                    return self
                        .run_agent(
                            Some(swarm),
                            next.clone(),
                            next_input,
                            context,
                            step_count,
                            handoff_history,
                            trajectory,
                            conf,
                            task,
                        )
                        .await;
                }
            }

            Ok(output)
        })
    }

    async fn run_side_effects(&self, task: &Task, output: &OperatorOutput, pre: &Option<MessageId>) {
        for effect in &output.effects {
            match effect {
                Effect::WriteMemory { scope, key, value } => {
                    if let Some(state) = &self.state {
                        if let Err(e) = state.write(scope, key, value.clone()).await {
                            tracing::warn!(error = %e, key = %key, "effect write_memory failed");
                        }
                    }
                }
                Effect::DeleteMemory { scope, key } => {
                    if let Some(state) = &self.state {
                        if let Err(e) = state.delete(scope, key).await {
                            tracing::warn!(error = %e, key = %key, "effect delete_memory failed");
                        }
                    }
                }
                Effect::Signal { target, payload } => {
                    if let Err(e) = self.orch.signal(target, payload.clone()).await {
                        tracing::warn!(error = %e, "effect signal failed");
                    }
                }
                Effect::Log { level, message, data } => {
                    tracing::debug!(level = ?level, data = ?data, "agent log: {message}");
                    let _ = self
                        .publish(
                            task,
                            pre.clone(),
                            MessageCategory::Control,
                            Topic::Custom("log".to_string()),
                            "agent",
                            CallType::AgentDirect,
                            serde_json::json!({ "level": format!("{level:?}"), "message": message, "data": data }),
                        )
                        .await;
                }
                Effect::Handoff { .. } | Effect::Delegate { .. } | Effect::Custom { .. } => {}
                _ => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn publish(
        &self,
        task: &Task,
        pre: Option<MessageId>,
        category: MessageCategory,
        topic: Topic,
        sender: &str,
        call_type: CallType,
        payload: serde_json::Value,
    ) -> Option<MessageId> {
        let message = Message::new(
            task.id.clone(),
            task.session_id.clone(),
            category,
            topic,
            sender,
            call_type,
            payload,
            pre,
        );
        let id = message.id.clone();
        if let Err(e) = self.bus.publish(message).await {
            tracing::warn!(error = %e, "failed to publish task message");
            return None;
        }
        Some(id)
    }
}

fn find_handoff(effects: &[Effect]) -> Option<(&AgentId, &serde_json::Value)> {
    effects.iter().find_map(|e| match e {
        Effect::Handoff { agent, state } => Some((agent, state)),
        _ => None,
    })
}

fn find_delegate(effects: &[Effect]) -> Option<(&AgentId, &OperatorInput)> {
    effects.iter().find_map(|e| match e {
        Effect::Delegate { agent, input } => Some((agent, input.as_ref())),
        _ => None,
    })
}

fn hash_value(value: &serde_json::Value) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.to_string().hash(&mut hasher);
    hasher.finish()
}

/// Push a handoff onto the history and fail if the same (from, to, state)
/// triple just repeated `threshold` times in a row (§4.7 endless-loop guard).
fn record_and_check_endless(
    history: &mut Vec<(AgentId, AgentId, u64)>,
    from: AgentId,
    to: AgentId,
    hash: u64,
    threshold: u32,
) -> Result<(), TaskError> {
    history.push((from.clone(), to.clone(), hash));
    let run_len = history
        .iter()
        .rev()
        .take_while(|entry| entry.0 == from && entry.1 == to && entry.2 == hash)
        .count() as u32;
    if run_len >= threshold {
        return Err(TaskError::EndlessLoop {
            from: from.to_string(),
            to: to.to_string(),
            count: run_len,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Context;
    use crate::swarm::{Edge, EdgeKind, Swarm, SwarmBuildType};
    use layer0::effect::Effect;
    use layer0::error::OrchError;
    use layer0::operator::ExitReason;
    use layer0::orchestrator::QueryPayload;
    use std::collections::HashMap;

    /// Routes dispatch to a per-agent closure, so each test wires up exactly
    /// the handoff/delegate/workflow behavior it wants to exercise.
    struct Router {
        routes: HashMap<AgentId, Box<dyn Fn(OperatorInput) -> OperatorOutput + Send + Sync>>,
    }

    impl Router {
        fn new() -> Self {
            Self {
                routes: HashMap::new(),
            }
        }

        fn on(
            mut self,
            agent: AgentId,
            f: impl Fn(OperatorInput) -> OperatorOutput + Send + Sync + 'static,
        ) -> Self {
            self.routes.insert(agent, Box::new(f));
            self
        }
    }

    #[async_trait::async_trait]
    impl Orchestrator for Router {
        async fn dispatch(
            &self,
            agent: &AgentId,
            input: OperatorInput,
        ) -> Result<OperatorOutput, OrchError> {
            let route = self
                .routes
                .get(agent)
                .unwrap_or_else(|| panic!("no route registered for {agent}"));
            Ok(route(input))
        }

        async fn dispatch_many(
            &self,
            tasks: Vec<(AgentId, OperatorInput)>,
        ) -> Vec<Result<OperatorOutput, OrchError>> {
            let mut out = Vec::new();
            for (agent, input) in tasks {
                out.push(self.dispatch(&agent, input).await);
            }
            out
        }

        async fn signal(
            &self,
            _target: &layer0::id::WorkflowId,
            _signal: layer0::effect::SignalPayload,
        ) -> Result<(), OrchError> {
            Ok(())
        }

        async fn query(
            &self,
            _target: &layer0::id::WorkflowId,
            _query: QueryPayload,
        ) -> Result<serde_json::Value, OrchError> {
            Ok(serde_json::Value::Null)
        }
    }

    fn complete(text: &str) -> OperatorOutput {
        OperatorOutput::new(Content::text(text), ExitReason::Complete)
    }

    fn handoff_to(agent: &AgentId, state: serde_json::Value) -> OperatorOutput {
        let mut output = OperatorOutput::new(Content::text(""), ExitReason::Complete);
        output.effects = vec![Effect::Handoff {
            agent: agent.clone(),
            state,
        }];
        output
    }

    fn runner(orch: Router) -> SwarmRunner {
        SwarmRunner::new(Arc::new(orch), Arc::new(HookRegistry::new()), EventBus::new())
    }

    fn task_with(swarm: Arc<Swarm>, max_steps: u32) -> Task {
        let mut task = Task::swarm(
            TaskId::new("t1"),
            SessionId::new("s1"),
            swarm,
            Content::text("start"),
        );
        task.conf.max_steps = max_steps;
        task
    }

    #[tokio::test]
    async fn handoff_routes_to_declared_peer() {
        let a = AgentId::new("a");
        let b = AgentId::new("b");
        let orch = Router::new()
            .on(a.clone(), move |_| handoff_to(&AgentId::new("b"), serde_json::Value::Null))
            .on(b.clone(), |_| complete("done"));
        let swarm = Arc::new(
            Swarm::new(
                SwarmBuildType::Handoff,
                vec![a.clone()],
                vec![Edge::new(a.clone(), b.clone(), EdgeKind::Handoff)],
                10,
            )
            .unwrap(),
        );
        let task = task_with(swarm, 10);
        let resp = runner(orch).run(&task, &Context::new()).await;

        assert!(resp.success);
        assert_eq!(resp.answer, "done");
        assert_eq!(resp.trajectory.len(), 2);
        assert_eq!(resp.trajectory[0].agent, "a");
        assert_eq!(resp.trajectory[1].agent, "b");
    }

    #[tokio::test]
    async fn handoff_to_undeclared_peer_is_rejected() {
        let a = AgentId::new("a");
        let b = AgentId::new("b");
        let c = AgentId::new("c");
        let orch = Router::new()
            .on(a.clone(), move |_| handoff_to(&AgentId::new("c"), serde_json::Value::Null))
            .on(c.clone(), |_| complete("unreachable"));
        // Only a->b is declared; the agent hands off to c instead.
        let swarm = Arc::new(
            Swarm::new(
                SwarmBuildType::Handoff,
                vec![a.clone()],
                vec![Edge::new(a.clone(), b.clone(), EdgeKind::Handoff)],
                10,
            )
            .unwrap(),
        );
        let task = task_with(swarm, 10);
        let resp = runner(orch).run(&task, &Context::new()).await;

        assert!(!resp.success);
        assert_eq!(resp.msg, "invalid_topology");
    }

    #[tokio::test]
    async fn delegate_resumes_caller_with_callee_output() {
        let leader = AgentId::new("leader");
        let helper = AgentId::new("helper");
        let orch = Router::new()
            .on(leader.clone(), {
                let helper = helper.clone();
                move |input: OperatorInput| {
                    if input.message.as_text() == Some("42") {
                        return complete("answer: 42");
                    }
                    let mut output = OperatorOutput::new(Content::text(""), ExitReason::Complete);
                    output.effects = vec![Effect::Delegate {
                        agent: helper.clone(),
                        input: Box::new(OperatorInput::new(Content::text("compute"), TriggerType::Task)),
                    }];
                    output
                }
            })
            .on(helper.clone(), |_| complete("42"));
        let swarm = Arc::new(
            Swarm::new(
                SwarmBuildType::Team,
                vec![leader.clone()],
                vec![Edge::new(leader.clone(), helper.clone(), EdgeKind::Team)],
                10,
            )
            .unwrap(),
        );
        let task = task_with(swarm, 10);
        let resp = runner(orch).run(&task, &Context::new()).await;

        assert!(resp.success);
        assert_eq!(resp.answer, "answer: 42");
        assert_eq!(resp.trajectory.len(), 3);
    }

    #[tokio::test]
    async fn workflow_edge_chains_after_final_answer() {
        let a = AgentId::new("a");
        let b = AgentId::new("b");
        let orch = Router::new()
            .on(a.clone(), |_| complete("step one"))
            .on(b.clone(), |_| complete("final"));
        let swarm = Arc::new(
            Swarm::new(
                SwarmBuildType::Workflow,
                vec![a.clone()],
                vec![Edge::new(a.clone(), b.clone(), EdgeKind::Workflow)],
                10,
            )
            .unwrap(),
        );
        let task = task_with(swarm, 10);
        let resp = runner(orch).run(&task, &Context::new()).await;

        assert!(resp.success);
        assert_eq!(resp.answer, "final");
        assert_eq!(resp.trajectory.len(), 2);
    }

    #[tokio::test]
    async fn perpetual_handoff_hits_step_limit() {
        let a = AgentId::new("a");
        let b = AgentId::new("b");
        let orch = Router::new()
            .on(a.clone(), {
                let b = b.clone();
                move |_| handoff_to(&b, serde_json::Value::Null)
            })
            .on(b.clone(), {
                let a = a.clone();
                move |_| handoff_to(&a, serde_json::Value::Null)
            });
        let swarm = Arc::new(
            Swarm::new(
                SwarmBuildType::Handoff,
                vec![a.clone()],
                vec![
                    Edge::new(a.clone(), b.clone(), EdgeKind::Handoff),
                    Edge::new(b.clone(), a.clone(), EdgeKind::Handoff),
                ],
                2,
            )
            .unwrap(),
        );
        let task = task_with(swarm, 2);
        let resp = runner(orch).run(&task, &Context::new()).await;

        assert!(!resp.success);
        assert_eq!(resp.msg, "step_limit");
    }

    #[tokio::test]
    async fn repeated_self_handoff_is_detected_as_endless_loop() {
        let a = AgentId::new("a");
        let orch = Router::new().on(a.clone(), {
            let a = a.clone();
            move |_| handoff_to(&a, serde_json::json!({"n": 1}))
        });
        let swarm = Arc::new(
            Swarm::new(
                SwarmBuildType::Handoff,
                vec![a.clone()],
                vec![Edge::new(a.clone(), a.clone(), EdgeKind::Handoff)],
                100,
            )
            .unwrap(),
        );
        let mut task = task_with(swarm, 100);
        task.conf.endless_threshold = 3;
        let resp = runner(orch).run(&task, &Context::new()).await;

        assert!(!resp.success);
        assert_eq!(resp.msg, "endless_loop");
    }
}
