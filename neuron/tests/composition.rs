//! Composition integration tests.
//!
//! Exercises the facade crate's prelude the way an application actually
//! would: a `ReactOperator` backed by a mock provider, registered with a
//! `LocalOrch`, driven end to end through a `TaskScheduler`.

#![cfg(all(feature = "op-react", feature = "orch-local"))]

use layer0::id::TaskId;
use neuron::prelude::*;
use neuron_op_react::{ReactConfig, ReactOperator};
use neuron_orch_local::LocalOrch;
use neuron_tool::{ToolDyn, ToolError, ToolRegistry};
use neuron_turn::context::NoCompaction;
use neuron_turn::provider::ProviderError;
use neuron_turn::types::{ContentPart, ProviderRequest, ProviderResponse, StopReason, TokenUsage};
use serde_json::json;
use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// --- Mock provider ---

struct MockProvider {
    responses: Mutex<VecDeque<ProviderResponse>>,
    call_count: AtomicUsize,
}

impl MockProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            call_count: AtomicUsize::new(0),
        }
    }
}

impl neuron_turn::provider::Provider for MockProvider {
    fn complete(
        &self,
        _request: ProviderRequest,
    ) -> impl std::future::Future<Output = Result<ProviderResponse, ProviderError>> + Send {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("MockProvider: no more responses queued");
        async move { Ok(response) }
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::Text {
            text: text.to_string(),
        }],
        stop_reason: StopReason::EndTurn,
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 5,
            ..Default::default()
        },
        model: "mock-model".into(),
        cost: None,
        truncated: None,
    }
}

fn tool_use_response(tool_id: &str, tool_name: &str, input: serde_json::Value) -> ProviderResponse {
    ProviderResponse {
        content: vec![ContentPart::ToolUse {
            id: tool_id.to_string(),
            name: tool_name.to_string(),
            input,
        }],
        stop_reason: StopReason::ToolUse,
        usage: TokenUsage {
            input_tokens: 10,
            output_tokens: 15,
            ..Default::default()
        },
        model: "mock-model".into(),
        cost: None,
        truncated: None,
    }
}

// --- Mock tool ---

struct EchoTool;

impl ToolDyn for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }
    fn description(&self) -> &str {
        "Echoes input back"
    }
    fn input_schema(&self) -> serde_json::Value {
        json!({"type": "object"})
    }
    fn call(
        &self,
        input: serde_json::Value,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>>
    {
        Box::pin(async move { Ok(json!({"echoed": input})) })
    }
}

struct NullStateReader;

#[async_trait::async_trait]
impl layer0::StateReader for NullStateReader {
    async fn read(
        &self,
        _scope: &layer0::Scope,
        _key: &str,
    ) -> Result<Option<serde_json::Value>, layer0::StateError> {
        Ok(None)
    }
    async fn list(
        &self,
        _scope: &layer0::Scope,
        _prefix: &str,
    ) -> Result<Vec<String>, layer0::StateError> {
        Ok(vec![])
    }
    async fn search(
        &self,
        _scope: &layer0::Scope,
        _query: &str,
        _limit: usize,
    ) -> Result<Vec<layer0::state::SearchResult>, layer0::StateError> {
        Ok(vec![])
    }
}

fn task_for(agent: AgentId, input: &str) -> Task {
    Task::single(
        neuron_ids::new_task_id(),
        SessionId::new(neuron_ids::new_opaque_id()),
        agent,
        Content::text(input),
    )
}

// === A single agent answers directly ===

#[tokio::test]
async fn single_agent_text_response_round_trips_through_scheduler() {
    let provider = MockProvider::new(vec![text_response("Paris")]);
    let op = ReactOperator::new(
        provider,
        ToolRegistry::new(),
        Box::new(NoCompaction),
        HookRegistry::new(),
        Arc::new(NullStateReader),
        ReactConfig::default(),
    );

    let agent = AgentId::new("answerer");
    let mut orch = LocalOrch::new();
    orch.register(agent.clone(), Arc::new(op));

    let runner = Arc::new(SwarmRunner::new(
        Arc::new(orch),
        Arc::new(HookRegistry::new()),
        EventBus::new(),
    ));
    let scheduler = TaskScheduler::new(runner);

    let task = task_for(agent, "What is the capital of France?");
    let resp = scheduler.run_task(task, RunConf::default()).await;

    assert!(resp.success);
    assert_eq!(resp.answer, "Paris");
    assert_eq!(resp.trajectory.len(), 1);
}

// === A single agent calls a tool before answering ===

#[tokio::test]
async fn single_agent_executes_tool_then_answers() {
    let provider = MockProvider::new(vec![
        tool_use_response("call-1", "echo", json!({"text": "hello"})),
        text_response("I echoed: hello"),
    ]);
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(EchoTool));

    let op = ReactOperator::new(
        provider,
        tools,
        Box::new(NoCompaction),
        HookRegistry::new(),
        Arc::new(NullStateReader),
        ReactConfig::default(),
    );

    let agent = AgentId::new("echoer");
    let mut orch = LocalOrch::new();
    orch.register(agent.clone(), Arc::new(op));

    let runner = Arc::new(SwarmRunner::new(
        Arc::new(orch),
        Arc::new(HookRegistry::new()),
        EventBus::new(),
    ));
    let scheduler = TaskScheduler::new(runner);

    let task = task_for(agent, "Echo hello");
    let resp = scheduler.run_task(task, RunConf::default()).await;

    assert!(resp.success);
    assert_eq!(resp.answer, "I echoed: hello");
}

// === A swarm that hands off forever hits the step limit ===

/// Always hands control straight to `to`, never producing a final answer.
struct PingAgent {
    to: AgentId,
}

#[async_trait::async_trait]
impl layer0::Operator for PingAgent {
    async fn execute(
        &self,
        _input: layer0::OperatorInput,
    ) -> Result<layer0::OperatorOutput, layer0::OperatorError> {
        let mut output =
            layer0::OperatorOutput::new(Content::text("ping"), layer0::ExitReason::Complete);
        output.effects = vec![Effect::Handoff {
            agent: self.to.clone(),
            state: serde_json::Value::Null,
        }];
        Ok(output)
    }
}

#[tokio::test]
async fn perpetual_handoff_surfaces_as_step_limit_failure() {
    use neuron_task::{Edge, EdgeKind, Swarm, SwarmBuildType};

    let agent_a = AgentId::new("ping");
    let agent_b = AgentId::new("pong");

    let mut orch = LocalOrch::new();
    orch.register(
        agent_a.clone(),
        Arc::new(PingAgent {
            to: agent_b.clone(),
        }),
    );
    orch.register(
        agent_b.clone(),
        Arc::new(PingAgent {
            to: agent_a.clone(),
        }),
    );

    let swarm = Swarm::new(
        SwarmBuildType::Handoff,
        vec![agent_a.clone()],
        vec![
            Edge::new(agent_a.clone(), agent_b.clone(), EdgeKind::Handoff),
            Edge::new(agent_b.clone(), agent_a.clone(), EdgeKind::Handoff),
        ],
        2,
    )
    .expect("valid topology");

    let runner = Arc::new(SwarmRunner::new(
        Arc::new(orch),
        Arc::new(HookRegistry::new()),
        EventBus::new(),
    ));
    let scheduler = TaskScheduler::new(runner);

    let task = Task::swarm(
        neuron_ids::new_task_id(),
        SessionId::new(neuron_ids::new_opaque_id()),
        Arc::new(swarm),
        Content::text("start"),
    );
    let resp = scheduler.run_task(task, RunConf::default()).await;

    assert!(!resp.success);
    assert_eq!(resp.msg, "step_limit");
}

// === Feature-gated prelude types stay accessible ===

#[test]
fn prelude_types_accessible() {
    let task = Task::single(
        TaskId::new("t1"),
        SessionId::new("s1"),
        AgentId::new("a"),
        Content::text("hello"),
    );
    assert_eq!(task.conf.max_steps, 25);

    let mut usages: HashMap<String, TokenUsage> = HashMap::new();
    usages.insert("a".into(), TokenUsage::default());
    assert_eq!(usages.len(), 1);
}
