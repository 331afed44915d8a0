#![cfg(feature = "provider-ollama")]
//! Smoke tests against a local Ollama instance.
//!
//! These tests are `#[ignore]` by default. Run them with:
//!
//!     cargo test -p neuron --features provider-ollama --test smoke_ollama -- --ignored
//!
//! They require a running Ollama server with the `llama3.2` model pulled.
//! Start Ollama first: `ollama serve` then `ollama pull llama3.2`.
//!
//! Tool calling is not tested here because small local models are unreliable
//! with tool use. These tests validate basic completion and streaming.

use futures::StreamExt;
use neuron_provider_ollama::Ollama;
use neuron_types::{
    CompletionRequest, ContentBlock, Message, Provider, Role, StreamEvent, SystemPrompt,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ollama() -> Ollama {
    Ollama::new()
        .model("llama3.2")
        .keep_alive("0") // unload after test
}

fn user_msg(text: &str) -> Message {
    Message {
        role: Role::User,
        content: vec![ContentBlock::Text(text.to_string())],
    }
}

// ===========================================================================
// Test 1: Basic completion
// ===========================================================================

#[tokio::test]
#[ignore = "requires local Ollama"]
async fn smoke_basic_completion() {
    let provider = ollama();

    let request = CompletionRequest {
        model: "llama3.2".into(),
        messages: vec![user_msg("What is 2+2? Reply with just the number.")],
        system: Some(SystemPrompt::Text(
            "You are a helpful assistant. Reply concisely with only the answer.".into(),
        )),
        tools: vec![],
        max_tokens: Some(64),
        temperature: Some(0.0),
        top_p: None,
        stop_sequences: vec![],
        tool_choice: None,
        response_format: None,
        thinking: None,
        reasoning_effort: None,
        extra: None,
    };

    let response = provider.complete(request).await.unwrap();

    assert_eq!(response.message.role, Role::Assistant);
    assert!(!response.message.content.is_empty(), "should have content");

    let text = match &response.message.content[0] {
        ContentBlock::Text(t) => t.clone(),
        other => panic!("expected Text, got {other:?}"),
    };
    assert!(text.contains("4"), "expected '4' in response, got: {text}");

    println!("  response: {text}");
    println!(
        "  tokens: {} in / {} out",
        response.usage.input_tokens, response.usage.output_tokens
    );
}

// ===========================================================================
// Test 2: Streaming
// ===========================================================================

#[tokio::test]
#[ignore = "requires local Ollama"]
async fn smoke_streaming() {
    let provider = ollama();

    let request = CompletionRequest {
        model: "llama3.2".into(),
        messages: vec![user_msg(
            "Count from 1 to 5, separated by commas. Nothing else.",
        )],
        system: None,
        tools: vec![],
        max_tokens: Some(64),
        temperature: Some(0.0),
        top_p: None,
        stop_sequences: vec![],
        tool_choice: None,
        response_format: None,
        thinking: None,
        reasoning_effort: None,
        extra: None,
    };

    let stream_handle = provider.complete_stream(request).await.unwrap();
    let mut stream = stream_handle.receiver;

    let mut text_deltas = Vec::new();
    let mut got_complete = false;

    while let Some(event) = stream.next().await {
        match event {
            StreamEvent::TextDelta(delta) => {
                text_deltas.push(delta);
            }
            StreamEvent::MessageComplete(msg) => {
                assert_eq!(msg.role, Role::Assistant);
                got_complete = true;
            }
            StreamEvent::Error(e) => {
                panic!("stream error: {}", e.message);
            }
            _ => {}
        }
    }

    assert!(!text_deltas.is_empty(), "should receive text deltas");
    assert!(got_complete, "should receive message complete event");

    let full_text: String = text_deltas.into_iter().collect();
    println!("  streamed: {full_text}");
    assert!(
        full_text.contains("1") && full_text.contains("5"),
        "expected 1-5 in: {full_text}"
    );
}

// ===========================================================================
// Test 3: Full ReAct operator (no tools — local models unreliable with tool
// calling)
// ===========================================================================

#[cfg(feature = "op-react")]
mod react_smoke {
    use layer0::operator::{Operator, OperatorInput, TriggerType};
    use layer0::{Content, Scope, StateError, StateReader};
    use neuron_op_react::{ReactConfig, ReactOperator};
    use neuron_provider_ollama::OllamaProvider;
    use neuron_tool::ToolRegistry;
    use neuron_turn::context::NoCompaction;
    use std::sync::Arc;

    struct NullStateReader;

    #[async_trait::async_trait]
    impl StateReader for NullStateReader {
        async fn read(
            &self,
            _scope: &Scope,
            _key: &str,
        ) -> Result<Option<serde_json::Value>, StateError> {
            Ok(None)
        }
        async fn list(&self, _scope: &Scope, _prefix: &str) -> Result<Vec<String>, StateError> {
            Ok(vec![])
        }
        async fn search(
            &self,
            _scope: &Scope,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<layer0::state::SearchResult>, StateError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    #[ignore = "requires local Ollama"]
    async fn smoke_full_react_loop() {
        let provider = OllamaProvider::new().with_keep_alive("0");

        let op = ReactOperator::new(
            provider,
            ToolRegistry::new(),
            Box::new(NoCompaction),
            neuron_hooks::HookRegistry::new(),
            Arc::new(NullStateReader),
            ReactConfig {
                system_prompt: "You are a helpful assistant. Answer concisely in one sentence."
                    .into(),
                default_model: "llama3.2".into(),
                default_max_turns: 1,
                ..ReactConfig::default()
            },
        );

        let input = OperatorInput::new(
            Content::text("What is the capital of France?"),
            TriggerType::User,
        );
        let output = op.execute(input).await.unwrap();

        let text = output.message.as_text().unwrap_or_default().to_lowercase();
        println!("  response: {text}");
        assert!(text.contains("paris"), "expected 'paris' in: {text}");
    }
}
