//! `neuron` — the minimal runner CLI described in spec §6.
//!
//! Loads an `--agent <yaml>` document, submits `--input` to it as a single
//! task, and prints the result. Deliberately thin: one agent, one task,
//! `SingleShotOperator` only — multi-agent swarms, tool registries, and
//! hook pipelines are the library's job, not this binary's. See
//! `neuron-op-react` + `neuron-orch-kit` for a fuller wiring.

use clap::Parser;
use layer0::content::Content;
use layer0::id::{AgentId, SessionId};
use layer0::operator::Operator;
use neuron_cli::config::{AgentFile, ProviderKind, RunConfFile};
use neuron_cli::error::{CliError, exit_code};
use neuron_op_single_shot::{SingleShotConfig, SingleShotOperator};
use neuron_task::{RunConf, SwarmRunner, Task, TaskConf, TaskScheduler};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Submit one input to one agent and print the resulting task response.
#[derive(Debug, Parser)]
#[command(name = "neuron", version, about)]
struct Cli {
    /// Path to an agent definition (YAML).
    #[arg(long)]
    agent: PathBuf,

    /// Input text, or `@path` to read it from a file.
    #[arg(long)]
    input: String,

    /// Print every intermediate message on the event bus as it's published,
    /// not just the final task response.
    #[arg(long)]
    streaming: bool,

    /// Path to a run configuration (YAML) overriding task defaults.
    #[arg(long = "run-conf")]
    run_conf: Option<PathBuf>,
}

fn main() {
    #[cfg(unix)]
    reset_sigpipe();

    init_tracing();

    let cli = Cli::parse();
    let code = match run(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "invalid config");
            eprintln!("neuron: {e}");
            exit_code::INVALID_CONFIG
        }
    };
    std::process::exit(code);
}

#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match std::env::var("AWORLD_LOG_PATH") {
        Ok(dir) if !dir.is_empty() => {
            let appender = tracing_appender::rolling::daily(&dir, "neuron.log");
            // Leak the guard: the process lives exactly as long as the one
            // task this binary runs, so there is no later point to flush at.
            let (writer, guard) = tracing_appender::non_blocking(appender);
            std::mem::forget(guard);
            builder.with_writer(writer).with_ansi(false).init();
        }
        _ => {
            builder.init();
        }
    }
}

fn run(cli: Cli) -> Result<i32, CliError> {
    let agent = AgentFile::load(&cli.agent)?;
    let run_conf_file = match &cli.run_conf {
        Some(path) => RunConfFile::load(path)?,
        None => RunConfFile::default(),
    };
    let input = resolve_input(&cli.input)?;

    let operator = build_operator(&agent);

    let agent_id = AgentId::new(agent.name.clone());
    tracing::info!(agent = %agent_id, provider = ?agent.provider, "starting task");
    let mut orch = neuron_orch_local::LocalOrch::new();
    orch.register(agent_id.clone(), operator);

    let runner = Arc::new(SwarmRunner::new(
        Arc::new(orch),
        Arc::new(neuron_hooks::HookRegistry::new()),
        neuron_bus::EventBus::new(),
    ));
    let scheduler = TaskScheduler::new(runner);

    let mut task = Task::single(
        neuron_ids::new_task_id(),
        SessionId::new(neuron_ids::new_opaque_id()),
        agent_id,
        Content::text(input),
    );
    task.conf = apply_run_conf(TaskConf::default(), &run_conf_file);
    let run_conf = RunConf {
        engine: run_conf_file.engine(),
    };

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to start the tokio runtime");

    if cli.streaming {
        rt.block_on(run_streaming(&scheduler, task, run_conf))
    } else {
        let response = rt.block_on(scheduler.run_task(task, run_conf));
        print_response(&response)
    }
}

fn apply_run_conf(mut conf: TaskConf, file: &RunConfFile) -> TaskConf {
    file.apply(&mut conf);
    conf
}

async fn run_streaming(
    scheduler: &TaskScheduler,
    task: Task,
    _run_conf: RunConf,
) -> Result<i32, CliError> {
    let mut stream = scheduler.streaming_run_task(task).await;
    let mut code = exit_code::FAILURE;

    while let Some(message) = stream.recv().await {
        println!("{}", serde_json::to_string(&message).unwrap_or_default());
        if message.is_task_response() {
            code = response_exit_code(&message.payload);
        }
    }

    Ok(code)
}

fn print_response(response: &neuron_task::TaskResponse) -> Result<i32, CliError> {
    println!("{}", serde_json::to_string(response).unwrap_or_default());
    Ok(exit_code_for(response.success, &response.msg))
}

fn response_exit_code(payload: &serde_json::Value) -> i32 {
    let success = payload
        .get("success")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    let msg = payload
        .get("msg")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("");
    exit_code_for(success, msg)
}

fn exit_code_for(success: bool, msg: &str) -> i32 {
    if success {
        exit_code::SUCCESS
    } else if msg == "timeout" {
        exit_code::TIMEOUT
    } else {
        exit_code::FAILURE
    }
}

/// Build the `SingleShotOperator` named by `agent.provider`, falling back to
/// the `LLM_*` environment variables (§6) for any field the document omits.
fn build_operator(agent: &AgentFile) -> Arc<dyn Operator> {
    let provider_kind = agent.provider.unwrap_or_else(default_provider_kind);
    let model = agent
        .model
        .clone()
        .or_else(|| std::env::var("LLM_MODEL_NAME").ok())
        .unwrap_or_default();
    let base_url = agent
        .base_url
        .clone()
        .or_else(|| std::env::var("LLM_BASE_URL").ok());
    let temperature = agent
        .temperature
        .or_else(|| std::env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()));
    let api_key = std::env::var("LLM_API_KEY").unwrap_or_default();

    let config = SingleShotConfig {
        system_prompt: agent.system_prompt.clone(),
        default_model: model,
        default_max_tokens: agent.max_tokens,
        default_temperature: temperature,
    };

    match provider_kind {
        ProviderKind::Anthropic => {
            let mut provider = neuron_provider_anthropic::AnthropicProvider::new(api_key);
            if let Some(url) = base_url {
                provider = provider.with_url(url);
            }
            wrap(provider, config)
        }
        ProviderKind::Openai => {
            let mut provider = neuron_provider_openai::OpenAIProvider::new(api_key);
            if let Some(url) = base_url {
                provider = provider.with_url(url);
            }
            wrap(provider, config)
        }
        ProviderKind::Ollama => {
            let mut provider = neuron_provider_ollama::OllamaProvider::new();
            if let Some(url) = base_url {
                provider = provider.with_url(url);
            }
            wrap(provider, config)
        }
    }
}

fn default_provider_kind() -> ProviderKind {
    match std::env::var("LLM_PROVIDER").as_deref() {
        Ok("openai") => ProviderKind::Openai,
        Ok("ollama") => ProviderKind::Ollama,
        _ => ProviderKind::Anthropic,
    }
}

fn wrap<P>(provider: P, config: SingleShotConfig) -> Arc<dyn Operator>
where
    P: neuron_turn::Provider + Send + Sync + 'static,
{
    Arc::new(SingleShotOperator::new(provider, config))
}

/// Resolve `--input`: a literal string, or `@path` read from disk. A `@path`
/// read is confined to `AWORLD_WORKSPACE` (§6: comma-separated allowed
/// directories for file sandboxes) when that variable is set.
fn resolve_input(raw: &str) -> Result<String, CliError> {
    let Some(path) = raw.strip_prefix('@') else {
        return Ok(raw.to_string());
    };
    let path = Path::new(path);

    if let Ok(workspace) = std::env::var("AWORLD_WORKSPACE") {
        let allowed = workspace.split(',').map(str::trim).filter(|s| !s.is_empty());
        let canonical = path
            .canonicalize()
            .map_err(|e| CliError::InputUnreadable(e.to_string()))?;
        let in_workspace = allowed.map(Path::new).any(|dir| {
            dir.canonicalize()
                .map(|dir| canonical.starts_with(dir))
                .unwrap_or(false)
        });
        if !in_workspace {
            return Err(CliError::InputOutsideWorkspace(path.display().to_string()));
        }
    }

    std::fs::read_to_string(path).map_err(|e| CliError::InputUnreadable(e.to_string()))
}
