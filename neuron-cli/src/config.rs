//! YAML shapes accepted by `--agent` and `--run-conf` (§6 external interfaces).

use serde::Deserialize;
use std::path::Path;

use crate::error::CliError;

/// Which concrete LLM provider backs an agent. Mirrors `LLM_PROVIDER` (§6).
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI-compatible chat completions API.
    Openai,
    /// Local Ollama server.
    Ollama,
}

/// The `--agent <yaml>` document: enough to build one `SingleShotOperator`.
///
/// Every field is optional so the document can defer to the `LLM_*`
/// environment variables (§6); `resolve` applies that fallback.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AgentFile {
    /// Name this agent is registered and dispatched to under.
    #[serde(default = "default_agent_name")]
    pub name: String,
    /// Which provider backend to use. Falls back to `LLM_PROVIDER`.
    pub provider: Option<ProviderKind>,
    /// Model identifier. Falls back to `LLM_MODEL_NAME`.
    pub model: Option<String>,
    /// Provider base URL override. Falls back to `LLM_BASE_URL`.
    pub base_url: Option<String>,
    /// System prompt for the agent.
    #[serde(default)]
    pub system_prompt: String,
    /// Maximum output tokens per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature. Falls back to `LLM_TEMPERATURE`.
    pub temperature: Option<f64>,
}

fn default_agent_name() -> String {
    "agent".into()
}

fn default_max_tokens() -> u32 {
    4096
}

impl AgentFile {
    /// Parse an `--agent <yaml>` file from disk.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CliError::InvalidConfig(format!("reading {}: {e}", path.display())))?;
        serde_yaml::from_str(&raw)
            .map_err(|e| CliError::InvalidConfig(format!("parsing {}: {e}", path.display())))
    }
}

/// The `--run-conf <yaml>` document: maps onto [`neuron_task::TaskConf`] and
/// [`neuron_task::RunConf`] (§4.8, §4.9, §6).
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RunConfFile {
    /// Upper bound on agent-loop steps for this task.
    pub max_steps: Option<u32>,
    /// Consecutive identical handoffs allowed before raising `endless_loop`.
    pub endless_threshold: Option<u32>,
    /// Wall-clock budget for the whole task, in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Extra time given to an in-flight step to wind down after timeout.
    pub grace_ms: Option<u64>,
    /// Which execution engine runs the task.
    #[serde(default)]
    pub engine: EngineKind,
}

/// Mirrors [`neuron_task::Engine`] as a YAML-friendly enum.
#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Run on the current process's event loop.
    #[default]
    Local,
    /// Run on a dedicated loop from a reusable worker pool.
    Pool,
    /// Dispatch to a remote runtime over RPC.
    Distributed,
}

impl RunConfFile {
    /// Parse a `--run-conf <yaml>` file from disk, if one was given.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CliError::InvalidConfig(format!("reading {}: {e}", path.display())))?;
        serde_yaml::from_str(&raw)
            .map_err(|e| CliError::InvalidConfig(format!("parsing {}: {e}", path.display())))
    }

    /// Apply this file's overrides onto a default [`neuron_task::TaskConf`].
    pub fn apply(&self, conf: &mut neuron_task::TaskConf) {
        if let Some(max_steps) = self.max_steps {
            conf.max_steps = max_steps;
        }
        if let Some(endless_threshold) = self.endless_threshold {
            conf.endless_threshold = endless_threshold;
        }
        if self.timeout_ms.is_some() {
            conf.timeout_ms = self.timeout_ms;
        }
        if let Some(grace_ms) = self.grace_ms {
            conf.grace_ms = grace_ms;
        }
    }

    /// The engine this run should use.
    pub fn engine(&self) -> neuron_task::Engine {
        match self.engine {
            EngineKind::Local => neuron_task::Engine::Local,
            EngineKind::Pool => neuron_task::Engine::Pool,
            EngineKind::Distributed => neuron_task::Engine::Distributed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn agent_file_defaults_when_fields_omitted() {
        let file = write_yaml("system_prompt: hello\n");
        let agent = AgentFile::load(file.path()).unwrap();
        assert_eq!(agent.name, "agent");
        assert_eq!(agent.max_tokens, 4096);
        assert!(agent.provider.is_none());
        assert!(agent.model.is_none());
    }

    #[test]
    fn agent_file_parses_explicit_fields() {
        let file = write_yaml(
            "name: researcher\nprovider: openai\nmodel: gpt-4o\nmax_tokens: 2048\ntemperature: 0.2\n",
        );
        let agent = AgentFile::load(file.path()).unwrap();
        assert_eq!(agent.name, "researcher");
        assert_eq!(agent.provider, Some(ProviderKind::Openai));
        assert_eq!(agent.model.as_deref(), Some("gpt-4o"));
        assert_eq!(agent.max_tokens, 2048);
        assert_eq!(agent.temperature, Some(0.2));
    }

    #[test]
    fn agent_file_rejects_unparsable_yaml() {
        let file = write_yaml("not: [valid\n");
        assert!(AgentFile::load(file.path()).is_err());
    }

    #[test]
    fn agent_file_missing_path_is_invalid_config() {
        let err = AgentFile::load(Path::new("/nonexistent/agent.yaml")).unwrap_err();
        assert!(matches!(err, CliError::InvalidConfig(_)));
    }

    #[test]
    fn run_conf_file_overrides_only_set_fields() {
        let file = write_yaml("max_steps: 10\ntimeout_ms: 5000\n");
        let run_conf = RunConfFile::load(file.path()).unwrap();
        let mut conf = neuron_task::TaskConf::default();
        run_conf.apply(&mut conf);
        assert_eq!(conf.max_steps, 10);
        assert_eq!(conf.timeout_ms, Some(5000));
        assert_eq!(conf.endless_threshold, 3, "untouched field keeps its default");
    }

    #[test]
    fn run_conf_file_engine_defaults_to_local() {
        let run_conf = RunConfFile::default();
        assert_eq!(run_conf.engine(), neuron_task::Engine::Local);
    }

    #[test]
    fn run_conf_file_engine_parses_pool() {
        let file = write_yaml("engine: pool\n");
        let run_conf = RunConfFile::load(file.path()).unwrap();
        assert_eq!(run_conf.engine(), neuron_task::Engine::Pool);
    }
}
