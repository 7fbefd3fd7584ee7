//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::AgentError;

/// Default model provider.
const DEFAULT_PROVIDER: &str = "gemini";
/// Default model for both chat and analysis.
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
/// Default chat max tokens.
const DEFAULT_CHAT_MAX_TOKENS: u32 = 4096;
/// Default analyst max tokens. The player analyst writes 25-35 sentences.
const DEFAULT_ANALYSIS_MAX_TOKENS: u32 = 8192;
/// Default maximum tool-calling loop iterations.
const DEFAULT_MAX_TOOL_ITERATIONS: usize = 10;
/// Default maximum concurrent analyst calls.
const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Default model request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default tool call timeout in seconds.
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 30;

/// Configuration for the agent system.
#[derive(Clone)]
pub struct AgentConfig {
    /// LLM provider name (`"gemini"` or `"openai"`).
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used by the chat tool loop.
    pub chat_model: String,
    /// Model used by the match analysts.
    pub analysis_model: String,
    /// Maximum tokens for chat responses.
    pub chat_max_tokens: u32,
    /// Maximum tokens for analyst responses.
    pub analysis_max_tokens: u32,
    /// Maximum tool-calling loop iterations before aborting.
    pub max_tool_iterations: usize,
    /// Maximum analysts running at once.
    pub max_concurrency: usize,
    /// Budget for a single model call.
    pub timeout: Duration,
    /// Budget for a single tool call.
    pub tool_timeout: Duration,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing
    /// files.
    pub prompt_dir: Option<PathBuf>,
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("analysis_model", &self.analysis_model)
            .field("max_tool_iterations", &self.max_tool_iterations)
            .field("max_concurrency", &self.max_concurrency)
            .field("timeout", &self.timeout)
            .field("tool_timeout", &self.tool_timeout)
            .field("prompt_dir", &self.prompt_dir)
            .finish_non_exhaustive()
    }
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    chat_model: Option<String>,
    analysis_model: Option<String>,
    chat_max_tokens: Option<u32>,
    analysis_max_tokens: Option<u32>,
    max_tool_iterations: Option<usize>,
    max_concurrency: Option<usize>,
    timeout: Option<Duration>,
    tool_timeout: Option<Duration>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|k| lookup(k));
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        if self.provider.is_none() {
            self.provider = first(&["DOTA_AGENT_PROVIDER"]);
        }
        if self.api_key.is_none() {
            self.api_key = first(&["GEMINI_API_KEY", "OPENAI_API_KEY", "DOTA_AGENT_API_KEY"]);
        }
        if self.base_url.is_none() {
            self.base_url = first(&["DOTA_AGENT_BASE_URL", "OPENAI_BASE_URL"]);
        }
        if self.chat_model.is_none() {
            self.chat_model = first(&["DOTA_AGENT_CHAT_MODEL"]);
        }
        if self.analysis_model.is_none() {
            self.analysis_model = first(&["DOTA_AGENT_ANALYSIS_MODEL"]);
        }
        if self.max_tool_iterations.is_none() {
            self.max_tool_iterations = parsed("DOTA_AGENT_MAX_TOOL_ITERATIONS")
                .and_then(|n| usize::try_from(n).ok());
        }
        if self.max_concurrency.is_none() {
            self.max_concurrency =
                parsed("DOTA_AGENT_MAX_CONCURRENCY").and_then(|n| usize::try_from(n).ok());
        }
        if self.timeout.is_none() {
            self.timeout = parsed("DOTA_AGENT_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.tool_timeout.is_none() {
            self.tool_timeout = parsed("DOTA_AGENT_TOOL_TIMEOUT_SECS").map(Duration::from_secs);
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = first(&["DOTA_AGENT_PROMPT_DIR"]).map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the chat model.
    #[must_use]
    pub fn chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = Some(model.into());
        self
    }

    /// Sets the analyst model.
    #[must_use]
    pub fn analysis_model(mut self, model: impl Into<String>) -> Self {
        self.analysis_model = Some(model.into());
        self
    }

    /// Sets the chat max tokens.
    #[must_use]
    pub const fn chat_max_tokens(mut self, n: u32) -> Self {
        self.chat_max_tokens = Some(n);
        self
    }

    /// Sets the analyst max tokens.
    #[must_use]
    pub const fn analysis_max_tokens(mut self, n: u32) -> Self {
        self.analysis_max_tokens = Some(n);
        self
    }

    /// Sets the maximum tool-calling loop iterations.
    #[must_use]
    pub const fn max_tool_iterations(mut self, n: usize) -> Self {
        self.max_tool_iterations = Some(n);
        self
    }

    /// Sets the maximum concurrency.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Sets the model request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the tool call timeout.
    #[must_use]
    pub const fn tool_timeout(mut self, duration: Duration) -> Self {
        self.tool_timeout = Some(duration);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set and
    /// [`AgentError::InvalidConfig`] for a zero iteration bound or zero
    /// concurrency. Concurrency is capped at [`Semaphore::MAX_PERMITS`].
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        let max_tool_iterations = self
            .max_tool_iterations
            .unwrap_or(DEFAULT_MAX_TOOL_ITERATIONS);
        if max_tool_iterations == 0 {
            return Err(AgentError::InvalidConfig {
                message: "max_tool_iterations must be at least 1".to_string(),
            });
        }

        let max_concurrency = self.max_concurrency.unwrap_or(DEFAULT_MAX_CONCURRENCY);
        if max_concurrency == 0 {
            return Err(AgentError::InvalidConfig {
                message: "max_concurrency must be at least 1".to_string(),
            });
        }
        let max_concurrency = max_concurrency.min(Semaphore::MAX_PERMITS);

        Ok(AgentConfig {
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            api_key,
            base_url: self.base_url,
            chat_model: self
                .chat_model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            analysis_model: self
                .analysis_model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            chat_max_tokens: self.chat_max_tokens.unwrap_or(DEFAULT_CHAT_MAX_TOKENS),
            analysis_max_tokens: self
                .analysis_max_tokens
                .unwrap_or(DEFAULT_ANALYSIS_MAX_TOKENS),
            max_tool_iterations,
            max_concurrency,
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            tool_timeout: self
                .tool_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS)),
            prompt_dir: self.prompt_dir,
        })
    }
}
