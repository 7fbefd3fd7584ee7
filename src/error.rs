//! Error types for dota-agent.
//!
//! [`AgentError`] covers everything that can go wrong while talking to the
//! model or the tool backend. Failures local to one tool call or one
//! sub-agent are converted into data by the caller; only the variants that
//! reach [`Error`] surface as request failures.

use thiserror::Error;

/// Result alias used by the CLI layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by CLI commands.
#[derive(Debug, Error)]
pub enum Error {
    /// Agent, model, or tool-provider failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Command-level failure (bad input, output formatting).
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Filesystem or stdio failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by CLI command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not run to completion.
    #[error("{0}")]
    ExecutionFailed(String),

    /// User-supplied input was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Rendering the command output failed.
    #[error("output error: {0}")]
    OutputFormat(String),
}

/// Errors from the agent system.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key was configured.
    #[error(
        "no API key configured: set GEMINI_API_KEY, OPENAI_API_KEY or DOTA_AGENT_API_KEY"
    )]
    ApiKeyMissing,

    /// The configured model provider name is unknown.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// A configuration value could not be used.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// What was wrong.
        message: String,
    },

    /// The model API rejected or failed the request.
    #[error("model API request failed: {message}")]
    ApiRequest {
        /// Provider error text.
        message: String,
        /// HTTP status, when the provider reported one.
        status: Option<u16>,
    },

    /// A model or tool call exceeded its time budget.
    #[error("{operation} timed out after {seconds}s")]
    Timeout {
        /// Which call timed out.
        operation: String,
        /// Budget that was exceeded.
        seconds: u64,
    },

    /// The tool or model backend could not be reached.
    #[error("provider unavailable: {message}")]
    ProviderUnavailable {
        /// Connection failure detail.
        message: String,
    },

    /// A single tool call failed.
    #[error("tool '{name}' failed: {message}")]
    ToolInvocation {
        /// Tool name.
        name: String,
        /// Failure detail.
        message: String,
    },

    /// The model kept requesting tools past the iteration bound.
    #[error("tool loop exceeded {max_iterations} iterations without a final answer")]
    ToolLoopExceeded {
        /// Configured bound.
        max_iterations: usize,
    },

    /// A sub-agent analysis failed.
    #[error("{agent} failed: {message}")]
    AnalysisFailed {
        /// Agent display name.
        agent: String,
        /// Failure detail.
        message: String,
    },

    /// The model or tool returned something we cannot interpret.
    #[error("malformed upstream response: {message}")]
    MalformedResponse {
        /// What was unexpected.
        message: String,
    },

    /// Orchestration-level failure (task join, invalid dataset).
    #[error("orchestration error: {message}")]
    Orchestration {
        /// Failure detail.
        message: String,
    },
}

impl AgentError {
    /// Returns `true` for errors that the chat caller should see as a
    /// service-unavailable condition rather than a bad request.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::ProviderUnavailable { .. } | Self::ApiRequest { .. } | Self::Timeout { .. }
        )
    }
}
