//! Tool-using chat assistant.
//!
//! Binds a chat [`ModelSession`] to a [`ToolProvider`] and the catalog it
//! advertised at connect time, and answers one message at a time through
//! the [`ToolCallLoop`].

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use super::agentic_loop::{ChatOutcome, ToolCallLoop};
use super::config::AgentConfig;
use super::message::ConversationTurn;
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::session::ModelSession;
use super::tool::{ToolDefinition, to_model_tools};
use super::toolbox::ToolProvider;
use crate::error::AgentError;

/// Chat front end over a model and a tool backend.
pub struct Assistant {
    session: ModelSession,
    tools: Arc<dyn ToolProvider>,
    catalog: Vec<ToolDefinition>,
    max_tool_iterations: usize,
    tool_timeout: Duration,
}

impl Assistant {
    /// Lists the backend's tools once and builds the chat session.
    ///
    /// # Errors
    ///
    /// Propagates the tool provider's listing failure, and returns
    /// [`AgentError::ProviderUnavailable`] when listing exceeds
    /// [`AgentConfig::tool_timeout`].
    pub async fn connect(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolProvider>,
        config: &AgentConfig,
        prompts: &PromptSet,
    ) -> Result<Self, AgentError> {
        let specs = tokio::time::timeout(config.tool_timeout, tools.list_tools())
            .await
            .map_err(|_| AgentError::ProviderUnavailable {
                message: format!(
                    "{} did not list its tools within {}s",
                    tools.name(),
                    config.tool_timeout.as_secs()
                ),
            })??;
        let catalog = to_model_tools(&specs);
        info!(backend = tools.name(), tools = catalog.len(), "tool catalog loaded");

        let session = ModelSession::new(
            provider,
            config.chat_model.clone(),
            prompts.chat.clone(),
            config.chat_max_tokens,
            config.timeout,
        );

        Ok(Self {
            session,
            tools,
            catalog,
            max_tool_iterations: config.max_tool_iterations,
            tool_timeout: config.tool_timeout,
        })
    }

    /// Tools offered to the model.
    #[must_use]
    pub fn catalog(&self) -> &[ToolDefinition] {
        &self.catalog
    }

    /// Answers `message`, returning the reply and the extended history.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolLoopExceeded`] or a model failure; tool
    /// failures are handled inside the loop.
    pub async fn chat(
        &self,
        message: &str,
        history: Vec<ConversationTurn>,
    ) -> Result<ChatOutcome, AgentError> {
        ToolCallLoop::new(&self.session, self.max_tool_iterations, self.tool_timeout)
            .run(history, message, &self.catalog, self.tools.as_ref())
            .await
    }
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("session", &self.session)
            .field("tools", &self.tools.name())
            .field("catalog", &self.catalog.len())
            .finish_non_exhaustive()
    }
}
