//! Model session: one configured conversation with a language model.
//!
//! A [`ModelSession`] pins the model, system prompt and token and time budget
//! and turns a transcript plus one new input into a single [`ModelTurn`].
//! Both the chat tool loop and the match analysts speak to the model
//! through it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::message::{
    ChatMessage, ChatRequest, ChatResponse, system_message, tool_message, user_message,
};
use super::provider::LlmProvider;
use super::tool::{ToolDefinition, ToolInvocationRequest};
use crate::error::AgentError;

/// New input that advances the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionInput {
    /// A user chat message.
    UserMessage(String),
    /// The flattened result of the pending tool call.
    ToolResult {
        /// Call ID the result answers.
        call_id: String,
        /// Tool that produced it.
        name: String,
        /// Flattened result text.
        content: String,
    },
}

impl SessionInput {
    /// Converts the input into the transcript message that carries it.
    #[must_use]
    pub fn to_message(&self) -> ChatMessage {
        match self {
            Self::UserMessage(text) => user_message(text),
            Self::ToolResult {
                call_id,
                name,
                content,
            } => tool_message(call_id, name, content),
        }
    }
}

/// What the model produced for one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelTurn {
    /// Final text for the user.
    FinalAnswer(String),
    /// The model wants one tool run before it continues.
    ToolRequest(ToolInvocationRequest),
}

/// A configured model conversation.
#[derive(Clone)]
pub struct ModelSession {
    provider: Arc<dyn LlmProvider>,
    model: String,
    system_prompt: String,
    max_tokens: u32,
    timeout: Duration,
}

impl std::fmt::Debug for ModelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSession")
            .field("provider", &self.provider.name())
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ModelSession {
    /// Creates a session with the given limits; sampling temperature is
    /// left to the backend default.
    #[must_use]
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        system_prompt: impl Into<String>,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            system_prompt: system_prompt.into(),
            max_tokens,
            timeout,
        }
    }

    /// Sends `transcript` followed by `input` and interprets the reply.
    ///
    /// When the model asks for several tools at once only the first is
    /// kept; the loop allows one pending request at a time.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Timeout`] when the call exceeds the session
    /// budget, [`AgentError::MalformedResponse`] when the reply has neither
    /// text nor a tool call, and propagates provider errors.
    pub async fn respond(
        &self,
        transcript: &[ChatMessage],
        input: &SessionInput,
        tools: &[ToolDefinition],
    ) -> Result<ModelTurn, AgentError> {
        let mut messages = Vec::with_capacity(transcript.len() + 2);
        messages.push(system_message(&self.system_prompt));
        messages.extend_from_slice(transcript);
        messages.push(input.to_message());

        let response = self.complete(messages, tools.to_vec()).await?;
        Self::interpret(response)
    }

    /// Runs one tool-less completion and returns the raw response.
    ///
    /// # Errors
    ///
    /// Same as [`ModelSession::respond`], minus the response checks.
    pub async fn complete_once(&self, user_msg: &str) -> Result<ChatResponse, AgentError> {
        let messages = vec![system_message(&self.system_prompt), user_message(user_msg)];
        self.complete(messages, Vec::new()).await
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        tools: Vec<ToolDefinition>,
    ) -> Result<ChatResponse, AgentError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            temperature: None,
            max_tokens: Some(self.max_tokens),
            tools,
        };

        debug!(
            provider = self.provider.name(),
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "sending model request"
        );

        tokio::time::timeout(self.timeout, self.provider.chat(&request))
            .await
            .map_err(|_| AgentError::Timeout {
                operation: format!("model '{}'", self.model),
                seconds: self.timeout.as_secs(),
            })?
    }

    fn interpret(response: ChatResponse) -> Result<ModelTurn, AgentError> {
        let mut calls = response.tool_calls.into_iter();
        if let Some(first) = calls.next() {
            let dropped = calls.count();
            if dropped > 0 {
                warn!(
                    tool = %first.name,
                    dropped,
                    "model requested several tools at once, keeping the first"
                );
            }
            return Ok(ModelTurn::ToolRequest(first.into()));
        }

        if response.content.trim().is_empty() {
            return Err(AgentError::MalformedResponse {
                message: format!(
                    "model returned neither text nor a tool call (finish_reason={})",
                    response.finish_reason.as_deref().unwrap_or("none")
                ),
            });
        }

        Ok(ModelTurn::FinalAnswer(response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::Role;
    use crate::agent::testing::{ScriptedProvider, Step};

    fn session(provider: ScriptedProvider) -> ModelSession {
        ModelSession::new(
            Arc::new(provider),
            "test-model",
            "You are a test agent.",
            256,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_final_answer() {
        let provider = ScriptedProvider::new(vec![Step::text("Radiant won.")]);
        let turn = session(provider)
            .respond(&[], &SessionInput::UserMessage("who won?".to_string()), &[])
            .await;
        assert!(matches!(turn, Ok(ModelTurn::FinalAnswer(ref t)) if t == "Radiant won."));
    }

    #[tokio::test]
    async fn test_keeps_first_of_several_tool_calls() {
        let provider = ScriptedProvider::new(vec![Step::tools(&[
            ("get_player_info", r#"{"name":"a"}"#),
            ("get_hero_stats", "{}"),
        ])]);
        let turn = session(provider)
            .respond(&[], &SessionInput::UserMessage("q".to_string()), &[])
            .await;
        match turn {
            Ok(ModelTurn::ToolRequest(req)) => {
                assert_eq!(req.tool_name, "get_player_info");
                assert_eq!(req.arguments, r#"{"name":"a"}"#);
            }
            other => unreachable!("unexpected turn: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_response_is_malformed() {
        let provider = ScriptedProvider::new(vec![Step::text("   ")]);
        let turn = session(provider)
            .respond(&[], &SessionInput::UserMessage("q".to_string()), &[])
            .await;
        assert!(matches!(turn, Err(AgentError::MalformedResponse { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let provider = ScriptedProvider::new(vec![Step::Delay(Duration::from_secs(60))]);
        let turn = session(provider)
            .respond(&[], &SessionInput::UserMessage("q".to_string()), &[])
            .await;
        assert!(matches!(turn, Err(AgentError::Timeout { seconds: 5, .. })));
    }

    #[tokio::test]
    async fn test_request_layout() {
        let provider = Arc::new(ScriptedProvider::new(vec![Step::text("ok")]));
        let session = ModelSession::new(
            Arc::clone(&provider) as Arc<dyn LlmProvider>,
            "m",
            "sys",
            64,
            Duration::from_secs(5),
        );
        let transcript = vec![user_message("earlier"), system_message("ignored role")];
        let input = SessionInput::ToolResult {
            call_id: "c1".to_string(),
            name: "get_heroes".to_string(),
            content: "[]".to_string(),
        };
        let _ = session.respond(&transcript, &input, &[]).await;

        let seen = provider.requests();
        assert_eq!(seen.len(), 1);
        let roles: Vec<Role> = seen[0].messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::System, Role::User, Role::System, Role::Tool]);
        assert_eq!(seen[0].messages[3].name.as_deref(), Some("get_heroes"));
        assert_eq!(seen[0].model, "m");
    }

    #[tokio::test]
    async fn test_request_leaves_temperature_to_backend() {
        let provider = Arc::new(ScriptedProvider::new(vec![Step::text("ok")]));
        let session = ModelSession::new(
            Arc::clone(&provider) as Arc<dyn LlmProvider>,
            "m",
            "sys",
            64,
            Duration::from_secs(5),
        );
        let _ = session
            .respond(&[], &SessionInput::UserMessage("hi".to_string()), &[])
            .await;

        let seen = provider.requests();
        assert_eq!(seen[0].temperature, None);
        assert_eq!(seen[0].max_tokens, Some(64));
    }
}
