//! Provider-agnostic message types for LLM communication.
//!
//! [`ConversationTurn`] is the caller-owned chat history (user and
//! assistant text only). [`ChatMessage`] is the richer transcript the tool
//! loop builds while it runs, including tool calls and tool results.

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolDefinition};

/// Role of a chat message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions.
    System,
    /// User input.
    User,
    /// Assistant response.
    Assistant,
    /// Tool result.
    Tool,
}

/// Speaker of a [`ConversationTurn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The human asking questions.
    User,
    /// The model's final answers.
    Assistant,
}

/// One entry of the caller-owned conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Who said it.
    pub role: TurnRole,
    /// What was said.
    pub content: String,
}

impl ConversationTurn {
    /// Creates a user turn.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant turn.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
        }
    }

    /// Converts the turn into a transcript message.
    #[must_use]
    pub fn to_message(&self) -> ChatMessage {
        match self.role {
            TurnRole::User => user_message(&self.content),
            TurnRole::Assistant => assistant_message(&self.content),
        }
    }
}

/// Returns `history` extended with one exchange, oldest first.
#[must_use]
pub fn append_exchange(
    mut history: Vec<ConversationTurn>,
    user: &str,
    assistant: &str,
) -> Vec<ConversationTurn> {
    history.reserve(2);
    history.push(ConversationTurn::user(user));
    history.push(ConversationTurn::assistant(assistant));
    history
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Message content.
    pub content: String,
    /// Tool calls requested by the assistant (only for `Role::Assistant`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Tool call ID this message responds to (only for `Role::Tool`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Function name this message responds to (only for `Role::Tool`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A chat completion request (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Model identifier (e.g., "gemini-2.5-flash").
    pub model: String,
    /// Ordered conversation messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature (0.0–2.0).
    pub temperature: Option<f32>,
    /// Maximum tokens to generate.
    pub max_tokens: Option<u32>,
    /// Tool definitions available to the model.
    pub tools: Vec<ToolDefinition>,
}

/// Token usage statistics from a completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
    /// Total tokens used.
    pub total_tokens: u32,
}

/// A chat completion response (provider-agnostic).
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// Generated text content.
    pub content: String,
    /// Token usage statistics.
    pub usage: TokenUsage,
    /// Tool calls requested by the model.
    pub tool_calls: Vec<ToolCall>,
    /// Finish reason from the model (e.g., `"stop"`, `"tool_calls"`).
    pub finish_reason: Option<String>,
}

const fn message(role: Role, content: String) -> ChatMessage {
    ChatMessage {
        role,
        content,
        tool_calls: Vec::new(),
        tool_call_id: None,
        name: None,
    }
}

/// Creates a system message.
#[must_use]
pub fn system_message(content: &str) -> ChatMessage {
    message(Role::System, content.to_string())
}

/// Creates a user message.
#[must_use]
pub fn user_message(content: &str) -> ChatMessage {
    message(Role::User, content.to_string())
}

/// Creates an assistant text message.
#[must_use]
pub fn assistant_message(content: &str) -> ChatMessage {
    message(Role::Assistant, content.to_string())
}

/// Creates an assistant message with tool calls (no text content).
#[must_use]
pub const fn assistant_tool_calls_message(tool_calls: Vec<ToolCall>) -> ChatMessage {
    ChatMessage {
        role: Role::Assistant,
        content: String::new(),
        tool_calls,
        tool_call_id: None,
        name: None,
    }
}

/// Creates a tool result message for the named function.
#[must_use]
pub fn tool_message(tool_call_id: &str, name: &str, content: &str) -> ChatMessage {
    ChatMessage {
        role: Role::Tool,
        content: content.to_string(),
        tool_calls: Vec::new(),
        tool_call_id: Some(tool_call_id.to_string()),
        name: Some(name.to_string()),
    }
}
