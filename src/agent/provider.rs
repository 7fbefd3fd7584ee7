//! Model backend trait.
//!
//! The chat loop and the match analysts speak [`ChatRequest`] and
//! [`ChatResponse`]; a backend turns those into vendor SDK calls.

use async_trait::async_trait;

use super::message::{ChatRequest, ChatResponse};
use crate::error::AgentError;

/// A chat-completion backend shared by every session.
///
/// Implementations hold only an immutable client, so one instance behind
/// an `Arc` serves concurrent analysts. Callers own time budgets.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Backend name used in logs (`"gemini"`, `"openai"`).
    fn name(&self) -> &'static str;

    /// Sends one completion request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiRequest`] when the API rejects the call and
    /// [`AgentError::ProviderUnavailable`] when it cannot be reached.
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError>;
}
