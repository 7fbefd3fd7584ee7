//! Agentic tool-calling loop.
//!
//! Drives the model ↔ tool round-trip for one chat message: ask the model,
//! run the single tool it requests, feed the flattened result back, and
//! repeat until it answers in text or the iteration bound is hit.

use std::time::Duration;

use tracing::{debug, warn};

use super::message::{
    ChatMessage, ConversationTurn, append_exchange, assistant_tool_calls_message,
};
use super::session::{ModelSession, ModelTurn, SessionInput};
use super::tool::{ToolDefinition, ToolInvocationRequest, ToolOutcome, flatten_outcome};
use super::toolbox::ToolProvider;
use crate::error::AgentError;

/// Result of one completed chat exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    /// The model's final answer.
    pub response: String,
    /// Input history plus the new user and assistant turns.
    pub history: Vec<ConversationTurn>,
    /// Number of tool calls made on the way.
    pub tool_calls: usize,
}

enum LoopState {
    AwaitingModel(SessionInput),
    AwaitingTool(ToolInvocationRequest),
    Done(String),
}

/// Bounded model ↔ tool loop over a [`ModelSession`].
///
/// Holds no conversation state between runs.
#[derive(Debug)]
pub struct ToolCallLoop<'a> {
    session: &'a ModelSession,
    max_iterations: usize,
    tool_timeout: Duration,
}

impl<'a> ToolCallLoop<'a> {
    /// Creates a loop allowing at most `max_iterations` tool calls.
    #[must_use]
    pub const fn new(
        session: &'a ModelSession,
        max_iterations: usize,
        tool_timeout: Duration,
    ) -> Self {
        Self {
            session,
            max_iterations,
            tool_timeout,
        }
    }

    /// Answers `user_message` in the context of `history`.
    ///
    /// Tool failures, timeouts and bad arguments never end the loop; they
    /// are reported to the model as error results.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ToolLoopExceeded`] when the model still wants
    /// a tool after `max_iterations` calls, and propagates model failures.
    pub async fn run(
        &self,
        history: Vec<ConversationTurn>,
        user_message: &str,
        tools: &[ToolDefinition],
        provider: &dyn ToolProvider,
    ) -> Result<ChatOutcome, AgentError> {
        let mut transcript: Vec<ChatMessage> =
            history.iter().map(ConversationTurn::to_message).collect();
        let mut state =
            LoopState::AwaitingModel(SessionInput::UserMessage(user_message.to_string()));
        let mut iterations = 0usize;

        loop {
            state = match state {
                LoopState::AwaitingModel(input) => {
                    let turn = self.session.respond(&transcript, &input, tools).await?;
                    transcript.push(input.to_message());
                    match turn {
                        ModelTurn::FinalAnswer(text) => LoopState::Done(text),
                        ModelTurn::ToolRequest(request) => {
                            if iterations >= self.max_iterations {
                                warn!(
                                    max_iterations = self.max_iterations,
                                    tool = %request.tool_name,
                                    "tool loop bound reached"
                                );
                                return Err(AgentError::ToolLoopExceeded {
                                    max_iterations: self.max_iterations,
                                });
                            }
                            iterations += 1;
                            transcript.push(assistant_tool_calls_message(vec![request.to_call()]));
                            LoopState::AwaitingTool(request)
                        }
                    }
                }
                LoopState::AwaitingTool(request) => {
                    let outcome = self.dispatch(&request, provider).await;
                    debug!(
                        iteration = iterations,
                        tool = %request.tool_name,
                        call_id = %request.call_id,
                        is_error = outcome.is_error,
                        "tool execution complete"
                    );
                    LoopState::AwaitingModel(SessionInput::ToolResult {
                        content: flatten_outcome(&outcome),
                        call_id: request.call_id,
                        name: request.tool_name,
                    })
                }
                LoopState::Done(text) => {
                    debug!(tool_calls = iterations, "tool loop completed with final text response");
                    return Ok(ChatOutcome {
                        history: append_exchange(history, user_message, &text),
                        response: text,
                        tool_calls: iterations,
                    });
                }
            };
        }
    }

    async fn dispatch(
        &self,
        request: &ToolInvocationRequest,
        provider: &dyn ToolProvider,
    ) -> ToolOutcome {
        let result = match request.parse_arguments() {
            Ok(arguments) => tokio::time::timeout(
                self.tool_timeout,
                provider.invoke(&request.tool_name, arguments),
            )
            .await
            .unwrap_or_else(|_| {
                Err(AgentError::Timeout {
                    operation: format!("tool '{}'", request.tool_name),
                    seconds: self.tool_timeout.as_secs(),
                })
            }),
            Err(e) => Err(e),
        };

        result.unwrap_or_else(|err| {
            warn!(tool = %request.tool_name, error = %err, "tool call failed");
            ToolOutcome::from_failure(&err)
        })
    }
}
