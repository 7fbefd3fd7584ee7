//! `OpenAI`-compatible provider implementation using the `async-openai` crate.
//!
//! Serves both `OpenAI` itself and Gemini through its `OpenAI`-compatible
//! endpoint; the base URL in [`AgentConfig`] selects the backend.

use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessage,
    ChatCompletionRequestAssistantMessageContent, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessage, ChatCompletionRequestSystemMessageContent,
    ChatCompletionRequestToolMessage, ChatCompletionRequestToolMessageContent,
    ChatCompletionRequestUserMessage, ChatCompletionRequestUserMessageContent, ChatCompletionTool,
    ChatCompletionToolType, CreateChatCompletionRequest, FunctionCall, FunctionObject,
};
use async_trait::async_trait;

use crate::agent::config::AgentConfig;
use crate::agent::message::{ChatMessage, ChatRequest, ChatResponse, Role, TokenUsage};
use crate::agent::provider::LlmProvider;
use crate::agent::tool::ToolCall;
use crate::error::AgentError;

/// `OpenAI`-compatible LLM provider.
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    name: &'static str,
    legacy_max_tokens: bool,
}

impl OpenAiProvider {
    /// Creates a provider for the `OpenAI` API (or `config.base_url`).
    #[must_use]
    pub fn new(config: &AgentConfig) -> Self {
        Self::with_base(config, "openai", None)
    }

    /// Creates a provider named `name`, using `default_base` when the
    /// configuration has no base URL override.
    ///
    /// Non-`openai` backends receive `max_tokens` instead of
    /// `max_completion_tokens`.
    #[must_use]
    pub fn with_base(config: &AgentConfig, name: &'static str, default_base: Option<&str>) -> Self {
        let mut openai_config = OpenAIConfig::new().with_api_key(&config.api_key);

        if let Some(base_url) = config.base_url.as_deref().or(default_base) {
            openai_config = openai_config.with_api_base(base_url.trim_end_matches('/'));
        }

        Self {
            client: Client::with_config(openai_config),
            name,
            legacy_max_tokens: name != "openai",
        }
    }

    /// Converts our message type to the `OpenAI` SDK type.
    fn convert_message(msg: &ChatMessage) -> ChatCompletionRequestMessage {
        match msg.role {
            Role::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            Role::User => ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                name: None,
            }),
            Role::Assistant => {
                let tool_calls = (!msg.tool_calls.is_empty()).then(|| {
                    msg.tool_calls
                        .iter()
                        .map(|tc| ChatCompletionMessageToolCall {
                            id: tc.id.clone(),
                            r#type: ChatCompletionToolType::Function,
                            function: FunctionCall {
                                name: tc.name.clone(),
                                arguments: tc.arguments.clone(),
                            },
                        })
                        .collect()
                });

                let content = (!msg.content.is_empty()).then(|| {
                    ChatCompletionRequestAssistantMessageContent::Text(msg.content.clone())
                });

                #[allow(deprecated)]
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content,
                    name: None,
                    tool_calls,
                    refusal: None,
                    audio: None,
                    function_call: None,
                })
            }
            Role::Tool => ChatCompletionRequestMessage::Tool(ChatCompletionRequestToolMessage {
                content: ChatCompletionRequestToolMessageContent::Text(msg.content.clone()),
                tool_call_id: msg.tool_call_id.clone().unwrap_or_default(),
            }),
        }
    }

    /// Builds an `OpenAI` chat completion request from our generic request.
    #[allow(deprecated)]
    fn build_request(&self, request: &ChatRequest) -> CreateChatCompletionRequest {
        let messages: Vec<_> = request.messages.iter().map(Self::convert_message).collect();

        let tools = (!request.tools.is_empty()).then(|| {
            request
                .tools
                .iter()
                .map(|td| ChatCompletionTool {
                    r#type: ChatCompletionToolType::Function,
                    function: FunctionObject {
                        name: td.name.clone(),
                        description: Some(td.description.clone()),
                        parameters: Some(td.parameters.clone()),
                        strict: None,
                    },
                })
                .collect()
        });

        let (max_tokens, max_completion_tokens) = if self.legacy_max_tokens {
            (request.max_tokens, None)
        } else {
            (None, request.max_tokens)
        };

        CreateChatCompletionRequest {
            model: request.model.clone(),
            messages,
            temperature: request.temperature.filter(|&t| t != 0.0),
            max_tokens,
            max_completion_tokens,
            tools,
            ..Default::default()
        }
    }

    fn map_error(err: OpenAIError) -> AgentError {
        match err {
            OpenAIError::Reqwest(e) => AgentError::ProviderUnavailable {
                message: e.to_string(),
            },
            other => AgentError::ApiRequest {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("client", &"<async-openai::Client>")
            .finish()
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        let openai_request = self.build_request(request);

        let response = self
            .client
            .chat()
            .create(openai_request)
            .await
            .map_err(Self::map_error)?;

        let choice = response.choices.first();

        let content = choice
            .and_then(|c| c.message.content.as_ref())
            .cloned()
            .unwrap_or_default();

        let tool_calls = choice
            .and_then(|c| c.message.tool_calls.as_ref())
            .map(|tcs| {
                tcs.iter()
                    .map(|tc| ToolCall {
                        id: tc.id.clone(),
                        name: tc.function.name.clone(),
                        arguments: tc.function.arguments.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let finish_reason = choice.and_then(|c| {
            c.finish_reason
                .as_ref()
                .map(|fr| format!("{fr:?}").to_lowercase())
        });

        let usage = response
            .usage
            .map_or_else(TokenUsage::default, |u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            });

        Ok(ChatResponse {
            content,
            usage,
            tool_calls,
            finish_reason,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::agent::message;
    use crate::agent::tool::ToolDefinition;

    fn provider(name: &'static str) -> OpenAiProvider {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        OpenAiProvider::with_base(&config, name, Some("http://localhost:1/v1/"))
    }

    fn request(tools: Vec<ToolDefinition>) -> ChatRequest {
        ChatRequest {
            model: "gemini-2.5-flash".to_string(),
            messages: vec![message::user_message("test")],
            temperature: Some(0.0),
            max_tokens: Some(100),
            tools,
        }
    }

    #[test]
    fn test_convert_system_message() {
        let msg = message::system_message("test");
        let converted = OpenAiProvider::convert_message(&msg);
        assert!(matches!(converted, ChatCompletionRequestMessage::System(_)));
    }

    #[test]
    fn test_convert_tool_message() {
        let msg = message::tool_message("call_123", "get_player_info", "result data");
        let converted = OpenAiProvider::convert_message(&msg);
        if let ChatCompletionRequestMessage::Tool(t) = converted {
            assert_eq!(t.tool_call_id, "call_123");
        } else {
            panic!("Expected Tool message");
        }
    }

    #[test]
    fn test_convert_assistant_with_tool_calls() {
        let msg = message::assistant_tool_calls_message(vec![ToolCall {
            id: "call_1".to_string(),
            name: "get_match_details".to_string(),
            arguments: r#"{"match_id":1}"#.to_string(),
        }]);
        let converted = OpenAiProvider::convert_message(&msg);
        if let ChatCompletionRequestMessage::Assistant(a) = converted {
            assert_eq!(a.tool_calls.as_ref().map_or(0, Vec::len), 1);
            assert!(a.content.is_none());
        } else {
            panic!("Expected Assistant message");
        }
    }

    #[test]
    #[allow(deprecated)]
    fn test_build_request_token_field_per_backend() {
        let gemini = provider("gemini").build_request(&request(Vec::new()));
        assert_eq!(gemini.max_tokens, Some(100));
        assert!(gemini.max_completion_tokens.is_none());
        assert!(gemini.temperature.is_none());

        let openai = provider("openai").build_request(&request(Vec::new()));
        assert_eq!(openai.max_completion_tokens, Some(100));
        assert!(openai.max_tokens.is_none());
        assert!(openai.tools.is_none());
    }

    #[test]
    fn test_build_request_with_tools() {
        let built = provider("gemini").build_request(&request(vec![ToolDefinition {
            name: "get_hero_stats".to_string(),
            description: "Hero statistics".to_string(),
            parameters: serde_json::json!({"type": "object", "properties": {}}),
        }]));
        assert_eq!(built.tools.as_ref().map_or(0, Vec::len), 1);
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(provider("gemini").name(), "gemini");
    }
}
