//! Provider registry and factory.
//!
//! Maps provider names to concrete [`LlmProvider`] implementations.

use std::sync::Arc;

use crate::agent::config::AgentConfig;
use crate::agent::provider::LlmProvider;
use crate::agent::providers::OpenAiProvider;
use crate::error::AgentError;

/// Gemini's `OpenAI`-compatible endpoint.
pub const GEMINI_OPENAI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai/";

/// Creates an [`LlmProvider`] based on the configured provider name.
///
/// # Supported Providers
///
/// - `"gemini"` (default): Gemini through its `OpenAI`-compatible API
/// - `"openai"`: `OpenAI` or any compatible API via `base_url`
///
/// # Errors
///
/// Returns [`AgentError::UnsupportedProvider`] for unknown provider names.
pub fn create_provider(config: &AgentConfig) -> Result<Arc<dyn LlmProvider>, AgentError> {
    match config.provider.to_ascii_lowercase().as_str() {
        "gemini" => Ok(Arc::new(OpenAiProvider::with_base(
            config,
            "gemini",
            Some(GEMINI_OPENAI_BASE_URL),
        ))),
        "openai" => Ok(Arc::new(OpenAiProvider::new(config))),
        _ => Err(AgentError::UnsupportedProvider {
            name: config.provider.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn config(provider: &str) -> AgentConfig {
        AgentConfig::builder()
            .api_key("test")
            .provider(provider)
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    #[test_case("gemini", "gemini")]
    #[test_case("Gemini", "gemini")]
    #[test_case("openai", "openai")]
    fn test_create_provider(configured: &str, expected: &str) {
        let provider = create_provider(&config(configured));
        assert_eq!(provider.map(|p| p.name()).ok(), Some(expected));
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider(&config("anthropic-local"));
        assert!(matches!(
            result,
            Err(AgentError::UnsupportedProvider { ref name }) if name == "anthropic-local"
        ));
    }
}
