//! Single-shot match analyst.
//!
//! A [`SubAgent`] reads one data slice and writes one section of the
//! report. It never fails: every error is folded into an error-status
//! [`AgentResult`].

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::config::AgentConfig;
use super::dataset::AgentDefinition;
use super::prompt::build_analysis_prompt;
use super::provider::LlmProvider;
use super::report::AgentResult;
use super::session::ModelSession;
use crate::error::AgentError;

/// Analyst with a fixed system instruction.
#[derive(Debug, Clone)]
pub struct SubAgent {
    name: String,
    session: ModelSession,
}

impl SubAgent {
    /// Creates an analyst over an existing session.
    #[must_use]
    pub fn new(name: impl Into<String>, session: ModelSession) -> Self {
        Self {
            name: name.into(),
            session,
        }
    }

    /// Creates the analyst described by `definition` using the analysis
    /// model and limits from `config`.
    #[must_use]
    pub fn from_definition(
        definition: &AgentDefinition,
        provider: Arc<dyn LlmProvider>,
        config: &AgentConfig,
    ) -> Self {
        let session = ModelSession::new(
            provider,
            config.analysis_model.clone(),
            definition.system_instruction.clone(),
            config.analysis_max_tokens,
            config.timeout,
        );
        Self::new(definition.name.clone(), session)
    }

    /// Analyst display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Analyzes `data` with one tool-less completion.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AnalysisFailed`] naming this agent when the
    /// model call fails or the reply is empty.
    pub async fn try_analyze(&self, data: &Value, prompt: &str) -> Result<String, AgentError> {
        debug!(agent = %self.name, "starting analysis");
        let user_msg = build_analysis_prompt(prompt, data);

        let message = match self.session.complete_once(&user_msg).await {
            Ok(response) if !response.content.trim().is_empty() => return Ok(response.content),
            Ok(response) => format!(
                "empty response (finish_reason={})",
                response.finish_reason.as_deref().unwrap_or("none")
            ),
            Err(e) => e.to_string(),
        };
        Err(AgentError::AnalysisFailed {
            agent: self.name.clone(),
            message,
        })
    }

    /// Like [`try_analyze`](Self::try_analyze), but a failure becomes an
    /// error-status [`AgentResult`].
    pub async fn analyze(&self, data: &Value, prompt: &str) -> AgentResult {
        match self.try_analyze(data, prompt).await {
            Ok(content) => {
                debug!(agent = %self.name, chars = content.len(), "analysis complete");
                AgentResult::success(self.name.clone(), content)
            }
            Err(AgentError::AnalysisFailed { message, .. }) => {
                warn!(agent = %self.name, error = %message, "analyst failed");
                AgentResult::failure(self.name.clone(), message)
            }
            Err(other) => {
                warn!(agent = %self.name, error = %other, "analyst failed");
                AgentResult::failure(self.name.clone(), other.to_string())
            }
        }
    }
}
