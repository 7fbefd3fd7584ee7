//! Orchestrator for fan-out/collect match analysis.
//!
//! Splits one match record into per-analyst slices, runs every analyst
//! concurrently, waits for all of them and merges their sections into one
//! [`AnalysisReport`].

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use serde_json::Value;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::config::AgentConfig;
use super::dataset::{AgentDefinition, default_match_agents, match_metadata};
use super::prompt::PromptSet;
use super::provider::LlmProvider;
use super::report::{AgentResult, AnalysisReport, ReportMetadata, ReportSection, round_millis};
use super::subagent::SubAgent;
use crate::error::AgentError;

/// Runs analyst fan-outs over match datasets.
pub struct Orchestrator {
    provider: Arc<dyn LlmProvider>,
    config: AgentConfig,
    prompts: PromptSet,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given provider and configuration.
    ///
    /// Loads prompt templates from the directory specified in
    /// [`AgentConfig::prompt_dir`], falling back to compiled-in defaults.
    pub fn new(provider: Arc<dyn LlmProvider>, config: AgentConfig) -> Self {
        let prompts = PromptSet::load(config.prompt_dir.as_deref());
        Self::with_prompts(provider, config, prompts)
    }

    /// Creates an orchestrator with an explicit prompt set.
    #[must_use]
    pub fn with_prompts(
        provider: Arc<dyn LlmProvider>,
        config: AgentConfig,
        prompts: PromptSet,
    ) -> Self {
        Self {
            provider,
            config,
            prompts,
        }
    }

    /// Runs the three standard match analysts over `dataset`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] if `dataset` is not a JSON
    /// object.
    pub async fn analyze_match(&self, dataset: &Value) -> Result<AnalysisReport, AgentError> {
        let definitions = default_match_agents(&self.prompts);
        self.analyze_dataset(dataset, &definitions).await
    }

    /// Runs one analyst per definition and assembles the report.
    ///
    /// Analyst failures never fail the call; they show up as error-status
    /// sections. Dropping the returned future aborts every analyst still
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Orchestration`] if `dataset` is not a JSON
    /// object.
    pub async fn analyze_dataset(
        &self,
        dataset: &Value,
        definitions: &[AgentDefinition],
    ) -> Result<AnalysisReport, AgentError> {
        if !dataset.is_object() {
            return Err(AgentError::Orchestration {
                message: "match data must be a JSON object".to_string(),
            });
        }

        let match_id = match_metadata(dataset)
            .get("match_id")
            .or_else(|| dataset.get("match_id"))
            .filter(|id| !id.is_null())
            .cloned();
        info!(
            match_id = %match_id.as_ref().map_or_else(|| "unknown".to_string(), serde_json::Value::to_string),
            agents = definitions.len(),
            "starting multi-agent analysis"
        );

        let start = Instant::now();
        let results = self.fan_out(dataset, definitions).await;
        let elapsed = start.elapsed();

        let mut sections = IndexMap::with_capacity(definitions.len());
        for (definition, result) in definitions.iter().zip(results) {
            sections.insert(
                definition.section_key.clone(),
                ReportSection::new(definition.title.clone(), result),
            );
        }

        let report = AnalysisReport {
            match_id,
            analysis_timestamp: Utc::now(),
            processing_time_ms: round_millis(elapsed),
            agents_used: definitions.len(),
            sections,
            metadata: ReportMetadata::from_dataset(dataset),
        };

        info!(
            processing_time_ms = report.processing_time_ms,
            failed = report.failed_sections(),
            "multi-agent analysis completed"
        );
        Ok(report)
    }

    /// Spawns one task per analyst and collects results in definition order.
    async fn fan_out(&self, dataset: &Value, definitions: &[AgentDefinition]) -> Vec<AgentResult> {
        let permits = self.config.max_concurrency.clamp(1, Semaphore::MAX_PERMITS);
        let semaphore = Arc::new(Semaphore::new(permits));
        let mut tasks = JoinSet::new();
        let mut index_of = HashMap::with_capacity(definitions.len());

        for (index, definition) in definitions.iter().enumerate() {
            let slice = definition.slice(dataset);
            let agent =
                SubAgent::from_definition(definition, Arc::clone(&self.provider), &self.config);
            let prompt = definition.analysis_prompt.clone();
            let sem = Arc::clone(&semaphore);

            let handle = tasks.spawn(async move {
                match sem.acquire_owned().await {
                    Ok(_permit) => agent.analyze(&slice.data, &prompt).await,
                    Err(e) => AgentResult::failure(agent.name(), format!("semaphore closed: {e}")),
                }
            });
            index_of.insert(handle.id(), index);
        }

        let mut results: Vec<Option<AgentResult>> = vec![None; definitions.len()];
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, result)) => {
                    if let Some(&index) = index_of.get(&id) {
                        debug!(agent = %result.agent, status = ?result.status, "analyst finished");
                        results[index] = Some(result);
                    }
                }
                Err(e) => {
                    if let Some(&index) = index_of.get(&e.id()) {
                        warn!(agent = %definitions[index].name, error = %e, "analyst task failed");
                        results[index] = Some(AgentResult::failure(
                            definitions[index].name.clone(),
                            format!("task join failed: {e}"),
                        ));
                    }
                }
            }
        }

        results
            .into_iter()
            .zip(definitions)
            .map(|(result, definition)| {
                result.unwrap_or_else(|| {
                    AgentResult::failure(definition.name.clone(), "analyst produced no result")
                })
            })
            .collect()
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("analysis_model", &self.config.analysis_model)
            .field("max_concurrency", &self.config.max_concurrency)
            .finish_non_exhaustive()
    }
}
