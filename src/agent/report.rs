//! Data types for analyst results and the merged match report.

use std::time::Duration;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dataset::match_metadata;

/// Prefix of every failed analyst's content.
pub const ANALYSIS_FAILED_PREFIX: &str = "Analysis failed: ";

/// Outcome of one analyst run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// The analyst produced text.
    Success,
    /// The analyst failed; content holds the diagnostic.
    Error,
}

/// What one analyst returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentResult {
    /// Analyst display name.
    pub agent: String,
    /// Analysis text, or the failure diagnostic.
    pub content: String,
    /// Whether the analysis succeeded.
    pub status: AgentStatus,
}

impl AgentResult {
    /// Successful result.
    #[must_use]
    pub fn success(agent: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            content: content.into(),
            status: AgentStatus::Success,
        }
    }

    /// Failed result; `message` is prefixed with `"Analysis failed: "`.
    #[must_use]
    pub fn failure(agent: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self {
            agent: agent.into(),
            content: format!("{ANALYSIS_FAILED_PREFIX}{message}"),
            status: AgentStatus::Error,
        }
    }

    /// Returns `true` if the analysis succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Success
    }
}

/// One titled section of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSection {
    /// Human-readable section title.
    pub title: String,
    /// Analyst that wrote it.
    pub agent: String,
    /// Section text.
    pub content: String,
    /// Analyst outcome.
    pub status: AgentStatus,
}

impl ReportSection {
    /// Builds a section from an analyst result.
    #[must_use]
    pub fn new(title: impl Into<String>, result: AgentResult) -> Self {
        Self {
            title: title.into(),
            agent: result.agent,
            content: result.content,
            status: result.status,
        }
    }
}

/// Headline facts derived from the dataset itself, never from analysts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// `"Radiant"` or `"Dire"`.
    pub winner: String,
    /// Match length as `M:SS`.
    pub duration: String,
    /// Radiant kills, when known.
    pub radiant_score: Option<i64>,
    /// Dire kills, when known.
    pub dire_score: Option<i64>,
}

impl ReportMetadata {
    /// Reads winner, duration and scores from a match record.
    ///
    /// A missing `radiant_win` counts as a Dire win and a missing or
    /// non-integer duration as zero.
    #[must_use]
    pub fn from_dataset(dataset: &Value) -> Self {
        let meta = match_metadata(dataset);
        let radiant_win = meta
            .get("radiant_win")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let seconds = meta.get("duration").and_then(Value::as_u64).unwrap_or(0);

        Self {
            winner: if radiant_win { "Radiant" } else { "Dire" }.to_string(),
            duration: format_duration(seconds),
            radiant_score: meta.get("radiant_score").and_then(Value::as_i64),
            dire_score: meta.get("dire_score").and_then(Value::as_i64),
        }
    }
}

/// The merged multi-analyst report for one match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Match identifier from the dataset, if it had one.
    pub match_id: Option<Value>,
    /// When the report was assembled.
    pub analysis_timestamp: DateTime<Utc>,
    /// Wall-clock time from dispatch to fan-in, rounded to 0.01 ms.
    pub processing_time_ms: f64,
    /// Number of analysts that ran.
    pub agents_used: usize,
    /// Sections in analyst definition order.
    pub sections: IndexMap<String, ReportSection>,
    /// Facts derived from the dataset.
    pub metadata: ReportMetadata,
}

impl AnalysisReport {
    /// Number of sections whose analyst failed.
    #[must_use]
    pub fn failed_sections(&self) -> usize {
        self.sections
            .values()
            .filter(|s| s.status == AgentStatus::Error)
            .count()
    }
}

/// Formats seconds as `M:SS` (minutes unpadded).
#[must_use]
pub fn format_duration(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Milliseconds with two decimals.
#[must_use]
pub fn round_millis(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 100_000.0).round() / 100.0
}
