//! Match dataset slicing and the default analyst roster.
//!
//! Each analyst sees only the slice its selector extracts from the match
//! record. Selectors are pure and fill absent fields with empty values so
//! every analyst always gets a well-formed object.

use serde_json::{Value, json};

use super::prompt::{
    OVERVIEW_ANALYSIS_PROMPT, PLAYERS_ANALYSIS_PROMPT, PromptSet, TEAMFIGHTS_ANALYSIS_PROMPT,
};

/// Pure function extracting an analyst's view of the dataset.
pub type SliceSelector = fn(&Value) -> Value;

/// A named view of the dataset handed to one analyst.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSlice {
    /// Section key the slice belongs to.
    pub name: String,
    /// The extracted data.
    pub data: Value,
}

/// One analyst in a fan-out: where its output goes and what it reads.
#[derive(Debug, Clone)]
pub struct AgentDefinition {
    /// Key of the report section (e.g., `"overview"`).
    pub section_key: String,
    /// Section title shown to users.
    pub title: String,
    /// Analyst display name.
    pub name: String,
    /// System prompt of the analyst.
    pub system_instruction: String,
    /// Analysis request placed before the data.
    pub analysis_prompt: String,
    /// Extracts the analyst's slice.
    pub selector: SliceSelector,
}

impl AgentDefinition {
    /// Applies the selector to `dataset`.
    #[must_use]
    pub fn slice(&self, dataset: &Value) -> DataSlice {
        DataSlice {
            name: self.section_key.clone(),
            data: (self.selector)(dataset),
        }
    }
}

/// Returns the object holding match-level facts: `metadata` when it is an
/// object, otherwise the record itself.
#[must_use]
pub fn match_metadata(dataset: &Value) -> &Value {
    dataset
        .get("metadata")
        .filter(|m| m.is_object())
        .unwrap_or(dataset)
}

fn field_or(value: &Value, key: &str, default: Value) -> Value {
    value.get(key).cloned().unwrap_or(default)
}

/// Overview slice: metadata, objectives and chat.
#[must_use]
pub fn overview_slice(dataset: &Value) -> Value {
    json!({
        "metadata": field_or(dataset, "metadata", json!({})),
        "objectives": field_or(dataset, "objectives", json!([])),
        "chat": field_or(dataset, "chat", json!([])),
    })
}

/// Teamfight slice: fight summary and match length.
#[must_use]
pub fn teamfights_slice(dataset: &Value) -> Value {
    json!({
        "teamfights_summary": field_or(dataset, "teamfights_summary", json!({})),
        "match_duration": field_or(match_metadata(dataset), "duration", json!(0)),
    })
}

/// Player slice: per-player summary plus duration and result.
#[must_use]
pub fn players_slice(dataset: &Value) -> Value {
    let meta = match_metadata(dataset);
    json!({
        "players_summary": field_or(dataset, "players_summary", json!({})),
        "match_metadata": {
            "duration": field_or(meta, "duration", json!(0)),
            "radiant_win": field_or(meta, "radiant_win", json!(false)),
        },
    })
}

/// The three standard match analysts, in report order.
#[must_use]
pub fn default_match_agents(prompts: &PromptSet) -> Vec<AgentDefinition> {
    let define = |key: &str,
                  title: &str,
                  name: &str,
                  system: &str,
                  prompt: &str,
                  selector: SliceSelector| AgentDefinition {
        section_key: key.to_string(),
        title: title.to_string(),
        name: name.to_string(),
        system_instruction: system.to_string(),
        analysis_prompt: prompt.to_string(),
        selector,
    };

    vec![
        define(
            "overview",
            "Match Overview",
            "Match Overview Agent",
            &prompts.overview,
            OVERVIEW_ANALYSIS_PROMPT,
            overview_slice,
        ),
        define(
            "teamfights",
            "Teamfight Analysis",
            "Teamfight Analysis Agent",
            &prompts.teamfights,
            TEAMFIGHTS_ANALYSIS_PROMPT,
            teamfights_slice,
        ),
        define(
            "players",
            "Player Performance",
            "Player Performance Agent",
            &prompts.players,
            PLAYERS_ANALYSIS_PROMPT,
            players_slice,
        ),
    ]
}
