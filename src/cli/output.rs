//! Output formatting for CLI commands.

#![allow(clippy::format_push_string)]

use serde::Serialize;
use std::fmt::Write as _;

use crate::agent::report::{AgentStatus, AnalysisReport};
use crate::agent::tool::ToolDefinition;

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

impl OutputFormat {
    /// Parses a format name; anything unrecognized means text.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    /// Serializes `value` as pretty JSON with a trailing newline.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization failed: {e}\"}}\n"))
    }
}

/// Renders the tool catalog as an aligned list.
#[must_use]
pub fn format_tool_list(tools: &[ToolDefinition]) -> String {
    if tools.is_empty() {
        return "The tool server exposes no tools.\n".to_string();
    }

    let width = tools.iter().map(|t| t.name.len()).max().unwrap_or(0);
    let mut output = format!("{} tool(s) available:\n\n", tools.len());
    for tool in tools {
        let summary = tool.description.lines().next().unwrap_or("").trim();
        let _ = writeln!(output, "  {:<width$}  {summary}", tool.name);
    }
    output
}

/// Renders an analysis report for reading in a terminal.
#[must_use]
pub fn format_report(report: &AnalysisReport) -> String {
    let mut output = String::new();

    let id = report
        .match_id
        .as_ref()
        .map_or_else(|| "unknown".to_string(), ToString::to_string);
    output.push_str(&format!("Match {id}\n"));

    let meta = &report.metadata;
    let score = match (meta.radiant_score, meta.dire_score) {
        (Some(r), Some(d)) => format!(" | Score: {r}-{d}"),
        _ => String::new(),
    };
    output.push_str(&format!(
        "Winner: {} | Duration: {}{score}\n",
        meta.winner, meta.duration
    ));

    for section in report.sections.values() {
        let marker = match section.status {
            AgentStatus::Success => "",
            AgentStatus::Error => " [failed]",
        };
        output.push_str(&format!("\n## {}{marker}\n\n", section.title));
        output.push_str(section.content.trim_end());
        output.push('\n');
    }

    output.push_str(&format!(
        "\n---\nAgents: {} ({} failed) | Time: {:.1}s | Generated: {}\n",
        report.agents_used,
        report.failed_sections(),
        report.processing_time_ms / 1000.0,
        report.analysis_timestamp.to_rfc3339()
    ));
    output
}
