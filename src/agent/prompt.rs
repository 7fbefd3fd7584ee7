//! System prompts and template builders for agents.
//!
//! The chat assistant and each match analyst are defined by a system
//! prompt. Prompts can be overridden with markdown files in a prompt
//! directory; any file that is missing falls back to the compiled-in text.

use std::path::{Path, PathBuf};

use serde_json::Value;

/// System prompt for the tool-using chat assistant.
pub const CHAT_SYSTEM_PROMPT: &str = r"You are a Dota 2 assistant with access to player, match, and hero statistics from the OpenDota API through tools.

## Rules

- When the user asks about any player, hero, match, item, or statistic, call the matching tool first.
- Do not ask for more details before trying a tool with what the user already gave you. Tools accept fuzzy names and player-name searches.
- A player name means calling `get_player_info` with that name right away.
- Only ask for clarification when a tool call has failed.

## Process

1. The user asks about something: call the relevant tool.
2. The tool returns data: analyze it and present it clearly.
3. The tool fails: explain what went wrong and ask for what you need.
";

/// System prompt for the match overview analyst.
pub const OVERVIEW_SYSTEM_PROMPT: &str = r"You are a Dota 2 match overview analyst. You write a complete overview of one match.

From the match metadata and objectives, cover:
1. Winner and how the game was won
2. Duration and game mode
3. Kill score breakdown
4. First blood timing and context
5. Objective timeline (towers, barracks, Roshan) with timestamps
6. Tempo: was the game decided early, mid, or late
7. The moments that defined the match

Write 8-12 sentences in clear paragraphs. Be specific with timestamps and numbers.
";

/// System prompt for the teamfight analyst.
pub const TEAMFIGHTS_SYSTEM_PROMPT: &str = r"You are a Dota 2 teamfight analyst. You find the fights that changed the game.

From the teamfight data, cover:
1. Total number of teamfights
2. The 3-5 fights with the biggest impact on the result
3. For each of those fights:
   - Timestamp and location (from death positions)
   - Who initiated, key deaths, abilities used
   - Gold and XP swing
   - Impact on the match (High/Medium/Low) with reasoning
4. Teamfight win rate per team
5. The most impactful teamfight player

Write 15-20 sentences with one section per critical fight. Name the heroes involved and use MM:SS timestamps.
";

/// System prompt for the player performance analyst.
pub const PLAYERS_SYSTEM_PROMPT: &str = r"You are a Dota 2 player performance analyst. You assess every player in one match.

From the player data, cover:
1. The MVP candidate(s) and why
2. For each of the 10 players:
   - Hero and player name
   - KDA
   - Benchmark highlights (above the 80th percentile or below the 30th)
   - Key contributions (hero damage, tower damage, healing when significant)
   - Item build and timings
   - Rating: Exceptional, Good, Average, or Below Average
3. Standout performances and underperformers
4. Radiant versus Dire as teams

Write 25-35 sentences, 2-3 per player plus the MVP section. Group by team, Radiant first. Quote numbers and percentiles.
";

/// Analysis request sent to the overview analyst.
pub const OVERVIEW_ANALYSIS_PROMPT: &str =
    "Analyze this Dota 2 match and give a complete overview: winner, duration, objective timeline and the critical moments.";

/// Analysis request sent to the teamfight analyst.
pub const TEAMFIGHTS_ANALYSIS_PROMPT: &str =
    "Analyze the teamfights in this match. Pick the 3-5 fights that decided the game and explain for each what happened, the gold/XP swing and its impact.";

/// Analysis request sent to the player analyst.
pub const PLAYERS_ANALYSIS_PROMPT: &str =
    "Analyze each player's performance in detail. Name the MVP, assess all 10 players and call out exceptional performances and underperformers.";

/// Default prompt directory relative to the user's home.
const DEFAULT_PROMPT_DIR: &str = ".config/dota-agent/prompts";

const CHAT_FILENAME: &str = "chat.md";
const OVERVIEW_FILENAME: &str = "overview.md";
const TEAMFIGHTS_FILENAME: &str = "teamfights.md";
const PLAYERS_FILENAME: &str = "players.md";

/// A set of system prompts for all agents.
///
/// Loaded from external template files when available, falling back to
/// compiled-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSet {
    /// System prompt for the chat assistant.
    pub chat: String,
    /// System prompt for the overview analyst.
    pub overview: String,
    /// System prompt for the teamfight analyst.
    pub teamfights: String,
    /// System prompt for the player analyst.
    pub players: String,
}

impl PromptSet {
    /// Loads prompts from the given directory, falling back to compiled-in defaults.
    ///
    /// Without an explicit directory, `~/.config/dota-agent/prompts/` is
    /// tried. Each file is loaded independently; a missing or empty file
    /// uses its default.
    #[must_use]
    pub fn load(prompt_dir: Option<&Path>) -> Self {
        let resolved_dir = prompt_dir.map(PathBuf::from).or_else(Self::default_dir);

        let load_file = |filename: &str, default: &str| -> String {
            resolved_dir
                .as_ref()
                .map(|dir| dir.join(filename))
                .and_then(|path| std::fs::read_to_string(path).ok())
                .filter(|text| !text.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            chat: load_file(CHAT_FILENAME, CHAT_SYSTEM_PROMPT),
            overview: load_file(OVERVIEW_FILENAME, OVERVIEW_SYSTEM_PROMPT),
            teamfights: load_file(TEAMFIGHTS_FILENAME, TEAMFIGHTS_SYSTEM_PROMPT),
            players: load_file(PLAYERS_FILENAME, PLAYERS_SYSTEM_PROMPT),
        }
    }

    /// Returns compiled-in defaults without checking the filesystem.
    #[must_use]
    pub fn defaults() -> Self {
        Self {
            chat: CHAT_SYSTEM_PROMPT.to_string(),
            overview: OVERVIEW_SYSTEM_PROMPT.to_string(),
            teamfights: TEAMFIGHTS_SYSTEM_PROMPT.to_string(),
            players: PLAYERS_SYSTEM_PROMPT.to_string(),
        }
    }

    /// Writes the compiled-in default prompts to the given directory.
    ///
    /// Creates the directory if it does not exist. Existing files are
    /// **not** overwritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if directory creation or file writing fails.
    pub fn write_defaults(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;

        let templates = [
            (CHAT_FILENAME, CHAT_SYSTEM_PROMPT),
            (OVERVIEW_FILENAME, OVERVIEW_SYSTEM_PROMPT),
            (TEAMFIGHTS_FILENAME, TEAMFIGHTS_SYSTEM_PROMPT),
            (PLAYERS_FILENAME, PLAYERS_SYSTEM_PROMPT),
        ];

        let mut written = Vec::new();
        for (filename, content) in &templates {
            let path = dir.join(filename);
            if !path.exists() {
                std::fs::write(&path, content)?;
                written.push(path);
            }
        }

        Ok(written)
    }

    /// Returns the default prompt directory under the user's home.
    ///
    /// Returns `None` if the home directory cannot be determined.
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(DEFAULT_PROMPT_DIR))
    }
}

/// Builds the analyst user message: the request followed by the slice as
/// pretty-printed JSON.
#[must_use]
pub fn build_analysis_prompt(prompt: &str, data: &Value) -> String {
    let data_json = serde_json::to_string_pretty(data).unwrap_or_else(|_| data.to_string());
    format!("{prompt}\n\nData to analyze:\n{data_json}")
}
