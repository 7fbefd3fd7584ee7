//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::agent::config::DEFAULT_TOOL_TIMEOUT_SECS;
use crate::error::AgentError;
use crate::mcp::ToolServerConfig;

/// dota-agent: Dota 2 assistant backed by MCP data tools.
///
/// Answers questions by letting a language model call Dota 2 data tools,
/// and produces multi-analyst reports for single matches.
#[derive(Parser, Debug)]
#[command(name = "dota-agent")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output (info-level logs on stderr).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// Tool server connection.
    #[command(flatten)]
    pub server: ServerArgs,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Where to find the MCP tool server.
#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Command that starts an MCP tool server on stdio.
    #[arg(long, env = "DOTA_AGENT_MCP_COMMAND", global = true)]
    pub mcp_command: Option<String>,

    /// Argument for `--mcp-command` (repeatable).
    #[arg(
        long = "mcp-arg",
        env = "DOTA_AGENT_MCP_ARGS",
        value_delimiter = ' ',
        allow_hyphen_values = true,
        global = true
    )]
    pub mcp_args: Vec<String>,

    /// Streamable HTTP endpoint of an MCP tool server.
    #[arg(long, env = "DOTA_AGENT_MCP_URL", global = true)]
    pub mcp_url: Option<String>,

    /// Seconds allowed for the handshake and for each tool request.
    #[arg(
        long = "tool-timeout",
        env = "DOTA_AGENT_TOOL_TIMEOUT_SECS",
        default_value_t = DEFAULT_TOOL_TIMEOUT_SECS,
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    pub tool_timeout_secs: u64,
}

impl Default for ServerArgs {
    fn default() -> Self {
        Self {
            mcp_command: None,
            mcp_args: Vec::new(),
            mcp_url: None,
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }
}

impl ServerArgs {
    /// Budget for the handshake and each tool request.
    #[must_use]
    pub const fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }

    /// Resolves the flags into a connection target.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] when no server is configured.
    pub fn to_config(&self) -> Result<ToolServerConfig, AgentError> {
        let args = self
            .mcp_args
            .iter()
            .filter(|a| !a.is_empty())
            .cloned()
            .collect();
        ToolServerConfig::from_parts(self.mcp_command.clone(), args, self.mcp_url.clone())
    }
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask the assistant a question; it may call data tools to answer.
    #[command(after_help = r#"Examples:
  dota-agent --mcp-command uvx --mcp-arg opendota-mcp chat "How is Miracle- doing lately?"
  dota-agent chat "And his best hero?" --history convo.json --save-history
  dota-agent --format json chat "Who won match 7890123456?" | jq .response
"#)]
    Chat {
        /// The user message.
        message: String,

        /// JSON file with prior conversation turns.
        #[arg(long)]
        history: Option<PathBuf>,

        /// Write the extended conversation back to `--history`.
        #[arg(long, requires = "history")]
        save_history: bool,
    },

    /// List the tools the configured server exposes.
    Tools,

    /// Produce a multi-analyst report for one match.
    #[command(after_help = r#"Examples:
  dota-agent analyze match.json
  cat match.json | dota-agent analyze -
  dota-agent --mcp-url http://localhost:8000/mcp analyze --match-id 7890123456
  dota-agent --format json analyze match.json | jq '.sections | keys'
"#)]
    Analyze {
        /// Match record JSON file (`-` for stdin).
        #[arg(conflicts_with = "match_id")]
        file: Option<PathBuf>,

        /// Fetch the record through the `get_match_details` tool instead.
        #[arg(long)]
        match_id: Option<u64>,
    },

    /// Write default prompt templates for customization.
    #[command(after_help = r#"Examples:
  dota-agent init-prompts                      # ~/.config/dota-agent/prompts
  dota-agent init-prompts --dir ./prompts      # Custom directory
"#)]
    InitPrompts {
        /// Target directory (defaults to the user prompt directory).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap_or_else(|e| unreachable!("parse failed: {e}"))
    }

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_chat_with_history() {
        let cli = parse(&["dota-agent", "chat", "hi", "--history", "h.json", "--save-history"]);
        assert!(matches!(
            cli.command,
            Commands::Chat { ref message, save_history: true, .. } if message == "hi"
        ));
    }

    #[test]
    fn test_save_history_requires_file() {
        assert!(Cli::try_parse_from(["dota-agent", "chat", "hi", "--save-history"]).is_err());
    }

    #[test]
    fn test_analyze_file_and_match_id_conflict() {
        assert!(
            Cli::try_parse_from(["dota-agent", "analyze", "m.json", "--match-id", "1"]).is_err()
        );
    }

    #[test]
    fn test_server_flags_after_subcommand() {
        let cli = parse(&[
            "dota-agent",
            "tools",
            "--mcp-command",
            "uvx",
            "--mcp-arg",
            "opendota-mcp",
            "--mcp-arg",
            "--quiet",
        ]);
        let config = cli.server.to_config();
        assert_eq!(
            config.ok(),
            Some(ToolServerConfig::Stdio {
                command: "uvx".to_string(),
                args: vec!["opendota-mcp".to_string(), "--quiet".to_string()],
            })
        );
    }

    #[test]
    fn test_tool_timeout_flag() {
        let cli = parse(&["dota-agent", "--tool-timeout", "5", "tools"]);
        assert_eq!(cli.server.tool_timeout(), Duration::from_secs(5));
        assert_eq!(
            ServerArgs::default().tool_timeout(),
            Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS)
        );
        assert!(Cli::try_parse_from(["dota-agent", "--tool-timeout", "0", "tools"]).is_err());
    }

    #[test]
    fn test_no_server_configured() {
        let args = ServerArgs::default();
        assert!(matches!(args.to_config(), Err(AgentError::InvalidConfig { .. })));
    }
}
