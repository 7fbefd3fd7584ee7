//! CLI command implementations.
//!
//! Each command builds its own runtime, wires a model provider and the
//! tool server together, and renders the result in the chosen format.

#![allow(clippy::uninlined_format_args)]

use std::future::Future;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{info, warn};

use crate::agent::message::ConversationTurn;
use crate::agent::prompt::PromptSet;
use crate::agent::tool::flatten_outcome;
use crate::agent::toolbox::ToolProvider;
use crate::agent::{AgentConfig, Assistant, Orchestrator, create_provider};
use crate::cli::output::{OutputFormat, format_report, format_tool_list};
use crate::cli::parser::{Cli, Commands, ServerArgs};
use crate::error::{CommandError, Error, Result};
use crate::mcp::McpToolProvider;

/// Tool the `analyze --match-id` path fetches match records with.
pub const MATCH_DETAILS_TOOL: &str = "get_match_details";

/// Executes the CLI command.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);

    match &cli.command {
        Commands::Chat {
            message,
            history,
            save_history,
        } => cmd_chat(
            &cli.server,
            message,
            history.as_deref(),
            *save_history,
            format,
        ),
        Commands::Tools => cmd_tools(&cli.server, format),
        Commands::Analyze { file, match_id } => {
            cmd_analyze(&cli.server, file.as_deref(), *match_id, format)
        }
        Commands::InitPrompts { dir } => cmd_init_prompts(dir.as_deref(), format),
    }
}

/// Runs `future` on a fresh multi-threaded runtime.
fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to create async runtime: {e}"))
    })?;
    Ok(rt.block_on(future))
}

/// Connects to the tool server, runs `work`, and closes the connection
/// whatever the outcome. Every tool-server request is bounded by
/// `--tool-timeout`.
async fn with_tools<T, F, Fut>(server: &ServerArgs, work: F) -> Result<T>
where
    F: FnOnce(Arc<McpToolProvider>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let config = server.to_config()?;
    let tools = Arc::new(McpToolProvider::connect(&config, server.tool_timeout()).await?);
    let result = work(Arc::clone(&tools)).await;
    if let Err(e) = tools.close().await {
        warn!(error = %e, "failed to close tool server connection");
    }
    result
}

/// Agent settings from the environment, with the CLI's tool timeout.
fn agent_config(server: &ServerArgs) -> Result<AgentConfig> {
    Ok(AgentConfig::builder()
        .tool_timeout(server.tool_timeout())
        .from_env()
        .build()?)
}

fn cmd_chat(
    server: &ServerArgs,
    message: &str,
    history_path: Option<&Path>,
    save_history: bool,
    format: OutputFormat,
) -> Result<String> {
    if message.trim().is_empty() {
        return Err(CommandError::InvalidInput("message must not be empty".to_string()).into());
    }

    let history = match history_path {
        Some(path) => read_history(path)?,
        None => Vec::new(),
    };
    let config = agent_config(server)?;
    let provider = create_provider(&config)?;
    let prompts = PromptSet::load(config.prompt_dir.as_deref());

    let outcome = block_on(with_tools(server, |tools| async move {
        let assistant = Assistant::connect(provider, tools, &config, &prompts).await?;
        Ok::<_, Error>(assistant.chat(message, history).await?)
    }))??;
    info!(tool_calls = outcome.tool_calls, "chat complete");

    if save_history && let Some(path) = history_path {
        write_history(path, &outcome.history)?;
    }

    match format {
        OutputFormat::Text => Ok(format!("{}\n", outcome.response.trim_end())),
        OutputFormat::Json => {
            let json = json!({
                "response": outcome.response,
                "conversation_history": outcome.history,
            });
            Ok(format.to_json(&json))
        }
    }
}

/// Reads a saved conversation; a missing file is an empty conversation.
fn read_history(path: &Path) -> Result<Vec<ConversationTurn>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|e| {
        CommandError::InvalidInput(format!("history file {}: {e}", path.display())).into()
    })
}

fn write_history(path: &Path, history: &[ConversationTurn]) -> Result<()> {
    let json = serde_json::to_string_pretty(history)
        .map_err(|e| CommandError::OutputFormat(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json + "\n")?;
    Ok(())
}

fn cmd_tools(server: &ServerArgs, format: OutputFormat) -> Result<String> {
    let specs = block_on(with_tools(server, |tools| async move {
        Ok::<_, Error>(tools.list_tools().await?)
    }))??;

    match format {
        OutputFormat::Text => {
            let catalog = crate::agent::tool::to_model_tools(&specs);
            Ok(format_tool_list(&catalog))
        }
        OutputFormat::Json => Ok(format.to_json(&specs)),
    }
}

fn cmd_analyze(
    server: &ServerArgs,
    file: Option<&Path>,
    match_id: Option<u64>,
    format: OutputFormat,
) -> Result<String> {
    let config = agent_config(server)?;
    let provider = create_provider(&config)?;

    let report = block_on(async move {
        let dataset = load_dataset(server, file, match_id).await?;
        let orchestrator = Orchestrator::new(provider, config);
        Ok::<_, Error>(orchestrator.analyze_match(&dataset).await?)
    })??;

    match format {
        OutputFormat::Text => Ok(format_report(&report)),
        OutputFormat::Json => Ok(format.to_json(&report)),
    }
}

async fn load_dataset(
    server: &ServerArgs,
    file: Option<&Path>,
    match_id: Option<u64>,
) -> Result<Value> {
    match (file, match_id) {
        (Some(path), _) => read_dataset(path),
        (None, Some(id)) => fetch_match(server, id).await,
        (None, None) => Err(CommandError::InvalidInput(
            "provide a match file, '-' for stdin, or --match-id".to_string(),
        )
        .into()),
    }
}

fn read_dataset(path: &Path) -> Result<Value> {
    let (text, source) = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        (buf, "stdin".to_string())
    } else {
        (
            std::fs::read_to_string(path)?,
            path.display().to_string(),
        )
    };
    parse_match_record(&text, &source)
}

/// Fetches a match record through the tool server; the call fails with
/// [`AgentError::Timeout`](crate::error::AgentError::Timeout) after
/// `--tool-timeout`.
async fn fetch_match(server: &ServerArgs, match_id: u64) -> Result<Value> {
    let text = with_tools(server, |tools| async move {
        let mut arguments = serde_json::Map::new();
        arguments.insert("match_id".to_string(), json!(match_id));
        let outcome = tools.invoke(MATCH_DETAILS_TOOL, arguments).await?;
        let text = flatten_outcome(&outcome);
        if outcome.is_error {
            return Err(Error::from(CommandError::ExecutionFailed(format!(
                "{MATCH_DETAILS_TOOL} failed for match {match_id}: {text}"
            ))));
        }
        Ok::<_, Error>(text)
    })
    .await?;
    parse_match_record(&text, &format!("{MATCH_DETAILS_TOOL}({match_id})"))
}

fn parse_match_record(text: &str, source: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(text).map_err(|e| {
        CommandError::InvalidInput(format!("{source} is not valid JSON: {e}"))
    })?;
    if !value.is_object() {
        return Err(
            CommandError::InvalidInput(format!("{source} must contain a JSON object")).into(),
        );
    }
    Ok(value)
}

fn cmd_init_prompts(dir: Option<&Path>, format: OutputFormat) -> Result<String> {
    let target_dir = dir
        .map(PathBuf::from)
        .or_else(PromptSet::default_dir)
        .ok_or_else(|| {
            CommandError::ExecutionFailed(
                "Could not determine home directory for default prompt path".to_string(),
            )
        })?;

    let written = PromptSet::write_defaults(&target_dir).map_err(|e| {
        CommandError::ExecutionFailed(format!("Failed to write prompt templates: {e}"))
    })?;

    match format {
        OutputFormat::Text => {
            if written.is_empty() {
                return Ok(format!(
                    "All prompt templates already exist in: {}\n",
                    target_dir.display()
                ));
            }
            let names: Vec<String> = written
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| format!("  {}\n", n.to_string_lossy()))
                .collect();
            Ok(format!(
                "Wrote {} prompt template(s) to: {}\n{}\nEdit these files to customize the assistant and analyst prompts.\n",
                written.len(),
                target_dir.display(),
                names.concat()
            ))
        }
        OutputFormat::Json => {
            let json = json!({
                "directory": target_dir.to_string_lossy(),
                "written": written
                    .iter()
                    .map(|p| p.to_string_lossy().into_owned())
                    .collect::<Vec<_>>(),
                "count": written.len()
            });
            Ok(format.to_json(&json))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::TurnRole;
    use tempfile::TempDir;

    fn temp_dir() -> TempDir {
        TempDir::new().unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn test_init_prompts_then_skip() {
        let dir = temp_dir();
        let first = cmd_init_prompts(Some(dir.path()), OutputFormat::Text)
            .unwrap_or_else(|e| unreachable!("{e}"));
        assert!(first.starts_with("Wrote 4 prompt template(s)"));
        assert!(first.contains("  chat.md\n"));

        let second = cmd_init_prompts(Some(dir.path()), OutputFormat::Json)
            .unwrap_or_else(|e| unreachable!("{e}"));
        let json: Value = serde_json::from_str(&second).unwrap_or_else(|_| unreachable!());
        assert_eq!(json["count"], 0);
    }

    #[test]
    fn test_history_round_trip_and_missing_file() {
        let dir = temp_dir();
        let path = dir.path().join("convo.json");
        assert!(read_history(&path).map(|h| h.is_empty()).unwrap_or(false));

        let turns = vec![
            ConversationTurn::user("Who is Miracle-?"),
            ConversationTurn::assistant("A Jordanian carry player."),
        ];
        write_history(&path, &turns).unwrap_or_else(|e| unreachable!("{e}"));
        let loaded = read_history(&path).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(loaded, turns);
        assert_eq!(loaded[1].role, TurnRole::Assistant);
    }

    #[test]
    fn test_bad_history_is_invalid_input() {
        let dir = temp_dir();
        let path = dir.path().join("convo.json");
        std::fs::write(&path, "{not json").unwrap_or_else(|_| unreachable!());
        assert!(matches!(
            read_history(&path),
            Err(Error::Command(CommandError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_match_record_must_be_object() {
        assert!(parse_match_record(r#"{"match_id": 1}"#, "x").is_ok());
        assert!(matches!(
            parse_match_record("[1, 2]", "x"),
            Err(Error::Command(CommandError::InvalidInput(ref m))) if m.contains("JSON object")
        ));
        assert!(parse_match_record("nope", "x").is_err());
    }

    #[test]
    fn test_read_dataset_from_file() {
        let dir = temp_dir();
        let path = dir.path().join("match.json");
        std::fs::write(&path, r#"{"metadata": {"match_id": 42}}"#)
            .unwrap_or_else(|_| unreachable!());
        let value = read_dataset(&path).unwrap_or_else(|e| unreachable!("{e}"));
        assert_eq!(value["metadata"]["match_id"], 42);
    }

    #[test]
    fn test_empty_chat_message_rejected() {
        let result = cmd_chat(&ServerArgs::default(), "  ", None, false, OutputFormat::Text);
        assert!(matches!(
            result,
            Err(Error::Command(CommandError::InvalidInput(_)))
        ));
    }

    #[test]
    fn test_tools_without_server_is_config_error() {
        let result = cmd_tools(&ServerArgs::default(), OutputFormat::Text);
        assert!(matches!(
            result,
            Err(Error::Agent(crate::error::AgentError::InvalidConfig { .. }))
        ));
    }
}
