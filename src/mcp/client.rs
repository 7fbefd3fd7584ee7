//! MCP client implementing [`ToolProvider`].
//!
//! Connects to a tool server over a stdio child process or streamable
//! HTTP, lists its tools and forwards calls. Access to the running
//! service is serialized behind an async mutex, and the handshake, the
//! listing and every call are bounded by one request timeout.

use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::{CallToolRequestParams, CallToolResult, RawContent, Tool};
use rmcp::service::RunningService;
use rmcp::transport::{ConfigureCommandExt, StreamableHttpClientTransport, TokioChildProcess};
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::agent::tool::{ContentPart, ToolOutcome, ToolSpec};
use crate::agent::toolbox::ToolProvider;
use crate::error::AgentError;

/// Where the tool server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolServerConfig {
    /// Spawn `command args...` and talk MCP over its stdio.
    Stdio {
        /// Executable to run.
        command: String,
        /// Arguments passed to it.
        args: Vec<String>,
    },
    /// Connect to a streamable HTTP endpoint.
    Http {
        /// Endpoint URL, e.g. `http://localhost:8000/mcp`.
        url: String,
    },
}

impl ToolServerConfig {
    /// Picks a transport from the connection settings; a command wins over
    /// a URL.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] when neither is set.
    pub fn from_parts(
        command: Option<String>,
        args: Vec<String>,
        url: Option<String>,
    ) -> Result<Self, AgentError> {
        let command = command.filter(|c| !c.trim().is_empty());
        let url = url.filter(|u| !u.trim().is_empty());
        match (command, url) {
            (Some(command), _) => Ok(Self::Stdio { command, args }),
            (None, Some(url)) => Ok(Self::Http { url }),
            (None, None) => Err(AgentError::InvalidConfig {
                message: "no tool server configured: set --mcp-command or --mcp-url \
                          (DOTA_AGENT_MCP_COMMAND / DOTA_AGENT_MCP_URL)"
                    .to_string(),
            }),
        }
    }
}

impl std::fmt::Display for ToolServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdio { command, args } if args.is_empty() => write!(f, "stdio:{command}"),
            Self::Stdio { command, args } => write!(f, "stdio:{command} {}", args.join(" ")),
            Self::Http { url } => write!(f, "http:{url}"),
        }
    }
}

/// Tool backend speaking MCP through `rmcp`.
pub struct McpToolProvider {
    service: Mutex<Option<RunningService<RoleClient, ()>>>,
    transport: &'static str,
    request_timeout: Duration,
}

impl McpToolProvider {
    /// Connects using whichever transport `config` names. The handshake
    /// and every later request must finish within `request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ProviderUnavailable`] if the server cannot be
    /// started or the handshake fails or stalls.
    pub async fn connect(
        config: &ToolServerConfig,
        request_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let start = async {
            match config {
                ToolServerConfig::Stdio { command, args } => {
                    Self::start_stdio(command, args).await.map(|s| (s, "mcp-stdio"))
                }
                ToolServerConfig::Http { url } => {
                    Self::start_http(url).await.map(|s| (s, "mcp-http"))
                }
            }
        };

        let connected = timeout(request_timeout, start).await.unwrap_or_else(|_| {
            Err(anyhow::anyhow!(
                "no handshake within {}s",
                request_timeout.as_secs()
            ))
        });
        let (service, transport) = connected.map_err(|e| AgentError::ProviderUnavailable {
            message: format!("cannot connect to tool server {config}: {e:#}"),
        })?;

        info!(server = %config, "connected to tool server");
        Ok(Self {
            service: Mutex::new(Some(service)),
            transport,
            request_timeout,
        })
    }

    async fn start_stdio(
        command: &str,
        args: &[String],
    ) -> anyhow::Result<RunningService<RoleClient, ()>> {
        let process = TokioChildProcess::new(tokio::process::Command::new(command).configure(
            |cmd| {
                cmd.args(args).kill_on_drop(true);
            },
        ))?;
        Ok(().serve(process).await?)
    }

    async fn start_http(url: &str) -> anyhow::Result<RunningService<RoleClient, ()>> {
        let transport = StreamableHttpClientTransport::from_uri(url.to_string());
        Ok(().serve(transport).await?)
    }

    fn closed() -> AgentError {
        AgentError::ProviderUnavailable {
            message: "tool server connection is closed".to_string(),
        }
    }
}

impl std::fmt::Debug for McpToolProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("McpToolProvider")
            .field("transport", &self.transport)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ToolProvider for McpToolProvider {
    fn name(&self) -> &'static str {
        self.transport
    }

    async fn list_tools(&self) -> Result<Vec<ToolSpec>, AgentError> {
        let guard = self.service.lock().await;
        let service = guard.as_ref().ok_or_else(Self::closed)?;
        let tools = timeout(self.request_timeout, service.peer().list_all_tools())
            .await
            .map_err(|_| AgentError::ProviderUnavailable {
                message: format!(
                    "tools/list got no answer within {}s",
                    self.request_timeout.as_secs()
                ),
            })?
            .map_err(|e| AgentError::ProviderUnavailable {
                message: format!("tools/list failed: {e}"),
            })?;
        debug!(count = tools.len(), "listed tools");
        Ok(tools.into_iter().map(tool_spec).collect())
    }

    async fn invoke(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolOutcome, AgentError> {
        let params: CallToolRequestParams =
            serde_json::from_value(json!({ "name": name, "arguments": arguments })).map_err(
                |e| AgentError::ToolInvocation {
                    name: name.to_string(),
                    message: format!("cannot encode call: {e}"),
                },
            )?;

        let guard = self.service.lock().await;
        let service = guard.as_ref().ok_or_else(Self::closed)?;
        let result = timeout(self.request_timeout, service.peer().call_tool(params))
            .await
            .map_err(|_| AgentError::Timeout {
                operation: format!("tool '{name}'"),
                seconds: self.request_timeout.as_secs(),
            })?
            .map_err(|e| AgentError::ToolInvocation {
                name: name.to_string(),
                message: e.to_string(),
            })?;
        Ok(tool_outcome(result))
    }

    async fn close(&self) -> Result<(), AgentError> {
        let Some(service) = self.service.lock().await.take() else {
            return Ok(());
        };
        service
            .cancel()
            .await
            .map(|reason| debug!(?reason, "tool server connection closed"))
            .map_err(|e| AgentError::ProviderUnavailable {
                message: format!("closing tool server connection failed: {e}"),
            })
    }
}

fn tool_spec(tool: Tool) -> ToolSpec {
    ToolSpec {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
        input_schema: Value::Object((*tool.input_schema).clone()),
    }
}

/// Maps an MCP call result: text items stay text, every other item (and
/// `structuredContent` when there is no content) is kept as JSON.
fn tool_outcome(result: CallToolResult) -> ToolOutcome {
    let mut parts: Vec<ContentPart> = result
        .content
        .into_iter()
        .map(|item| match item.raw {
            RawContent::Text(text) => ContentPart::Text(text.text),
            other => ContentPart::Structured(
                serde_json::to_value(&other).unwrap_or_else(|e| json!({ "error": e.to_string() })),
            ),
        })
        .collect();

    if parts.is_empty()
        && let Some(structured) = result.structured_content
    {
        parts.push(ContentPart::Structured(structured));
    }

    ToolOutcome {
        parts,
        is_error: result.is_error.unwrap_or(false),
    }
}
