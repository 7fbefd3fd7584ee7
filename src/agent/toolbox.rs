//! Pluggable tool backend trait.
//!
//! The tool loop only needs to list tools and invoke them by name; how the
//! calls travel (child-process pipe, HTTP) is the implementation's concern.

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::tool::{ToolOutcome, ToolSpec};
use crate::error::AgentError;

/// Trait for tool-execution backends.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    /// Backend name for logging (e.g., `"mcp-stdio"`).
    fn name(&self) -> &'static str;

    /// Lists the tools the backend exposes.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ProviderUnavailable`] if the backend cannot be
    /// reached.
    async fn list_tools(&self) -> Result<Vec<ToolSpec>, AgentError>;

    /// Invokes a tool with an argument object.
    ///
    /// A tool that runs but reports failure returns `Ok` with
    /// [`ToolOutcome::is_error`] set.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when the call could not be made or its result
    /// could not be read.
    async fn invoke(&self, name: &str, arguments: Map<String, Value>)
    -> Result<ToolOutcome, AgentError>;

    /// Releases the backend connection. Further calls fail.
    async fn close(&self) -> Result<(), AgentError> {
        Ok(())
    }
}
