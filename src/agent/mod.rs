//! Agent layer: tool-using chat and multi-analyst match reports.
//!
//! Uses a pluggable provider abstraction backed by `OpenAI`-compatible
//! APIs (Gemini by default) and a pluggable tool backend.
//!
//! # Architecture
//!
//! ```text
//! chat message → Assistant
//!   └── ToolCallLoop (bounded)
//!       ├── ModelSession ⇄ LlmProvider
//!       └── ToolProvider (one call at a time, flattened result fed back)
//!
//! match record → Orchestrator
//!   ├── slice per AgentDefinition
//!   ├── Fan-out → N concurrent SubAgents (JoinSet)
//!   └── AnalysisReport (sections in definition order)
//! ```

pub mod agentic_loop;
pub mod assistant;
pub mod client;
pub mod config;
pub mod dataset;
pub mod message;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod report;
pub mod session;
pub mod subagent;
pub mod tool;
pub mod toolbox;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types
pub use agentic_loop::{ChatOutcome, ToolCallLoop};
pub use assistant::Assistant;
pub use client::create_provider;
pub use config::AgentConfig;
pub use dataset::{AgentDefinition, DataSlice, default_match_agents};
pub use message::{ChatMessage, ChatRequest, ChatResponse, ConversationTurn, Role, TokenUsage};
pub use orchestrator::Orchestrator;
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use report::{AgentResult, AgentStatus, AnalysisReport, ReportSection, format_duration};
pub use session::{ModelSession, ModelTurn, SessionInput};
pub use subagent::SubAgent;
pub use tool::{ContentPart, ToolCall, ToolDefinition, ToolOutcome, ToolSpec};
pub use toolbox::ToolProvider;
