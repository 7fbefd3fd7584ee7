//! # dota-agent
//!
//! A Dota 2 assistant that lets a language model answer questions by
//! calling data tools served over MCP, plus a multi-agent analyzer that
//! fans one match record out to specialist analysts and merges their
//! write-ups into a single report.
//!
//! ## Modules
//!
//! - [`agent`]: tool-calling loop, model providers, sub-agents and the
//!   match-analysis orchestrator
//! - [`mcp`]: MCP client implementing the tool backend
//! - [`cli`]: command-line front end
//! - [`error`]: error types

pub mod agent;
pub mod cli;
pub mod error;
pub mod mcp;

pub use agent::{AgentConfig, AnalysisReport, Assistant, ChatOutcome, Orchestrator};
pub use error::{AgentError, Error, Result};
