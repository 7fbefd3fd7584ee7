//! CLI layer for dota-agent.
//!
//! Provides the command-line interface using clap: chat with tools,
//! tool listing, match analysis and prompt scaffolding.

pub mod commands;
pub mod output;
pub mod parser;

pub use commands::execute;
pub use output::OutputFormat;
pub use parser::{Cli, Commands, ServerArgs};
