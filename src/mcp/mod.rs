//! MCP (Model Context Protocol) tool backend.
//!
//! Dota 2 data tools (players, matches, heroes) live in an external MCP
//! server; this module is the client side that exposes them to the agent
//! layer as a [`ToolProvider`](crate::agent::toolbox::ToolProvider).
//!
//! # Architecture
//!
//! ```text
//! ToolCallLoop
//!   ↓ invoke(name, args)
//! McpToolProvider (async mutex around one rmcp client)
//!   ↓ stdio child process | streamable HTTP
//! MCP tool server
//! ```

pub mod client;

pub use client::{McpToolProvider, ToolServerConfig};
