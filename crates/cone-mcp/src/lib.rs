//! MCP (Model Context Protocol) tool server.
//!
//! Exposes the cone inspection pipeline as MCP tools over stdio.

pub mod error;
pub mod server;
pub mod tools;

pub use error::{McpError, McpResult};
pub use server::McpServer;
