//! Error types for the MCP server.

use thiserror::Error;

pub type McpResult<T> = Result<T, McpError>;

#[derive(Debug, Error)]
pub enum McpError {
    #[error("MCP initialization failed: {0}")]
    Initialize(String),

    #[error("MCP service task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
