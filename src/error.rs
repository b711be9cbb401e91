//! Error type shared by the upstream client, tool registry, and server.
//!
//! Handler-local failures (validation, authentication, request) are mapped to
//! MCP error responses at the server boundary. Config errors only occur at
//! startup.

use rmcp::ErrorData as McpError;
use thiserror::Error;

use crate::observability::redact_secrets;

#[derive(Debug, Error)]
pub enum AdapterError {
    // --- Caller mistakes (recoverable, reported as invalid params) ---
    #[error("{0}")]
    Validation(String),

    #[error("Unknown AgentOps API tool: {0}")]
    UnknownTool(String),

    // --- Upstream failures (reported as internal errors) ---
    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Request(String),

    // --- Startup ---
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AdapterError {
    /// Whether the caller can fix this by changing the tool arguments.
    pub fn is_invalid_params(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::UnknownTool(_))
    }
}

impl From<AdapterError> for McpError {
    fn from(err: AdapterError) -> Self {
        let message = redact_secrets(&err.to_string());
        if err.is_invalid_params() {
            McpError::invalid_params(message, None)
        } else {
            McpError::internal_error(message, None)
        }
    }
}

/// Result alias for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;
