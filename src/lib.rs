//! AgentOps MCP adapter library.
//!
//! Exposes AgentOps trace listing and trace detail as MCP tools. Each tool
//! call is translated into an authenticated request against the AgentOps
//! REST API and the raw response body is handed back to the MCP client.

pub mod client;
pub mod config;
pub mod error;
pub mod observability;
pub mod server;
pub mod tools;

pub use client::AgentOpsClient;
pub use config::AdapterConfig;
pub use error::AdapterError;
pub use server::AgentOpsServer;
pub use tools::{ToolKind, ToolRegistry};
