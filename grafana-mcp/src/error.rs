//! Error types for the Grafana MCP server

use grafana_mcp_core::{Category, ConfigError, SchemaError};
use thiserror::Error;

use crate::protocol::RpcError;

/// Result type for process-level operations
pub type McpResult<T> = Result<T, McpError>;

/// Failures that stop the server process
#[derive(Error, Debug)]
pub enum McpError {
    /// I/O error on the transport
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration could not be built
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Selected transport has no implementation
    #[error("transport not supported: {0}")]
    UnsupportedTransport(String),

    /// TLS material could not be loaded
    #[error("TLS error: {0}")]
    Tls(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// A request the dispatcher refuses before any handler runs
///
/// These travel in the JSON-RPC `error` field. Failures inside a handler
/// never become one of these.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("method not found: {0}")]
    MethodNotFound(String),

    #[error("tool not found: {0}")]
    ToolNotFound(String),

    #[error("category not enabled: {category} (tool {tool})")]
    CategoryDisabled { category: Category, tool: String },

    #[error("invalid params: {0}")]
    InvalidParams(String),

    /// Arguments failed schema validation
    #[error(transparent)]
    InvalidArguments(#[from] SchemaError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProtocolError {
    /// Get error code for MCP protocol
    pub fn code(&self) -> i32 {
        match self {
            ProtocolError::MethodNotFound(_) | ProtocolError::ToolNotFound(_) => -32601,
            ProtocolError::InvalidParams(_) | ProtocolError::InvalidArguments(_) => -32602,
            ProtocolError::CategoryDisabled { .. } => -32001,
            ProtocolError::Internal(_) => -32603,
        }
    }

    pub fn to_rpc_error(&self) -> RpcError {
        RpcError {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(ProtocolError::MethodNotFound("x".into()).code(), -32601);
        assert_eq!(ProtocolError::ToolNotFound("x".into()).code(), -32601);
        assert_eq!(ProtocolError::InvalidParams("x".into()).code(), -32602);
        assert_eq!(ProtocolError::Internal("x".into()).code(), -32603);
    }

    #[test]
    fn test_category_disabled_message() {
        let err = ProtocolError::CategoryDisabled {
            category: Category::Admin,
            tool: "list_teams".into(),
        };

        let rpc = err.to_rpc_error();
        assert_eq!(rpc.code, -32001);
        assert_eq!(rpc.message, "category not enabled: admin (tool list_teams)");
    }
}
