//! JSON-RPC message shapes
//!
//! One request or response per line of UTF-8, newline-terminated.

use grafana_mcp_core::ToolResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;

pub const JSONRPC_VERSION: &str = "2.0";

/// Protocol version answered when the client does not name one
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP JSON-RPC request
///
/// A request without an `id` (or with a `null` one) is a notification and
/// is never answered.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    pub fn is_notification(&self) -> bool {
        matches!(self.id, None | Some(Value::Null))
    }
}

/// Result payload, kept typed so envelopes serialize in field order
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RpcResult {
    Tool(ToolResult),
    Value(Value),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// MCP JSON-RPC response
#[derive(Debug, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<RpcResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: RpcResult) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: &ProtocolError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error.to_rpc_error()),
        }
    }

    pub fn from_outcome(id: Value, outcome: Result<RpcResult, ProtocolError>) -> Self {
        match outcome {
            Ok(result) => Self::success(id, result),
            Err(err) => Self::failure(id, &err),
        }
    }
}

/// Parse one input line
///
/// Returns `None` for anything that is not a JSON object with a string
/// `method`; such lines are dropped without a response.
pub fn parse_line(line: &str) -> Option<Request> {
    let value: Value = serde_json::from_str(line).ok()?;
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value).ok()
}
