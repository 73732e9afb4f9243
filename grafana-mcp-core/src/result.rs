//! Tool result envelopes
//!
//! Every tool call ends in exactly one of two envelopes:
//!
//! ```json
//! {"content": [{"type": "text", "text": "..."}]}
//! {"content": [{"type": "text", "text": "..."}], "isError": true}
//! ```
//!
//! The error envelope is a *successful* RPC result: it tells the agent the
//! operation failed, not that the call was malformed.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use serde::Deserialize;

use crate::error::ToolError;

/// One piece of result content
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        match self {
            ContentBlock::Text { text } => text,
        }
    }
}

/// Outcome of one tool invocation
///
/// Build with [`ToolResult::text`], [`ToolResult::json`] or
/// [`ToolResult::error`]; each guarantees at least one content block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult {
    Ok { content: Vec<ContentBlock> },
    Error { content: Vec<ContentBlock> },
}

impl ToolResult {
    /// Plain-text success
    pub fn text(text: impl Into<String>) -> Self {
        ToolResult::Ok {
            content: vec![ContentBlock::text(text)],
        }
    }

    /// Success carrying a pretty-printed JSON value
    pub fn json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Self, ToolError> {
        let text = serde_json::to_string_pretty(value)?;
        Ok(Self::text(text))
    }

    /// Domain-level failure
    pub fn error(message: impl Into<String>) -> Self {
        ToolResult::Error {
            content: vec![ContentBlock::text(message)],
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error { .. })
    }

    pub fn content(&self) -> &[ContentBlock] {
        match self {
            ToolResult::Ok { content } | ToolResult::Error { content } => content,
        }
    }

    /// Text of the first content block
    pub fn first_text(&self) -> Option<&str> {
        self.content().first().map(ContentBlock::as_text)
    }
}

impl Serialize for ToolResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ToolResult::Ok { content } => {
                let mut s = serializer.serialize_struct("ToolResult", 1)?;
                s.serialize_field("content", content)?;
                s.end()
            }
            ToolResult::Error { content } => {
                let mut s = serializer.serialize_struct("ToolResult", 2)?;
                s.serialize_field("content", content)?;
                s.serialize_field("isError", &true)?;
                s.end()
            }
        }
    }
}
