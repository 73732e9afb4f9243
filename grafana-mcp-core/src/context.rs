//! Per-call request context

use std::sync::Arc;

use tracing::Span;
use uuid::Uuid;

use crate::config::ServerConfig;

/// Handed to every handler invocation
///
/// Carries the shared configuration plus a fresh call id and a tracing span
/// scoped to this one call. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct RequestContext {
    config: Arc<ServerConfig>,
    tool: String,
    call_id: Uuid,
    span: Span,
}

impl RequestContext {
    pub fn new(config: Arc<ServerConfig>, tool: impl Into<String>) -> Self {
        let tool = tool.into();
        let call_id = Uuid::new_v4();
        let span = tracing::info_span!("tool_call", tool = %tool, call_id = %call_id);
        Self {
            config,
            tool,
            call_id,
            span,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
