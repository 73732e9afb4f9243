//! MCP Server protocol implementation
//!
//! This module handles the MCP JSON-RPC protocol over any line-oriented byte
//! stream; [`McpServer::run_stdio`] binds it to the process's stdin/stdout.
//!
//! The read loop never waits on a tool. Each `tools/call` runs as its own
//! task and every response goes through one writer task, so replies may
//! leave in any order but always carry the id of the request they answer.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use grafana_mcp_core::{
    Arguments, RequestContext, ServerConfig, ToolDefinition, ToolRegistry, ToolResult,
};
use parking_lot::RwLock;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinSet};
use tracing::Instrument;

use crate::error::{McpResult, ProtocolError};
use crate::protocol::{parse_line, Request, Response, RpcResult, DEFAULT_PROTOCOL_VERSION};
use crate::{SERVER_INSTRUCTIONS, SERVER_NAME, SERVER_VERSION};

/// How long in-flight calls may run after shutdown starts
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Lifecycle of one client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Closed,
}

/// What the client told us in `initialize`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
    pub protocol_version: String,
}

#[derive(Debug)]
struct Session {
    state: SessionState,
    client: Option<ClientInfo>,
}

/// The dispatcher
///
/// Cloning is cheap; clones share the registry, configuration and session.
#[derive(Debug, Clone)]
pub struct McpServer {
    registry: Arc<ToolRegistry>,
    config: Arc<ServerConfig>,
    session: Arc<RwLock<Session>>,
    grace_period: Duration,
}

/// Builder for McpServer
#[derive(Debug)]
pub struct McpServerBuilder {
    config: Arc<ServerConfig>,
    registry: ToolRegistry,
    grace_period: Duration,
}

impl McpServerBuilder {
    /// Register one tool
    pub fn tool(mut self, definition: ToolDefinition) -> Self {
        self.registry.register(definition);
        self
    }

    /// Register several tools
    pub fn tools(mut self, definitions: impl IntoIterator<Item = ToolDefinition>) -> Self {
        self.registry.register_all(definitions);
        self
    }

    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn build(self) -> McpServer {
        McpServer {
            registry: Arc::new(self.registry),
            config: self.config,
            session: Arc::new(RwLock::new(Session {
                state: SessionState::Uninitialized,
                client: None,
            })),
            grace_period: self.grace_period,
        }
    }
}

impl McpServer {
    /// Start building a server around a validated configuration
    pub fn builder(config: impl Into<Arc<ServerConfig>>) -> McpServerBuilder {
        McpServerBuilder {
            config: config.into(),
            registry: ToolRegistry::new(),
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.session.read().state
    }

    pub fn client_info(&self) -> Option<ClientInfo> {
        self.session.read().client.clone()
    }

    /// Run the MCP server over stdio until EOF or `shutdown` resolves
    pub async fn run_stdio<S>(&self, shutdown: S) -> McpResult<()>
    where
        S: Future<Output = ()>,
    {
        tracing::info!(tools = self.registry.len(), "MCP server ready, listening on stdio");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout(), shutdown)
            .await
    }

    /// Serve requests read from `reader`, answering on `writer`
    ///
    /// Returns once input ends or `shutdown` resolves, in-flight calls have
    /// finished (or the grace period ran out) and the writer is closed.
    pub async fn serve<R, W, S>(&self, mut reader: R, writer: W, shutdown: S) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
        S: Future<Output = ()>,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_responses(writer, rx));
        let mut in_flight = JoinSet::new();
        let mut buf = Vec::new();
        let mut read_error = None;

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer reading input");
                    break;
                }
                read = reader.read_until(b'\n', &mut buf) => match read {
                    Ok(0) => {
                        tracing::debug!("Input closed");
                        break;
                    }
                    Ok(_) => {
                        let line = std::mem::take(&mut buf);
                        self.process_line(&line, &tx, &mut in_flight).await;
                    }
                    Err(e) => {
                        tracing::error!("Failed to read input: {}", e);
                        read_error = Some(e);
                        break;
                    }
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!("Tool task ended abnormally: {}", e);
                    }
                }
            }
        }

        self.drain(&mut in_flight).await;
        drop(tx);

        let written = match writer_task.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Response writer failed: {}", e);
                Ok(())
            }
        };
        self.session.write().state = SessionState::Closed;
        tracing::info!("MCP server stopped");

        match read_error {
            Some(e) => Err(e.into()),
            None => written,
        }
    }

    async fn drain(&self, in_flight: &mut JoinSet<()>) {
        if in_flight.is_empty() {
            return;
        }
        tracing::info!(
            pending = in_flight.len(),
            "Waiting up to {:?} for in-flight calls",
            self.grace_period
        );

        let finished = tokio::time::timeout(self.grace_period, async {
            while in_flight.join_next().await.is_some() {}
        })
        .await;

        if finished.is_err() {
            tracing::warn!(
                abandoned = in_flight.len(),
                "Grace period elapsed, abandoning in-flight calls"
            );
            in_flight.shutdown().await;
        }
    }

    async fn process_line(
        &self,
        line: &[u8],
        tx: &mpsc::UnboundedSender<Response>,
        in_flight: &mut JoinSet<()>,
    ) {
        let Ok(text) = std::str::from_utf8(line) else {
            tracing::debug!("Dropping line that is not UTF-8");
            return;
        };
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let Some(request) = parse_line(text) else {
            tracing::debug!(line = %text, "Dropping malformed message");
            return;
        };

        if request.is_notification() {
            tracing::debug!(method = %request.method, "Notification received");
            return;
        }

        if request.method == "tools/call" {
            let server = self.clone();
            let tx = tx.clone();
            in_flight.spawn(async move {
                if let Some(response) = server.handle_request(request).await {
                    let _ = tx.send(response);
                }
            });
        } else if let Some(response) = self.handle_request(request).await {
            let _ = tx.send(response);
        }
    }

    /// Handle one MCP request
    ///
    /// Returns `None` for notifications. `tools/call` is awaited inline here;
    /// the serve loop is what runs it concurrently.
    pub async fn handle_request(&self, request: Request) -> Option<Response> {
        if request.is_notification() {
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);
        tracing::debug!(method = %request.method, id = %id, "Request received");

        if matches!(request.method.as_str(), "tools/list" | "tools/call")
            && self.state() == SessionState::Uninitialized
        {
            tracing::warn!(method = %request.method, "Request received before initialize");
        }

        let outcome = match request.method.as_str() {
            "initialize" => Ok(RpcResult::Value(self.handle_initialize(&request.params))),
            "ping" => Ok(RpcResult::Value(json!({}))),
            "tools/list" => Ok(RpcResult::Value(self.handle_tools_list())),
            "tools/call" => self.handle_tools_call(&request.params).await.map(RpcResult::Tool),
            other => Err(ProtocolError::MethodNotFound(other.to_string())),
        };

        if let Err(e) = &outcome {
            tracing::debug!(id = %id, "Protocol error: {}", e);
        }
        Some(Response::from_outcome(id, outcome))
    }

    fn handle_initialize(&self, params: &Value) -> Value {
        let protocol_version = params
            .get("protocolVersion")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_PROTOCOL_VERSION)
            .to_string();
        let client = params.get("clientInfo");
        let info = ClientInfo {
            name: client
                .and_then(|c| c.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            version: client
                .and_then(|c| c.get("version"))
                .and_then(Value::as_str)
                .map(str::to_string),
            protocol_version: protocol_version.clone(),
        };
        tracing::info!(
            client = info.name.as_deref().unwrap_or("unknown"),
            protocol = %protocol_version,
            "Client initialized"
        );

        {
            let mut session = self.session.write();
            session.state = SessionState::Ready;
            session.client = Some(info);
        }

        json!({
            "protocolVersion": protocol_version,
            "capabilities": {
                "tools": { "listChanged": false }
            },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION
            },
            "instructions": SERVER_INSTRUCTIONS
        })
    }

    fn handle_tools_list(&self) -> Value {
        let tools: Vec<Value> = self
            .registry
            .list_all()
            .iter()
            .filter(|t| self.config.is_tool_enabled(t.name()))
            .map(|t| t.to_listing())
            .collect();

        json!({ "tools": tools })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<ToolResult, ProtocolError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| ProtocolError::InvalidParams("missing tool name".to_string()))?;

        let tool = self
            .registry
            .get(name)
            .ok_or_else(|| ProtocolError::ToolNotFound(name.to_string()))?;

        if let Some(category) = tool.category() {
            if !self.config.enabled_categories.contains(&category) {
                return Err(ProtocolError::CategoryDisabled {
                    category,
                    tool: name.to_string(),
                });
            }
        }

        let args = tool.input_schema().validate(params.get("arguments"))?;
        Ok(self.invoke(&tool, args).await)
    }

    /// Run a handler inside the protective boundary
    ///
    /// Errors and panics both come back as error envelopes.
    async fn invoke(&self, tool: &ToolDefinition, args: Arguments) -> ToolResult {
        let ctx = RequestContext::new(Arc::clone(&self.config), tool.name());
        let span = ctx.span().clone();
        let handler = tool.handler();

        let task = tokio::spawn(async move { handler.call(args, ctx).await }.instrument(span.clone()));
        let _guard = AbortOnDrop(task.abort_handle());

        let result = match task.await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                span.in_scope(|| tracing::warn!("Tool failed: {}", e));
                ToolResult::error(e.to_string())
            }
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                span.in_scope(|| tracing::error!("Tool panicked: {}", message));
                ToolResult::error(format!(
                    "tool {} failed unexpectedly: {}",
                    tool.name(),
                    message
                ))
            }
            Err(_) => ToolResult::error(format!("tool {} was cancelled", tool.name())),
        };

        span.in_scope(|| tracing::debug!(is_error = result.is_error(), "Tool call finished"));
        result
    }
}

/// Aborts the handler task if the dispatcher gives up waiting on it
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn write_responses<W>(mut writer: W, mut rx: mpsc::UnboundedReceiver<Response>) -> McpResult<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        writer.write_all(&line).await?;
        writer.flush().await?;
    }
    writer.shutdown().await?;
    Ok(())
}
