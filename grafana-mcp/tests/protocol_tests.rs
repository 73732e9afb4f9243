//! End-to-end dispatcher tests over an in-memory line transport

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use grafana_mcp::{McpResult, McpServer, SessionState};
use grafana_mcp_core::{
    Category, FieldType, InputSchema, ServerConfig, ServerConfigBuilder, ToolDefinition, ToolError,
    ToolResult,
};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_test::assert_ok;

fn config() -> ServerConfigBuilder {
    ServerConfig::builder()
        .url("http://localhost:3000")
        .api_key("test-key")
}

fn echo() -> ToolDefinition {
    ToolDefinition::from_fn(
        "echo",
        "Echo a message back",
        InputSchema::new().required("msg", FieldType::String, "Message to echo"),
        |args, _ctx| async move { args.str("msg").map(ToolResult::text) },
    )
}

fn sleepy() -> ToolDefinition {
    ToolDefinition::from_fn(
        "sleepy",
        "Answer after a delay",
        InputSchema::new().required("ms", FieldType::Integer, "Delay in milliseconds"),
        |args, _ctx| async move {
            let ms = args.i64("ms")?;
            tokio::time::sleep(Duration::from_millis(ms as u64)).await;
            Ok(ToolResult::text(format!("slept {}", ms)))
        },
    )
}

fn constant(name: &str) -> ToolDefinition {
    let reply = format!("{} ok", name);
    ToolDefinition::from_fn(name, format!("The {} tool", name), InputSchema::new(), move |_, _| {
        let reply = reply.clone();
        async move { Ok(ToolResult::text(reply)) }
    })
}

struct Client {
    input: Option<DuplexStream>,
    output: Lines<BufReader<DuplexStream>>,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<McpResult<()>>,
}

impl Client {
    fn start(server: McpServer) -> Self {
        let (input, server_in) = tokio::io::duplex(64 * 1024);
        let (server_out, output) = tokio::io::duplex(64 * 1024);
        let (stop, stopped) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            server
                .serve(BufReader::new(server_in), server_out, async {
                    let _ = stopped.await;
                })
                .await
        });

        Self {
            input: Some(input),
            output: BufReader::new(output).lines(),
            stop: Some(stop),
            task,
        }
    }

    async fn send(&mut self, line: &str) {
        let input = self.input.as_mut().unwrap();
        input.write_all(line.as_bytes()).await.unwrap();
        input.write_all(b"\n").await.unwrap();
    }

    async fn send_json(&mut self, value: Value) {
        self.send(&value.to_string()).await;
    }

    async fn recv_line(&mut self) -> Option<String> {
        tokio::time::timeout(Duration::from_secs(5), self.output.next_line())
            .await
            .expect("timed out waiting for a response")
            .unwrap()
    }

    async fn recv(&mut self) -> Value {
        let line = self.recv_line().await.expect("output closed");
        serde_json::from_str(&line).unwrap()
    }

    async fn call(&mut self, id: i64, name: &str, arguments: Value) -> Value {
        self.send_json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        }))
        .await;
        self.recv().await
    }

    async fn list_names(&mut self, id: i64) -> Vec<String> {
        self.send_json(json!({"jsonrpc": "2.0", "id": id, "method": "tools/list"}))
            .await;
        let response = self.recv().await;
        response["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap().to_string())
            .collect()
    }

    fn close_input(&mut self) {
        self.input.take();
    }

    fn signal_shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }

    async fn finish(self) -> McpResult<()> {
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("server did not stop")
            .unwrap()
    }
}

#[tokio::test]
async fn test_echo_scenario_is_byte_exact() {
    let server = McpServer::builder(config().build().unwrap()).tool(echo()).build();
    let mut client = Client::start(server);

    client
        .send(r#"{"jsonrpc":"2.0","id":7,"method":"tools/call","params":{"name":"echo","arguments":{"msg":"hi"}}}"#)
        .await;

    assert_eq!(
        client.recv_line().await.unwrap(),
        r#"{"jsonrpc":"2.0","id":7,"result":{"content":[{"type":"text","text":"hi"}]}}"#
    );
}

#[tokio::test]
async fn test_missing_tool_is_protocol_error() {
    let server = McpServer::builder(config().build().unwrap()).tool(echo()).build();
    let mut client = Client::start(server);

    let response = client.call(8, "missing_tool", json!({})).await;

    assert_eq!(response["id"], 8);
    assert_eq!(response["error"]["message"], "tool not found: missing_tool");
    assert_eq!(response["error"]["code"], -32601);
    assert!(response.get("result").is_none());
}

#[tokio::test]
async fn test_disabled_admin_category() {
    let server = McpServer::builder(config().disable(Category::Admin).build().unwrap())
        .tool(echo())
        .tool(constant("list_teams"))
        .build();
    let mut client = Client::start(server);

    let names = client.list_names(1).await;
    assert!(!names.contains(&"list_teams".to_string()));
    assert!(names.contains(&"echo".to_string()));

    let response = client.call(2, "list_teams", json!({})).await;
    assert_eq!(response["error"]["code"], -32001);
    assert_eq!(
        response["error"]["message"],
        "category not enabled: admin (tool list_teams)"
    );
    assert!(response.get("result").is_none());
}

#[tokio::test]
async fn test_list_filters_only_disabled_categories() {
    let server = McpServer::builder(
        config()
            .disable(Category::Loki)
            .disable(Category::Alerting)
            .build()
            .unwrap(),
    )
    .tools([
        constant("query_loki_logs"),
        constant("list_alert_rules"),
        constant("query_prometheus"),
        constant("search_dashboards"),
        constant("list_contact_points"),
        constant("brand_new_tool"),
    ])
    .build();
    let mut client = Client::start(server);

    let names = client.list_names(1).await;

    assert_eq!(
        names,
        vec![
            "brand_new_tool",
            "list_contact_points",
            "query_prometheus",
            "search_dashboards"
        ]
    );
}

#[tokio::test]
async fn test_register_then_list_round_trip() {
    let description = "Echo a message back, with \"quotes\" and ünïcode";
    let server = McpServer::builder(config().build().unwrap())
        .tool(ToolDefinition::from_fn(
            "echo",
            description,
            InputSchema::new().required("msg", FieldType::String, "Message to echo"),
            |args, _ctx| async move { args.str("msg").map(ToolResult::text) },
        ))
        .build();
    let mut client = Client::start(server);

    client
        .send_json(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"}))
        .await;
    let response = client.recv().await;
    let tool = &response["result"]["tools"][0];

    assert_eq!(tool["name"], "echo");
    assert_eq!(tool["description"], description);
    assert_eq!(tool["inputSchema"]["required"], json!(["msg"]));
}

#[tokio::test]
async fn test_validation_failure_never_runs_handler() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let counted = ToolDefinition::from_fn(
        "counted",
        "Counts invocations",
        InputSchema::new()
            .required("uid", FieldType::String, "A UID")
            .required("limit", FieldType::Integer, "A limit"),
        move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(ToolResult::text("ran")) }
        },
    );
    let server = McpServer::builder(config().build().unwrap())
        .tool(counted)
        .build();
    let mut client = Client::start(server);

    let response = client.call(1, "counted", json!({"limit": "many"})).await;

    assert_eq!(response["error"]["code"], -32602);
    let message = response["error"]["message"].as_str().unwrap();
    assert!(message.contains("'uid' is required"), "{}", message);
    assert!(message.contains("'limit'"), "{}", message);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let response = client.call(2, "counted", json!({"uid": "a", "limit": "5"})).await;
    assert_eq!(response["result"]["content"][0]["text"], "ran");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failing_and_panicking_handlers_become_error_envelopes() {
    let failing = ToolDefinition::from_fn("failing", "Always fails", InputSchema::new(), |_, _| async {
        Err(ToolError::Other("backend exploded".to_string()))
    });
    let panicking = ToolDefinition::from_fn("panicking", "Always panics", InputSchema::new(), |_, _| async {
        if true {
            panic!("kaboom");
        }
        Ok(ToolResult::text("unreachable"))
    });
    let server = McpServer::builder(config().build().unwrap())
        .tools([failing, panicking])
        .build();
    let mut client = Client::start(server);

    let response = client.call(1, "failing", json!({})).await;
    assert_eq!(response["result"]["isError"], true);
    assert_eq!(response["result"]["content"][0]["text"], "backend exploded");
    assert!(response.get("error").is_none());

    let response = client.call(2, "panicking", json!({})).await;
    assert_eq!(response["result"]["isError"], true);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("tool panicking failed unexpectedly"), "{}", text);
    assert!(text.contains("kaboom"), "{}", text);

    client
        .send_json(json!({"jsonrpc": "2.0", "id": 3, "method": "ping"}))
        .await;
    let response = client.recv().await;
    assert_eq!(response["id"], 3);
    assert_eq!(response["result"], json!({}));
}

#[tokio::test]
async fn test_concurrent_calls_correlate_out_of_order() {
    let server = McpServer::builder(config().build().unwrap()).tool(sleepy()).build();
    let mut client = Client::start(server);

    client
        .send_json(json!({"jsonrpc": "2.0", "id": "slow", "method": "tools/call",
            "params": {"name": "sleepy", "arguments": {"ms": 300}}}))
        .await;
    client
        .send_json(json!({"jsonrpc": "2.0", "id": "fast", "method": "tools/call",
            "params": {"name": "sleepy", "arguments": {"ms": 0}}}))
        .await;

    let first = client.recv().await;
    let second = client.recv().await;

    assert_eq!(first["id"], "fast");
    assert_eq!(first["result"]["content"][0]["text"], "slept 0");
    assert_eq!(second["id"], "slow");
    assert_eq!(second["result"]["content"][0]["text"], "slept 300");
}

#[tokio::test]
async fn test_same_call_twice_gets_two_responses() {
    let server = McpServer::builder(config().build().unwrap()).tool(echo()).build();
    let mut client = Client::start(server);

    for id in [10, 11] {
        client
            .send_json(json!({"jsonrpc": "2.0", "id": id, "method": "tools/call",
                "params": {"name": "echo", "arguments": {"msg": "again"}}}))
            .await;
    }

    let mut ids = vec![client.recv().await["id"].as_i64().unwrap(), client.recv().await["id"].as_i64().unwrap()];
    ids.sort();
    assert_eq!(ids, vec![10, 11]);
}

#[tokio::test]
async fn test_malformed_lines_and_notifications_are_not_answered() {
    let server = McpServer::builder(config().build().unwrap()).tool(echo()).build();
    let mut client = Client::start(server);

    client.send("{this is not json").await;
    client.send("[1, 2, 3]").await;
    client.send(r#"{"jsonrpc":"2.0","id":4}"#).await;
    client.send("").await;
    client
        .send(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    client
        .send_json(json!({"jsonrpc": "2.0", "id": 5, "method": "ping"}))
        .await;

    let response = client.recv().await;
    assert_eq!(response["id"], 5);
}

#[tokio::test]
async fn test_unknown_method_and_initialize() {
    let server = McpServer::builder(config().build().unwrap()).tool(echo()).build();
    let handle = server.clone();
    let mut client = Client::start(server);

    client
        .send_json(json!({"jsonrpc": "2.0", "id": 1, "method": "prompts/list"}))
        .await;
    let response = client.recv().await;
    assert_eq!(response["error"]["code"], -32601);

    assert_eq!(handle.state(), SessionState::Uninitialized);
    client
        .send_json(json!({"jsonrpc": "2.0", "id": 2, "method": "initialize",
            "params": {"protocolVersion": "2024-11-05", "clientInfo": {"name": "pytest", "version": "1"}}}))
        .await;
    let response = client.recv().await;
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(response["result"]["capabilities"]["tools"]["listChanged"], false);
    assert_eq!(response["result"]["serverInfo"]["name"], "mcp-grafana");
    assert_eq!(handle.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_calls_before_initialize_are_served() {
    let server = McpServer::builder(config().build().unwrap()).tool(echo()).build();
    let mut client = Client::start(server);

    let response = client.call(1, "echo", json!({"msg": "early"})).await;
    assert_eq!(response["result"]["content"][0]["text"], "early");
}

#[tokio::test]
async fn test_eof_drains_in_flight_calls() {
    let server = McpServer::builder(config().build().unwrap()).tool(sleepy()).build();
    let handle = server.clone();
    let mut client = Client::start(server);

    client
        .send_json(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "sleepy", "arguments": {"ms": 100}}}))
        .await;
    client.close_input();

    let response = client.recv().await;
    assert_eq!(response["result"]["content"][0]["text"], "slept 100");
    assert!(client.recv_line().await.is_none());

    assert_ok!(client.finish().await);
    assert_eq!(handle.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_grace_period_abandons_slow_calls() {
    let server = McpServer::builder(config().build().unwrap())
        .tool(sleepy())
        .grace_period(Duration::from_millis(50))
        .build();
    let mut client = Client::start(server);

    client
        .send_json(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/call",
            "params": {"name": "sleepy", "arguments": {"ms": 60000}}}))
        .await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    client.signal_shutdown();

    assert!(client.recv_line().await.is_none());
    assert_ok!(client.finish().await);
}

#[tokio::test]
async fn test_shutdown_signal_stops_reading() {
    let server = McpServer::builder(config().build().unwrap()).tool(echo()).build();
    let mut client = Client::start(server);

    let response = client.call(1, "echo", json!({"msg": "before"})).await;
    assert_eq!(response["result"]["content"][0]["text"], "before");

    client.signal_shutdown();
    assert_ok!(client.finish().await);
}
