//! Loki queries through the Grafana datasource proxy

use std::sync::Arc;

use chrono::Utc;
use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldSpec, FieldType, InputSchema, ToolDefinition, ToolError, ToolOutcome, ToolResult};
use serde_json::Value;

use super::timerange::TimeRange;
use super::{backed, datasource_proxy};

pub const DEFAULT_LOG_LIMIT: i64 = 10;
pub const MAX_LOG_LIMIT: i64 = 100;

fn range_fields(schema: InputSchema) -> InputSchema {
    schema
        .optional("startTime", FieldType::String, "Start time, RFC 3339 or relative (default now-1h)")
        .optional("endTime", FieldType::String, "End time, RFC 3339 or relative (default now)")
}

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "query_loki_logs",
            "Run a LogQL query and return matching log lines",
            range_fields(
                InputSchema::new()
                    .required("datasourceUid", FieldType::String, "UID of the Loki datasource")
                    .required("logql", FieldType::String, "LogQL query"),
            )
            .field(
                FieldSpec::new("limit", FieldType::Integer, "Maximum number of lines (1-100)")
                    .default_value(DEFAULT_LOG_LIMIT),
            )
            .field(
                FieldSpec::new("direction", FieldType::String, "Order of returned lines")
                    .one_of(&["forward", "backward"])
                    .default_value("backward"),
            ),
            query_loki_logs,
        ),
        backed(
            backend,
            "list_loki_label_names",
            "List the label names present in a Loki datasource",
            range_fields(
                InputSchema::new().required("datasourceUid", FieldType::String, "UID of the Loki datasource"),
            ),
            list_loki_label_names,
        ),
        backed(
            backend,
            "list_loki_label_values",
            "List the values of one label in a Loki datasource",
            range_fields(
                InputSchema::new()
                    .required("datasourceUid", FieldType::String, "UID of the Loki datasource")
                    .required("labelName", FieldType::String, "Label to list values for"),
            ),
            list_loki_label_values,
        ),
    ]
}

/// Clamp a requested line limit into `1..=MAX_LOG_LIMIT`
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    match requested {
        Some(n) if n > 0 => n.min(MAX_LOG_LIMIT),
        _ => DEFAULT_LOG_LIMIT,
    }
}

fn window(args: &Arguments) -> Result<TimeRange, ToolError> {
    TimeRange::resolve(args.opt_str("startTime"), args.opt_str("endTime"), Utc::now())
}

/// Loki timestamps are nanoseconds since the epoch
fn nanos(t: chrono::DateTime<Utc>) -> i64 {
    t.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

fn data(response: Value) -> Result<Value, ToolError> {
    match response {
        Value::Object(mut map) => map
            .remove("data")
            .ok_or_else(|| ToolError::Decode("Loki response has no data field".to_string())),
        _ => Err(ToolError::Decode("expected a Loki response object".to_string())),
    }
}

async fn query_loki_logs(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let range = window(&args)?;
    let request = BackendRequest::get(datasource_proxy(
        args.str("datasourceUid")?,
        &["loki", "api", "v1", "query_range"],
    )?)
        .query("query", args.str("logql")?)
        .query("start", nanos(range.start))
        .query("end", nanos(range.end))
        .query("limit", clamp_limit(args.opt_i64("limit")))
        .query("direction", args.opt_str("direction").unwrap_or("backward"));

    ToolResult::json(&data(backend.call(request).await?)?)
}

async fn list_loki_label_names(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let range = window(&args)?;
    let request = BackendRequest::get(datasource_proxy(args.str("datasourceUid")?, &["loki", "api", "v1", "labels"])?)
        .query("start", nanos(range.start))
        .query("end", nanos(range.end));

    ToolResult::json(&data(backend.call(request).await?)?)
}

async fn list_loki_label_values(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let range = window(&args)?;
    let path = datasource_proxy(
        args.str("datasourceUid")?,
        &["loki", "api", "v1", "label", args.str("labelName")?, "values"],
    )?;
    let request = BackendRequest::get(path)
        .query("start", nanos(range.start))
        .query("end", nanos(range.end));

    ToolResult::json(&data(backend.call(request).await?)?)
}
