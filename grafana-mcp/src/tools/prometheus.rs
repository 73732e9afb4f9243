//! Prometheus queries through the Grafana datasource proxy

use std::sync::Arc;

use chrono::Utc;
use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldSpec, FieldType, InputSchema, ToolDefinition, ToolError, ToolOutcome, ToolResult};
use regex::Regex;
use serde_json::Value;

use super::timerange::TimeRange;
use super::{backed, datasource_proxy};

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "query_prometheus",
            "Run a PromQL instant or range query against a Prometheus datasource",
            InputSchema::new()
                .required("datasourceUid", FieldType::String, "UID of the Prometheus datasource")
                .required("expr", FieldType::String, "PromQL expression")
                .field(
                    FieldSpec::new("queryType", FieldType::String, "Instant or range query")
                        .one_of(&["instant", "range"])
                        .default_value("range"),
                )
                .optional("startTime", FieldType::String, "Start time, RFC 3339 or relative (default now-1h)")
                .optional("endTime", FieldType::String, "End time, RFC 3339 or relative (default now)")
                .field(
                    FieldSpec::new("stepSeconds", FieldType::Integer, "Resolution of a range query")
                        .default_value(60),
                ),
            query_prometheus,
        ),
        backed(
            backend,
            "list_prometheus_metric_names",
            "List metric names, optionally filtered by a regular expression",
            InputSchema::new()
                .required("datasourceUid", FieldType::String, "UID of the Prometheus datasource")
                .optional("regex", FieldType::String, "Regular expression metric names must match")
                .field(FieldSpec::new("limit", FieldType::Integer, "Names per page").default_value(10))
                .field(FieldSpec::new("page", FieldType::Integer, "Page number, starting at 1").default_value(1)),
            list_prometheus_metric_names,
        ),
        backed(
            backend,
            "list_prometheus_label_values",
            "List the values of one label",
            InputSchema::new()
                .required("datasourceUid", FieldType::String, "UID of the Prometheus datasource")
                .required("labelName", FieldType::String, "Label to list values for")
                .optional("limit", FieldType::Integer, "Maximum number of values"),
            list_prometheus_label_values,
        ),
    ]
}

/// Prometheus wraps every answer in `{"status": ..., "data": ...}`
fn unwrap_data(response: Value) -> Result<Value, ToolError> {
    match response {
        Value::Object(mut map) => map
            .remove("data")
            .ok_or_else(|| ToolError::Decode("Prometheus response has no data field".to_string())),
        _ => Err(ToolError::Decode("expected a Prometheus response object".to_string())),
    }
}

async fn query_prometheus(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let uid = args.str("datasourceUid")?;
    let range = TimeRange::resolve(args.opt_str("startTime"), args.opt_str("endTime"), Utc::now())?;

    let request = match args.opt_str("queryType") {
        Some("instant") => BackendRequest::get(datasource_proxy(uid, &["api", "v1", "query"])?)
            .query("query", args.str("expr")?)
            .query("time", range.end.timestamp()),
        _ => {
            let step = args.opt_i64("stepSeconds").unwrap_or(60);
            if step <= 0 {
                return Err(ToolError::invalid_argument("stepSeconds", "must be positive"));
            }
            BackendRequest::get(datasource_proxy(uid, &["api", "v1", "query_range"])?)
                .query("query", args.str("expr")?)
                .query("start", range.start.timestamp())
                .query("end", range.end.timestamp())
                .query("step", step)
        }
    };

    let data = unwrap_data(backend.call(request).await?)?;
    ToolResult::json(&data)
}

/// Apply the optional regex, then cut out one page
pub fn filter_metric_names(
    names: &[String],
    pattern: Option<&str>,
    limit: usize,
    page: usize,
) -> Result<Vec<String>, ToolError> {
    let regex = pattern
        .map(Regex::new)
        .transpose()
        .map_err(|e| ToolError::invalid_argument("regex", e.to_string()))?;
    let offset = page.saturating_sub(1).saturating_mul(limit);

    Ok(names
        .iter()
        .filter(|name| regex.as_ref().map_or(true, |r| r.is_match(name)))
        .skip(offset)
        .take(limit)
        .cloned()
        .collect())
}

async fn list_prometheus_metric_names(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let uid = args.str("datasourceUid")?;
    let response = backend
        .call(BackendRequest::get(datasource_proxy(uid, &["api", "v1", "label", "__name__", "values"])?))
        .await?;
    let names: Vec<String> = serde_json::from_value(unwrap_data(response)?)?;

    let limit = args.opt_i64("limit").unwrap_or(10).max(1) as usize;
    let page = args.opt_i64("page").unwrap_or(1).max(1) as usize;
    ToolResult::json(&filter_metric_names(&names, args.non_empty_str("regex"), limit, page)?)
}

async fn list_prometheus_label_values(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let uid = args.str("datasourceUid")?;
    let path = datasource_proxy(uid, &["api", "v1", "label", args.str("labelName")?, "values"])?;
    let response = backend
        .call(BackendRequest::get(path))
        .await?;
    let mut values: Vec<String> = serde_json::from_value(unwrap_data(response)?)?;

    if let Some(limit) = args.opt_i64("limit").filter(|l| *l > 0) {
        values.truncate(limit as usize);
    }
    ToolResult::json(&values)
}
