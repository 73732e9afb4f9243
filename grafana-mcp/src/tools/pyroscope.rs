//! Pyroscope profiles through the Grafana datasource proxy

use std::sync::Arc;

use chrono::Utc;
use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldSpec, FieldType, InputSchema, ToolDefinition, ToolOutcome, ToolResult};
use serde_json::{json, Value};

use super::timerange::TimeRange;
use super::{backed, datasource_proxy, fetch_json};

fn range_fields(schema: InputSchema) -> InputSchema {
    schema
        .optional("startTime", FieldType::String, "Start time, RFC 3339 or relative (default now-1h)")
        .optional("endTime", FieldType::String, "End time, RFC 3339 or relative (default now)")
}

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "list_pyroscope_profile_types",
            "List the profile types available in a Pyroscope datasource",
            range_fields(
                InputSchema::new().required("dataSourceUid", FieldType::String, "UID of the Pyroscope datasource"),
            ),
            list_pyroscope_profile_types,
        ),
        backed(
            backend,
            "fetch_pyroscope_profile",
            "Fetch a profile in DOT format for the given profile type and label matchers",
            range_fields(
                InputSchema::new()
                    .required("dataSourceUid", FieldType::String, "UID of the Pyroscope datasource")
                    .required("profileType", FieldType::String, "Profile type, e.g. process_cpu:cpu:nanoseconds:cpu:nanoseconds")
                    .field(
                        FieldSpec::new("matchers", FieldType::String, "Label matchers, e.g. {service_name=\"api\"}")
                            .default_value("{}"),
                    ),
            )
            .field(FieldSpec::new("maxNodeDepth", FieldType::Integer, "Maximum nodes in the graph").default_value(100)),
            fetch_pyroscope_profile,
        ),
    ]
}

async fn list_pyroscope_profile_types(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let range = TimeRange::resolve(args.opt_str("startTime"), args.opt_str("endTime"), Utc::now())?;
    let body = json!({
        "start": range.start.timestamp_millis(),
        "end": range.end.timestamp_millis(),
    });
    let path = datasource_proxy(
        args.str("dataSourceUid")?,
        &["querier.v1.QuerierService", "ProfileTypes"],
    )?;
    fetch_json(backend.as_ref(), BackendRequest::post(path, body)).await
}

async fn fetch_pyroscope_profile(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let range = TimeRange::resolve(args.opt_str("startTime"), args.opt_str("endTime"), Utc::now())?;
    let matchers = args.non_empty_str("matchers").unwrap_or("{}");
    let request = BackendRequest::get(datasource_proxy(args.str("dataSourceUid")?, &["pyroscope", "render"])?)
        .query("query", format!("{}{}", args.str("profileType")?, matchers))
        .query("from", range.start.timestamp_millis())
        .query("until", range.end.timestamp_millis())
        .query("format", "dot")
        .query("max-nodes", args.opt_i64("maxNodeDepth").unwrap_or(100));

    match backend.call(request).await? {
        Value::String(dot) => Ok(ToolResult::text(dot)),
        Value::Null => Ok(ToolResult::text("No profile data in the requested range")),
        other => ToolResult::json(&other),
    }
}
