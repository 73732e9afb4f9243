//! Asserts assertion summaries

use std::sync::Arc;

use chrono::Utc;
use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldType, InputSchema, ToolDefinition, ToolOutcome};
use serde_json::json;

use super::timerange::TimeRange;
use super::{backed, fetch_json};

const ASSERTS_PATH: &str = "api/plugins/grafana-asserts-app/resources/asserts/api-server/v1/assertions/llm-summary";

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![backed(
        backend,
        "get_assertions",
        "Get the assertion summary for an entity over a time range",
        InputSchema::new()
            .required("entityType", FieldType::String, "Entity type, e.g. Service or Node")
            .required("entityName", FieldType::String, "Entity name")
            .optional("env", FieldType::String, "Environment")
            .optional("site", FieldType::String, "Site")
            .optional("namespace", FieldType::String, "Namespace")
            .optional("startTime", FieldType::String, "Start time, RFC 3339 or relative (default now-1h)")
            .optional("endTime", FieldType::String, "End time, RFC 3339 or relative (default now)"),
        get_assertions,
    )]
}

async fn get_assertions(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let range = TimeRange::resolve(args.opt_str("startTime"), args.opt_str("endTime"), Utc::now())?;

    let mut scope = serde_json::Map::new();
    for key in ["env", "site", "namespace"] {
        if let Some(value) = args.non_empty_str(key) {
            scope.insert(key.to_string(), json!(value));
        }
    }

    let body = json!({
        "startTime": range.start.timestamp_millis(),
        "endTime": range.end.timestamp_millis(),
        "entityKeys": [{
            "type": args.str("entityType")?,
            "name": args.str("entityName")?,
            "scope": scope,
        }],
        "suggestionSrcEntities": [],
        "alertCategories": ["saturation", "amend", "anomaly", "failure", "error"],
    });

    fetch_json(backend.as_ref(), BackendRequest::post(ASSERTS_PATH, body)).await
}
