//! Sift investigations

use std::sync::Arc;

use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldSpec, FieldType, InputSchema, ToolDefinition, ToolOutcome};

use super::{api_path, backed, fetch_json};

const INVESTIGATIONS: [&str; 8] = [
    "api",
    "plugins",
    "grafana-ml-app",
    "resources",
    "sift",
    "api",
    "v1",
    "investigations",
];

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "list_sift_investigations",
            "List recent Sift investigations",
            InputSchema::new()
                .field(FieldSpec::new("limit", FieldType::Integer, "Maximum number of investigations").default_value(10)),
            list_sift_investigations,
        ),
        backed(
            backend,
            "get_sift_investigation",
            "Get a Sift investigation and its analyses by ID",
            InputSchema::new().required("id", FieldType::String, "UUID of the investigation"),
            get_sift_investigation,
        ),
    ]
}

async fn list_sift_investigations(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let request = BackendRequest::get(api_path(INVESTIGATIONS)?)
        .query_opt("limit", args.opt_i64("limit"));
    fetch_json(backend.as_ref(), request).await
}

async fn get_sift_investigation(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let path = api_path(INVESTIGATIONS.into_iter().chain([args.str("id")?]))?;
    fetch_json(backend.as_ref(), BackendRequest::get(path)).await
}
