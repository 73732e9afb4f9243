//! Dashboard search

use std::sync::Arc;

use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldSpec, FieldType, InputSchema, ToolDefinition, ToolOutcome};

use super::{backed, fetch_json};

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![backed(
        backend,
        "search_dashboards",
        "Search for dashboards by title or tag",
        InputSchema::new()
            .optional("query", FieldType::String, "Text to match against dashboard titles")
            .optional("tag", FieldType::array_of(FieldType::String), "Only dashboards with all of these tags")
            .field(
                FieldSpec::new("limit", FieldType::Integer, "Maximum number of results")
                    .default_value(50),
            ),
        search_dashboards,
    )]
}

async fn search_dashboards(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let mut request = BackendRequest::get("api/search")
        .query("type", "dash-db")
        .query_opt("query", args.non_empty_str("query"))
        .query_opt("limit", args.opt_i64("limit"));
    for tag in args.str_list("tag") {
        request = request.query("tag", tag);
    }
    fetch_json(backend.as_ref(), request).await
}
