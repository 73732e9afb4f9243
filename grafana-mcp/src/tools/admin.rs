//! Teams and users

use std::sync::Arc;

use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldSpec, FieldType, InputSchema, ToolDefinition, ToolOutcome};

use super::{backed, fetch_json};

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "list_teams",
            "Search for teams in the current organization",
            InputSchema::new().optional("query", FieldType::String, "Team name to search for"),
            list_teams,
        ),
        backed(
            backend,
            "list_users_by_org",
            "List the users of the current organization",
            InputSchema::new()
                .field(FieldSpec::new("page", FieldType::Integer, "Page number, starting at 1").default_value(1))
                .field(FieldSpec::new("perPage", FieldType::Integer, "Users per page").default_value(100)),
            list_users_by_org,
        ),
    ]
}

async fn list_teams(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let request = BackendRequest::get("api/teams/search").query_opt("query", args.non_empty_str("query"));
    fetch_json(backend.as_ref(), request).await
}

async fn list_users_by_org(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let request = BackendRequest::get("api/org/users/lookup")
        .query_opt("page", args.opt_i64("page"))
        .query_opt("perpage", args.opt_i64("perPage"));
    fetch_json(backend.as_ref(), request).await
}
