//! Grafana OnCall schedules and users

use std::sync::Arc;

use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldType, InputSchema, ToolDefinition, ToolError, ToolOutcome, ToolResult};
use serde_json::{json, Value};

use super::{api_path, backed, fetch_json};

const ONCALL_API: [&str; 4] = ["api", "plugins", "grafana-oncall-app", "resources"];

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "list_oncall_schedules",
            "List on-call schedules, optionally only those of one team",
            InputSchema::new()
                .optional("teamId", FieldType::String, "Only schedules owned by this team")
                .optional("page", FieldType::Integer, "Page number, starting at 1"),
            list_oncall_schedules,
        ),
        backed(
            backend,
            "list_oncall_users",
            "List OnCall users, or look one up by ID or username",
            InputSchema::new()
                .optional("userId", FieldType::String, "ID of a single user")
                .optional("username", FieldType::String, "Username to look up")
                .optional("page", FieldType::Integer, "Page number, starting at 1"),
            list_oncall_users,
        ),
        backed(
            backend,
            "get_current_oncall_users",
            "List the users currently on call for a schedule",
            InputSchema::new().required("scheduleId", FieldType::String, "ID of the schedule"),
            get_current_oncall_users,
        ),
    ]
}

/// OnCall resource paths always end in a slash
fn oncall_path(rest: &[&str]) -> Result<String, ToolError> {
    api_path(ONCALL_API.into_iter().chain(rest.iter().copied()).chain([""]))
}

async fn list_oncall_schedules(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let request = BackendRequest::get(oncall_path(&["schedules"])?)
        .query_opt("team_id", args.non_empty_str("teamId"))
        .query_opt("page", args.opt_i64("page"));
    fetch_json(backend.as_ref(), request).await
}

async fn list_oncall_users(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let request = match args.non_empty_str("userId") {
        Some(id) => BackendRequest::get(oncall_path(&["users", id])?),
        None => BackendRequest::get(oncall_path(&["users"])?)
            .query_opt("username", args.non_empty_str("username"))
            .query_opt("page", args.opt_i64("page")),
    };
    fetch_json(backend.as_ref(), request).await
}

/// User IDs listed in a schedule's `on_call_now` field
pub fn on_call_now(schedule: &Value) -> Result<Vec<String>, ToolError> {
    let ids = schedule
        .get("on_call_now")
        .and_then(Value::as_array)
        .ok_or_else(|| ToolError::Decode("schedule has no on_call_now field".to_string()))?;
    Ok(ids
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect())
}

async fn get_current_oncall_users(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let schedule_id = args.str("scheduleId")?;
    let schedule = backend
        .call(BackendRequest::get(oncall_path(&["schedules", schedule_id])?))
        .await?;

    let mut users = Vec::new();
    for id in on_call_now(&schedule)? {
        let user = backend
            .call(BackendRequest::get(oncall_path(&["users", id.as_str()])?))
            .await?;
        users.push(user);
    }

    ToolResult::json(&json!({
        "scheduleId": schedule_id,
        "scheduleName": schedule.get("name").cloned().unwrap_or(Value::Null),
        "users": users,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_call_now() {
        let schedule = json!({"id": "S1", "name": "Primary", "on_call_now": ["U1", "U2"]});
        assert_eq!(on_call_now(&schedule).unwrap(), vec!["U1", "U2"]);

        assert!(on_call_now(&json!({"id": "S1"})).is_err());
    }
}
