//! Dashboards

use std::sync::Arc;

use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldType, InputSchema, ToolDefinition, ToolError, ToolOutcome, ToolResult};
use serde::Serialize;
use serde_json::{json, Value};

use super::{api_path, backed, fetch_json};

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "get_dashboard_by_uid",
            "Retrieve the complete dashboard, including panels, variables and settings",
            InputSchema::new().required("uid", FieldType::String, "UID of the dashboard"),
            get_dashboard_by_uid,
        ),
        backed(
            backend,
            "update_dashboard",
            "Create or update a dashboard from its full JSON model",
            InputSchema::new()
                .required("dashboard", FieldType::Object, "The full dashboard JSON")
                .optional("folderUid", FieldType::String, "UID of the folder to save the dashboard in")
                .optional("message", FieldType::String, "Commit message for the change")
                .optional("overwrite", FieldType::Boolean, "Overwrite a dashboard with the same title or UID")
                .optional("userId", FieldType::Integer, "ID of the user making the change"),
            update_dashboard,
        ),
        backed(
            backend,
            "get_dashboard_panel_queries",
            "List the title, query and datasource of every panel in a dashboard",
            InputSchema::new().required("uid", FieldType::String, "UID of the dashboard"),
            get_dashboard_panel_queries,
        ),
    ]
}

async fn fetch_dashboard(backend: &dyn Backend, uid: &str) -> Result<Value, ToolError> {
    let path = api_path(["api", "dashboards", "uid", uid])?;
    Ok(backend.call(BackendRequest::get(path)).await?)
}

async fn get_dashboard_by_uid(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let dashboard = fetch_dashboard(backend.as_ref(), args.str("uid")?).await?;
    ToolResult::json(&dashboard)
}

async fn update_dashboard(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let mut body = json!({
        "dashboard": args.object("dashboard")?,
        "overwrite": args.opt_bool("overwrite").unwrap_or(false),
    });
    if let Some(folder) = args.non_empty_str("folderUid") {
        body["folderUid"] = json!(folder);
    }
    if let Some(message) = args.non_empty_str("message") {
        body["message"] = json!(message);
    }
    if let Some(user_id) = args.opt_i64("userId") {
        body["userId"] = json!(user_id);
    }

    fetch_json(backend.as_ref(), BackendRequest::post("api/dashboards/db", body)).await
}

async fn get_dashboard_panel_queries(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let response = fetch_dashboard(backend.as_ref(), args.str("uid")?).await?;
    let dashboard = response
        .get("dashboard")
        .ok_or_else(|| ToolError::Decode("response has no dashboard field".to_string()))?;

    ToolResult::json(&panel_queries(dashboard))
}

/// One query found in a dashboard panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelQuery {
    pub title: String,
    pub query: String,
    pub datasource: Value,
}

/// Collect the queries of every panel, descending into collapsed rows
///
/// A panel contributes one entry per target that carries an `expr` or
/// `query` string; the panel's datasource is used when the target has none.
pub fn panel_queries(dashboard: &Value) -> Vec<PanelQuery> {
    let mut out = Vec::new();
    if let Some(panels) = dashboard.get("panels").and_then(Value::as_array) {
        collect_panels(panels, &mut out);
    }
    out
}

fn collect_panels(panels: &[Value], out: &mut Vec<PanelQuery>) {
    for panel in panels {
        let title = panel
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let panel_datasource = panel.get("datasource").cloned().unwrap_or(Value::Null);

        for target in panel.get("targets").and_then(Value::as_array).into_iter().flatten() {
            let query = ["expr", "query"]
                .iter()
                .find_map(|key| target.get(*key).and_then(Value::as_str));
            if let Some(query) = query {
                out.push(PanelQuery {
                    title: title.to_string(),
                    query: query.to_string(),
                    datasource: target
                        .get("datasource")
                        .filter(|d| !d.is_null())
                        .cloned()
                        .unwrap_or_else(|| panel_datasource.clone()),
                });
            }
        }

        if let Some(nested) = panel.get("panels").and_then(Value::as_array) {
            collect_panels(nested, out);
        }
    }
}
