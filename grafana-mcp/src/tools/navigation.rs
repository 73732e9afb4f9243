//! Deeplinks into the Grafana UI

use grafana_mcp_core::{Arguments, FieldSpec, FieldType, InputSchema, RequestContext, ToolDefinition, ToolError, ToolOutcome, ToolResult};
use serde_json::json;
use url::Url;

pub fn tools() -> Vec<ToolDefinition> {
    vec![ToolDefinition::from_fn(
        "generate_deeplink",
        "Build a URL to a dashboard, a single panel or the Explore view",
        InputSchema::new()
            .field(
                FieldSpec::new("resourceType", FieldType::String, "What to link to")
                    .one_of(&["dashboard", "panel", "explore"])
                    .required(),
            )
            .optional("dashboardUid", FieldType::String, "Dashboard UID, for dashboard and panel links")
            .optional("panelId", FieldType::Integer, "Panel ID, for panel links")
            .optional("datasourceUid", FieldType::String, "Datasource UID, for Explore links")
            .optional("from", FieldType::String, "Start of the time range, e.g. now-1h")
            .optional("to", FieldType::String, "End of the time range, e.g. now"),
        |args, ctx| async move { generate_deeplink(args, ctx) },
    )]
}

fn generate_deeplink(args: Arguments, ctx: RequestContext) -> ToolOutcome {
    deeplink(&ctx.config().backend.redacted_url(), &args).map(ToolResult::text)
}

/// Build the link; needs no backend call
pub fn deeplink(base_url: &str, args: &Arguments) -> Result<String, ToolError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ToolError::Other(format!("invalid Grafana URL '{}': {}", base_url, e)))?;
    let dashboard_uid = move || {
        args.non_empty_str("dashboardUid")
            .ok_or_else(|| ToolError::invalid_argument("dashboardUid", "is required for this resource type"))
    };

    let mut params: Vec<(&str, String)> = Vec::new();
    let path: Vec<&str> = match args.str("resourceType")? {
        "dashboard" => vec!["d", dashboard_uid()?],
        "panel" => {
            let panel_id = args
                .opt_i64("panelId")
                .ok_or_else(|| ToolError::invalid_argument("panelId", "is required for panel links"))?;
            params.push(("viewPanel", panel_id.to_string()));
            vec!["d", dashboard_uid()?]
        }
        "explore" => {
            let uid = args
                .non_empty_str("datasourceUid")
                .ok_or_else(|| ToolError::invalid_argument("datasourceUid", "is required for Explore links"))?;
            params.push(("left", json!({ "datasource": uid }).to_string()));
            vec!["explore"]
        }
        other => {
            return Err(ToolError::invalid_argument(
                "resourceType",
                format!("unsupported resource type '{}'", other),
            ))
        }
    };

    url.path_segments_mut()
        .map_err(|_| ToolError::Other(format!("Grafana URL '{}' cannot hold a path", base_url)))?
        .pop_if_empty()
        .extend(path);

    for key in ["from", "to"] {
        if let Some(value) = args.non_empty_str(key) {
            params.push((key, value.to_string()));
        }
    }
    url.set_query(None);
    if !params.is_empty() {
        url.query_pairs_mut()
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url.into())
}
