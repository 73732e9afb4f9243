//! Alert rules and contact points

use std::sync::Arc;

use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldSpec, FieldType, InputSchema, ToolDefinition, ToolError, ToolOutcome, ToolResult};
use serde::Serialize;
use serde_json::Value;

use super::{api_path, backed, fetch_json};

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "list_alert_rules",
            "List alert rules with their UID, title, folder, group and labels",
            InputSchema::new()
                .field(FieldSpec::new("limit", FieldType::Integer, "Rules per page").default_value(100))
                .field(FieldSpec::new("page", FieldType::Integer, "Page number, starting at 1").default_value(1)),
            list_alert_rules,
        ),
        backed(
            backend,
            "get_alert_rule_by_uid",
            "Get the full configuration of one alert rule",
            InputSchema::new().required("uid", FieldType::String, "UID of the alert rule"),
            get_alert_rule_by_uid,
        ),
        backed(
            backend,
            "list_contact_points",
            "List notification contact points",
            InputSchema::new()
                .optional("name", FieldType::String, "Only contact points with this name")
                .optional("limit", FieldType::Integer, "Maximum number of contact points"),
            list_contact_points,
        ),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRuleSummary {
    pub uid: String,
    pub title: String,
    #[serde(rename = "folderUID")]
    pub folder_uid: String,
    #[serde(rename = "ruleGroup")]
    pub rule_group: String,
    pub labels: Value,
}

pub fn summarize_rules(rules: &Value, limit: usize, page: usize) -> Result<Vec<AlertRuleSummary>, ToolError> {
    let items = rules
        .as_array()
        .ok_or_else(|| ToolError::Decode("expected a list of alert rules".to_string()))?;
    let text = |rule: &Value, key: &str| {
        rule.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    Ok(items
        .iter()
        .skip(page.saturating_sub(1).saturating_mul(limit))
        .take(limit)
        .map(|rule| AlertRuleSummary {
            uid: text(rule, "uid"),
            title: text(rule, "title"),
            folder_uid: text(rule, "folderUID"),
            rule_group: text(rule, "ruleGroup"),
            labels: rule.get("labels").cloned().unwrap_or(Value::Null),
        })
        .collect())
}

async fn list_alert_rules(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let rules = backend
        .call(BackendRequest::get("api/v1/provisioning/alert-rules"))
        .await?;
    let limit = args.opt_i64("limit").unwrap_or(100).max(1) as usize;
    let page = args.opt_i64("page").unwrap_or(1).max(1) as usize;

    ToolResult::json(&summarize_rules(&rules, limit, page)?)
}

async fn get_alert_rule_by_uid(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let path = api_path(["api", "v1", "provisioning", "alert-rules", args.str("uid")?])?;
    fetch_json(backend.as_ref(), BackendRequest::get(path)).await
}

async fn list_contact_points(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let request = BackendRequest::get("api/v1/provisioning/contact-points")
        .query_opt("name", args.non_empty_str("name"));
    let mut points = backend.call(request).await?;

    if let (Some(limit), Some(items)) = (args.opt_i64("limit").filter(|l| *l > 0), points.as_array_mut()) {
        items.truncate(limit as usize);
    }
    ToolResult::json(&points)
}
