//! Datasources

use std::sync::Arc;

use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldType, InputSchema, ToolDefinition, ToolError, ToolOutcome, ToolResult};
use serde::Serialize;
use serde_json::Value;

use super::{api_path, backed, fetch_json};

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "list_datasources",
            "List datasources, optionally only those of one type",
            InputSchema::new().optional("type", FieldType::String, "Datasource type, e.g. prometheus or loki"),
            list_datasources,
        ),
        backed(
            backend,
            "get_datasource_by_uid",
            "Get a datasource by its UID",
            InputSchema::new().required("uid", FieldType::String, "UID of the datasource"),
            get_datasource_by_uid,
        ),
        backed(
            backend,
            "get_datasource_by_name",
            "Get a datasource by its name",
            InputSchema::new().required("name", FieldType::String, "Name of the datasource"),
            get_datasource_by_name,
        ),
    ]
}

/// The fields of a datasource worth showing in a listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasourceSummary {
    pub id: i64,
    pub uid: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "isDefault")]
    pub is_default: bool,
}

impl DatasourceSummary {
    fn from_value(value: &Value) -> Self {
        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        Self {
            id: value.get("id").and_then(Value::as_i64).unwrap_or_default(),
            uid: text("uid"),
            name: text("name"),
            kind: text("type"),
            is_default: value
                .get("isDefault")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        }
    }
}

/// Summarize a datasource listing, keeping only entries of `kind` if given
///
/// The type comparison is case-insensitive and matches on substring, so
/// `prom` finds `prometheus`.
pub fn summarize(listing: &Value, kind: Option<&str>) -> Result<Vec<DatasourceSummary>, ToolError> {
    let items = listing
        .as_array()
        .ok_or_else(|| ToolError::Decode("expected a list of datasources".to_string()))?;
    let wanted = kind.map(str::to_ascii_lowercase);

    Ok(items
        .iter()
        .map(DatasourceSummary::from_value)
        .filter(|ds| match &wanted {
            Some(w) => ds.kind.to_ascii_lowercase().contains(w.as_str()),
            None => true,
        })
        .collect())
}

async fn list_datasources(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let listing = backend.call(BackendRequest::get("api/datasources")).await?;
    ToolResult::json(&summarize(&listing, args.non_empty_str("type"))?)
}

async fn get_datasource_by_uid(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let path = api_path(["api", "datasources", "uid", args.str("uid")?])?;
    fetch_json(backend.as_ref(), BackendRequest::get(path)).await
}

async fn get_datasource_by_name(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let path = api_path(["api", "datasources", "name", args.str("name")?])?;
    fetch_json(backend.as_ref(), BackendRequest::get(path)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn listing() -> Value {
        json!([
            {"id": 1, "uid": "prom", "name": "Prometheus", "type": "prometheus", "isDefault": true, "url": "http://prom:9090"},
            {"id": 2, "uid": "loki", "name": "Loki", "type": "loki", "isDefault": false},
        ])
    }

    #[test]
    fn test_summarize_all() {
        let all = summarize(&listing(), None).unwrap();

        assert_eq!(all.len(), 2);
        assert_eq!(all[0].uid, "prom");
        assert!(all[0].is_default);
    }

    #[test]
    fn test_summarize_filters_by_type() {
        let prom = summarize(&listing(), Some("PROM")).unwrap();

        assert_eq!(prom.len(), 1);
        assert_eq!(prom[0].name, "Prometheus");
    }

    #[test]
    fn test_summarize_rejects_non_list() {
        assert!(summarize(&json!({"message": "nope"}), None).is_err());
    }
}
