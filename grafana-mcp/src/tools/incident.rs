//! Grafana Incident

use std::sync::Arc;

use grafana_mcp_core::config::INCIDENT_API_PATH;
use grafana_mcp_core::{Arguments, Backend, BackendRequest, FieldSpec, FieldType, InputSchema, ToolDefinition, ToolOutcome};
use serde_json::{json, Value};

use super::{backed, fetch_json};

pub fn tools(backend: &Arc<dyn Backend>) -> Vec<ToolDefinition> {
    vec![
        backed(
            backend,
            "list_incidents",
            "List incidents, newest first, optionally including drills or filtering by status",
            InputSchema::new()
                .field(FieldSpec::new("limit", FieldType::Integer, "Maximum number of incidents").default_value(10))
                .field(FieldSpec::new("drill", FieldType::Boolean, "Include drill incidents").default_value(false))
                .field(
                    FieldSpec::new("status", FieldType::String, "Only incidents with this status")
                        .one_of(&["active", "resolved"]),
                ),
            list_incidents,
        ),
        backed(
            backend,
            "get_incident",
            "Get a single incident by ID",
            InputSchema::new().required("id", FieldType::String, "ID of the incident"),
            get_incident,
        ),
        backed(
            backend,
            "create_incident",
            "Declare a new incident",
            InputSchema::new()
                .required("title", FieldType::String, "Title of the incident")
                .required("severity", FieldType::String, "Severity, e.g. minor or critical")
                .optional("roomPrefix", FieldType::String, "Prefix for the incident chat room")
                .field(FieldSpec::new("isDrill", FieldType::Boolean, "Whether this is a drill").default_value(false))
                .field(
                    FieldSpec::new("status", FieldType::String, "Initial status")
                        .one_of(&["active", "resolved"])
                        .default_value("active"),
                )
                .optional("attachCaption", FieldType::String, "Caption of an attachment")
                .optional("attachUrl", FieldType::String, "URL of an attachment")
                .optional("labels", FieldType::array_of(FieldType::Object), "Labels as {key, label} objects"),
            create_incident,
        ),
    ]
}

fn service(method: &str) -> String {
    format!("{}{}", INCIDENT_API_PATH, method)
}

/// Query string understood by `IncidentsService.QueryIncidents`
pub fn incident_query(drill: bool, status: Option<&str>) -> String {
    let mut query = String::new();
    if !drill {
        query.push_str("isdrill:false");
    }
    if let Some(status) = status {
        if !query.is_empty() {
            query.push(' ');
        }
        query.push_str("status:");
        query.push_str(status);
    }
    query
}

async fn list_incidents(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let body = json!({
        "query": {
            "limit": args.opt_i64("limit").unwrap_or(10),
            "orderDirection": "DESC",
            "queryString": incident_query(args.opt_bool("drill").unwrap_or(false), args.non_empty_str("status")),
        }
    });
    fetch_json(backend.as_ref(), BackendRequest::post(service("IncidentsService.QueryIncidents"), body)).await
}

async fn get_incident(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let body = json!({ "incidentID": args.str("id")? });
    fetch_json(backend.as_ref(), BackendRequest::post(service("IncidentsService.GetIncident"), body)).await
}

async fn create_incident(backend: Arc<dyn Backend>, args: Arguments) -> ToolOutcome {
    let body = json!({
        "title": args.str("title")?,
        "severity": args.str("severity")?,
        "roomPrefix": args.opt_str("roomPrefix").unwrap_or("incident"),
        "isDrill": args.opt_bool("isDrill").unwrap_or(false),
        "status": args.opt_str("status").unwrap_or("active"),
        "attachCaption": args.opt_str("attachCaption").unwrap_or_default(),
        "attachURL": args.opt_str("attachUrl").unwrap_or_default(),
        "labels": args.get("labels").cloned().unwrap_or_else(|| Value::Array(Vec::new())),
    });
    fetch_json(backend.as_ref(), BackendRequest::post(service("IncidentsService.CreateIncident"), body)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incident_query_string() {
        assert_eq!(incident_query(false, None), "isdrill:false");
        assert_eq!(incident_query(false, Some("active")), "isdrill:false status:active");
        assert_eq!(incident_query(true, Some("resolved")), "status:resolved");
        assert_eq!(incident_query(true, None), "");
    }

    #[test]
    fn test_service_path() {
        assert_eq!(
            service("IncidentsService.GetIncident"),
            "api/plugins/grafana-irm-app/resources/api/v1/IncidentsService.GetIncident"
        );
    }
}
