//! The advertised input schemas must themselves be valid JSON Schema, and
//! documents they accept must also pass the in-process validator.

use grafana_mcp_core::{FieldSpec, FieldType, InputSchema};
use jsonschema::JSONSchema;
use serde_json::json;

fn loki_schema() -> InputSchema {
    InputSchema::new()
        .required("datasourceUid", FieldType::String, "UID of the Loki datasource")
        .required("logql", FieldType::String, "LogQL query")
        .optional("startRfc3339", FieldType::String, "Start of the range")
        .field(
            FieldSpec::new("limit", FieldType::Integer, "Maximum lines to return").default_value(10),
        )
        .field(
            FieldSpec::new("direction", FieldType::String, "Sort order")
                .one_of(&["forward", "backward"])
                .default_value("backward"),
        )
        .optional("labels", FieldType::array_of(FieldType::String), "Label names")
}

#[test]
fn test_wire_schema_compiles() {
    let wire = loki_schema().to_json_schema();
    assert!(JSONSchema::compile(&wire).is_ok());
}

#[test]
fn test_empty_schema_compiles() {
    let wire = InputSchema::new().to_json_schema();

    assert_eq!(wire, json!({"type": "object", "properties": {}}));
    assert!(JSONSchema::compile(&wire).is_ok());
}

#[test]
fn test_validated_arguments_satisfy_wire_schema() {
    let schema = loki_schema();
    let wire = schema.to_json_schema();
    let compiled = JSONSchema::compile(&wire).unwrap();

    let args = schema
        .validate(Some(&json!({
            "datasourceUid": "loki",
            "logql": "{job=\"api\"}",
            "limit": "25",
        })))
        .unwrap();

    assert!(compiled.is_valid(&args.into_value()));
}

#[test]
fn test_wire_schema_rejects_what_validator_rejects() {
    let schema = loki_schema();
    let wire = schema.to_json_schema();
    let compiled = JSONSchema::compile(&wire).unwrap();
    let bad = json!({"datasourceUid": "loki", "direction": "sideways"});

    assert!(!compiled.is_valid(&bad));

    let err = schema.validate(Some(&bad)).unwrap_err();
    assert_eq!(err.fields(), vec!["logql", "direction"]);
}
