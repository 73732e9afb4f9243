//! Declarative input schemas
//!
//! A tool describes its arguments as an ordered table of [`FieldSpec`]s.
//! The same table is used twice:
//!
//! - [`InputSchema::to_json_schema`] renders it for `tools/list`
//! - [`InputSchema::validate`] checks and coerces incoming arguments before
//!   the handler runs
//!
//! Validation is deliberately lenient about representation (agents often
//! send `"10"` for `10`) and strict about presence, type and enum
//! membership. Every violation is collected, not just the first.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::arguments::Arguments;

/// Type tag for a schema field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array(Box<FieldType>),
}

impl FieldType {
    /// Array of the given item type
    pub fn array_of(item: FieldType) -> Self {
        FieldType::Array(Box::new(item))
    }

    /// JSON Schema `type` keyword
    pub fn json_type(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Object => "object",
            FieldType::Array(_) => "array",
        }
    }

    fn to_json_schema(&self) -> Map<String, Value> {
        let mut schema = Map::new();
        schema.insert("type".into(), json!(self.json_type()));
        if let FieldType::Array(item) = self {
            schema.insert("items".into(), Value::Object(item.to_json_schema()));
        }
        schema
    }

    /// Check `value` against this type, applying lenient coercions
    fn coerce(&self, value: &Value) -> Result<Value, String> {
        match (self, value) {
            (FieldType::String, Value::String(_)) => Ok(value.clone()),
            (FieldType::String, Value::Number(n)) => Ok(Value::String(n.to_string())),

            (FieldType::Integer, Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    Ok(json!(i))
                } else if let Some(f) = n.as_f64().filter(|f| {
                    f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64
                }) {
                    Ok(json!(f as i64))
                } else {
                    Err(format!("expected integer, got {}", n))
                }
            }
            (FieldType::Integer, Value::String(s)) => s
                .trim()
                .parse::<i64>()
                .map(|i| json!(i))
                .map_err(|_| format!("expected integer, got string '{}'", s)),

            (FieldType::Number, Value::Number(_)) => Ok(value.clone()),
            (FieldType::Number, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("expected number, got string '{}'", s)),

            (FieldType::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (FieldType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(format!("expected boolean, got string '{}'", s)),
            },

            (FieldType::Object, Value::Object(_)) => Ok(value.clone()),

            (FieldType::Array(item), Value::Array(items)) => items
                .iter()
                .enumerate()
                .map(|(i, v)| item.coerce(v).map_err(|e| format!("item {}: {}", i, e)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),

            (expected, other) => Err(format!(
                "expected {}, got {}",
                expected.json_type(),
                json_kind(other)
            )),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One row of a tool's input table
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: String,
    /// Allowed values; empty means unconstrained
    pub enum_values: Vec<String>,
    /// Filled in when the field is absent
    pub default: Option<Value>,
}

impl FieldSpec {
    /// An optional field
    pub fn new(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            description: description.into(),
            enum_values: Vec::new(),
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Restrict the field to a fixed set of values
    pub fn one_of(mut self, values: &[&str]) -> Self {
        self.enum_values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    fn check_enum(&self, value: &Value) -> Result<(), String> {
        if self.enum_values.is_empty() {
            return Ok(());
        }
        let candidate = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if self.enum_values.iter().any(|v| *v == candidate) {
            Ok(())
        } else {
            Err(format!(
                "'{}' is not one of [{}]",
                candidate,
                self.enum_values.join(", ")
            ))
        }
    }
}

/// One invalid field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub reason: String,
}

/// Argument validation failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid arguments: {}", describe(.violations))]
pub struct SchemaError {
    pub violations: Vec<FieldViolation>,
}

impl SchemaError {
    fn single(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.into(),
                reason: reason.into(),
            }],
        }
    }

    /// Names of every invalid field
    pub fn fields(&self) -> Vec<&str> {
        self.violations.iter().map(|v| v.field.as_str()).collect()
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("'{}' {}", v.field, v.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Ordered field table describing a tool's arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSchema {
    fields: Vec<FieldSpec>,
}

impl InputSchema {
    /// A schema with no fields
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, replacing any earlier field with the same name
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.retain(|f| f.name != spec.name);
        self.fields.push(spec);
        self
    }

    pub fn required(self, name: &str, field_type: FieldType, description: &str) -> Self {
        self.field(FieldSpec::new(name, field_type, description).required())
    }

    pub fn optional(self, name: &str, field_type: FieldType, description: &str) -> Self {
        self.field(FieldSpec::new(name, field_type, description))
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// JSON Schema advertised in `tools/list`
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for field in &self.fields {
            let mut schema = field.field_type.to_json_schema();
            if !field.description.is_empty() {
                schema.insert("description".into(), json!(field.description));
            }
            if !field.enum_values.is_empty() {
                schema.insert("enum".into(), json!(field.enum_values));
            }
            if let Some(default) = &field.default {
                schema.insert("default".into(), default.clone());
            }
            if field.required {
                required.push(field.name.clone());
            }
            properties.insert(field.name.clone(), Value::Object(schema));
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".into(), json!(required));
        }
        Value::Object(schema)
    }

    /// Validate and coerce raw call arguments
    ///
    /// Absent or `null` arguments count as an empty object. Fields outside
    /// the table pass through untouched.
    pub fn validate(&self, arguments: Option<&Value>) -> Result<Arguments, SchemaError> {
        let mut map = match arguments {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(other) => {
                return Err(SchemaError::single(
                    "arguments",
                    format!("must be an object, got {}", json_kind(other)),
                ))
            }
        };

        let mut violations = Vec::new();

        for field in &self.fields {
            let present = map.get(&field.name).filter(|v| !v.is_null()).cloned();

            match present {
                Some(raw) => {
                    let checked = field
                        .field_type
                        .coerce(&raw)
                        .and_then(|v| field.check_enum(&v).map(|_| v));
                    match checked {
                        Ok(value) => {
                            map.insert(field.name.clone(), value);
                        }
                        Err(reason) => violations.push(FieldViolation {
                            field: field.name.clone(),
                            reason,
                        }),
                    }
                }
                None if field.required => violations.push(FieldViolation {
                    field: field.name.clone(),
                    reason: "is required".to_string(),
                }),
                None => {
                    map.remove(&field.name);
                    if let Some(default) = &field.default {
                        map.insert(field.name.clone(), default.clone());
                    }
                }
            }
        }

        if violations.is_empty() {
            Ok(Arguments::new(map))
        } else {
            Err(SchemaError { violations })
        }
    }
}
