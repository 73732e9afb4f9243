//! Validated tool arguments

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ToolError;

/// Arguments after schema validation, as handed to a handler
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Arguments(Map<String, Value>);

impl Arguments {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Required string argument
    pub fn str(&self, name: &str) -> Result<&str, ToolError> {
        self.opt_str(name)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected a string"))
    }

    pub fn opt_str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    /// Optional string argument, treating `""` as absent
    pub fn non_empty_str(&self, name: &str) -> Option<&str> {
        self.opt_str(name).filter(|s| !s.is_empty())
    }

    /// Required integer argument
    pub fn i64(&self, name: &str) -> Result<i64, ToolError> {
        self.opt_i64(name)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected an integer"))
    }

    pub fn opt_i64(&self, name: &str) -> Option<i64> {
        self.0.get(name).and_then(Value::as_i64)
    }

    pub fn opt_f64(&self, name: &str) -> Option<f64> {
        self.0.get(name).and_then(Value::as_f64)
    }

    pub fn opt_bool(&self, name: &str) -> Option<bool> {
        self.0.get(name).and_then(Value::as_bool)
    }

    /// String list argument; absent means empty
    pub fn str_list(&self, name: &str) -> Vec<String> {
        self.0
            .get(name)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Required object argument
    pub fn object(&self, name: &str) -> Result<&Map<String, Value>, ToolError> {
        self.0
            .get(name)
            .and_then(Value::as_object)
            .ok_or_else(|| ToolError::invalid_argument(name, "expected an object"))
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Arguments {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => Arguments::new(map),
            _ => panic!("test arguments must be an object"),
        }
    }

    #[test]
    fn test_typed_getters() {
        let a = args(json!({
            "uid": "abc",
            "empty": "",
            "limit": 5,
            "ratio": 0.5,
            "drill": false,
            "labels": ["job", "instance"],
            "dashboard": {"title": "x"},
        }));

        assert_eq!(a.str("uid").unwrap(), "abc");
        assert_eq!(a.non_empty_str("empty"), None);
        assert_eq!(a.i64("limit").unwrap(), 5);
        assert_eq!(a.opt_f64("ratio"), Some(0.5));
        assert_eq!(a.opt_bool("drill"), Some(false));
        assert_eq!(a.str_list("labels"), vec!["job", "instance"]);
        assert_eq!(a.str_list("missing"), Vec::<String>::new());
        assert!(a.object("dashboard").is_ok());
    }

    #[test]
    fn test_missing_required_getter_names_the_field() {
        let a = Arguments::default();
        let err = a.str("uid").unwrap_err();

        assert_eq!(err.to_string(), "Invalid argument 'uid': expected a string");
    }
}
