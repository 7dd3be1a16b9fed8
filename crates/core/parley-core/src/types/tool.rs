//! Tool call records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Name used when the service reports a tool without one
pub const UNKNOWN_TOOL: &str = "Unknown Tool";

/// Record of an external lookup or action the assistant performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Tool name
    pub name: String,

    /// Arguments the tool was called with
    #[serde(default)]
    pub parameters: Map<String, Value>,

    /// Tool output, either plain text or a structured value
    #[serde(default)]
    pub result: Value,
}

impl ToolCall {
    /// Create a tool call record
    pub fn new(name: impl Into<String>, parameters: Map<String, Value>, result: Value) -> Self {
        Self {
            name: name.into(),
            parameters,
            result,
        }
    }

    /// Whether the tool produced any output
    pub fn has_result(&self) -> bool {
        match &self.result {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Result as display text: strings verbatim, anything else pretty-printed JSON
    pub fn result_text(&self) -> String {
        match &self.result {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        }
    }

    /// Parameters as pretty-printed JSON
    pub fn parameters_text(&self) -> String {
        serde_json::to_string_pretty(&self.parameters).unwrap_or_else(|_| "{}".to_string())
    }

    /// Read one tool record from the loosely-typed wire shape.
    ///
    /// Accepts `parameters` or `input` for the arguments and `result` or
    /// `output` for the outcome. Non-object entries become a nameless call
    /// whose result is the entry itself.
    pub fn from_wire(entry: &Value) -> Self {
        let Some(obj) = entry.as_object() else {
            return Self::new(UNKNOWN_TOOL, Map::new(), entry.clone());
        };

        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(UNKNOWN_TOOL);

        let parameters = obj
            .get("parameters")
            .or_else(|| obj.get("input"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let result = obj
            .get("result")
            .or_else(|| obj.get("output"))
            .cloned()
            .unwrap_or(Value::Null);

        Self::new(name, parameters, result)
    }

    /// Read a tool list from either an array of records or a
    /// `tool name -> result` object.
    pub fn list_from_wire(value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => items.iter().map(Self::from_wire).collect(),
            Value::Object(by_name) => by_name
                .iter()
                .map(|(name, result)| Self::new(name.clone(), Map::new(), result.clone()))
                .collect(),
            _ => Vec::new(),
        }
    }
}
