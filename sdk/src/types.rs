//! Capability input and observation types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Structured input handed to a capability
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolInput {
    pub params: HashMap<String, Value>,
}

impl ToolInput {
    /// Create an empty ToolInput
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ToolInput from a JSON value
    ///
    /// Objects become the parameter map. Any other value is stored under
    /// the `input` key so that no caller-provided data is dropped.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self {
                params: map.into_iter().collect(),
            },
            Value::Null => Self::default(),
            other => Self::new().with_param("input", other),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a string parameter
    pub fn param_str(&self, key: &str) -> Result<String, ToolError> {
        match self.params.get(key) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(_) => Err(ToolError::InvalidParameter(format!(
                "{} must be a string",
                key
            ))),
            None => Err(ToolError::MissingParameter(key.to_string())),
        }
    }

    /// Get a numeric parameter
    pub fn param_f64(&self, key: &str) -> Result<f64, ToolError> {
        match self.params.get(key) {
            Some(v) => v
                .as_f64()
                .ok_or_else(|| ToolError::InvalidParameter(format!("{} must be a number", key))),
            None => Err(ToolError::MissingParameter(key.to_string())),
        }
    }

    /// Get an optional string parameter
    pub fn param_str_opt(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    /// Get a parameter as a JSON value
    pub fn param_json(&self, key: &str) -> Result<&Value, ToolError> {
        self.params
            .get(key)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Convert back into a JSON object
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Value::Object(map)
    }
}

/// Outcome of a single capability invocation
///
/// The tool registry always produces one of these, so the execution loop
/// receives a well-formed observation even when a capability fails or cannot
/// be found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Observation {
    Success { tool: String, result: Value },
    Error { tool: String, error: String },
}

impl Observation {
    pub fn success(tool: impl Into<String>, result: Value) -> Self {
        Self::Success {
            tool: tool.into(),
            result,
        }
    }

    pub fn error(tool: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Error {
            tool: tool.into(),
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Name of the capability that produced this observation
    pub fn tool(&self) -> &str {
        match self {
            Self::Success { tool, .. } | Self::Error { tool, .. } => tool,
        }
    }

    /// The result payload, if the invocation succeeded
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Success { result, .. } => Some(result),
            Self::Error { .. } => None,
        }
    }

    /// The error message, if the invocation failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error, .. } => Some(error),
        }
    }

    /// Convert to a JSON value
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Capability-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Execution failed: {0}")]
    Execution(String),
}
