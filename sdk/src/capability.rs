//! Capability trait
//!
//! A capability is a named unit of external action. The engine never calls a
//! capability directly; it goes through the tool registry, which converts
//! every failure into a structured observation.

use crate::types::{ToolError, ToolInput};
use async_trait::async_trait;
use serde_json::Value;

/// Trait that every capability must implement
#[async_trait]
pub trait Capability: Send + Sync {
    /// Returns the name the capability is registered under
    fn name(&self) -> &str;

    /// Returns a short human-readable description
    fn description(&self) -> &str;

    /// Returns a JSON schema describing the accepted parameters
    fn parameters_schema(&self) -> Value {
        serde_json::json!({ "type": "object", "properties": {} })
    }

    /// Run the capability
    ///
    /// Implementations may fail freely; the registry records the failure as
    /// an error observation and never retries.
    async fn execute(&self, input: ToolInput) -> Result<Value, ToolError>;
}

/// Introspection record for a capability
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CapabilityInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl CapabilityInfo {
    pub fn of(capability: &dyn Capability) -> Self {
        Self {
            name: capability.name().to_string(),
            description: capability.description().to_string(),
            parameters: capability.parameters_schema(),
        }
    }
}
