//! No-op capability
//!
//! Target of the decision function's fallback. Echoes the task and performs
//! no action.

use async_trait::async_trait;
use sdk::{Capability, ToolError, ToolInput};
use serde_json::{json, Value};

pub const NAME: &str = "noop";

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTool;

#[async_trait]
impl Capability for NoopTool {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Take no action"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task": { "type": "string", "description": "The task that was not matched" }
            }
        })
    }

    async fn execute(&self, input: ToolInput) -> Result<Value, ToolError> {
        Ok(json!({
            "action": NAME,
            "task": input.param_str_opt("task").unwrap_or_default(),
            "message": "No matching action for task",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_echoes_task() {
        let out = NoopTool
            .execute(ToolInput::new().with_param("task", json!("write a poem")))
            .await
            .unwrap();
        assert_eq!(out["task"], "write a poem");
        assert_eq!(out["action"], "noop");
    }

    #[tokio::test]
    async fn test_noop_without_input() {
        let out = NoopTool.execute(ToolInput::new()).await.unwrap();
        assert_eq!(out["task"], "");
    }
}
