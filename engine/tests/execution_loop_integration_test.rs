//! Integration tests for the execution loop

use async_trait::async_trait;
use foreman_engine::agent::{
    Action, AgentStatus, ExecutionLoop, LoopSettings, Reasoner, ReasonerError, TaskContext,
};
use foreman_engine::memory::{Memory, ShortTermMemory};
use foreman_engine::tools::ToolRegistry;
use sdk::{Capability, ToolError, ToolInput};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::Duration;

fn registry() -> Arc<ToolRegistry> {
    Arc::new(ToolRegistry::with_builtins())
}

/// Capability that always panics
struct ExplodingTool;

#[async_trait]
impl Capability for ExplodingTool {
    fn name(&self) -> &str {
        "explode"
    }

    fn description(&self) -> &str {
        "Panics on every call"
    }

    async fn execute(&self, _input: ToolInput) -> Result<Value, ToolError> {
        panic!("boom")
    }
}

/// Always asks for the same capability and never considers the task done
struct FixedReasoner(&'static str);

#[async_trait]
impl Reasoner for FixedReasoner {
    async fn think(&self, context: &TaskContext) -> Result<String, ReasonerError> {
        Ok(format!("attempt {}", context.iteration()))
    }

    async fn decide(&self, context: &TaskContext) -> Result<Action, ReasonerError> {
        Ok(Action::new(self.0, json!({ "attempt": context.iteration() })))
    }

    async fn summarize(&self, context: &TaskContext) -> Result<String, ReasonerError> {
        Ok(format!("gave up after {} attempts", context.observations.len()))
    }

    fn is_satisfied(&self, _context: &TaskContext) -> bool {
        false
    }
}

/// Panics inside `decide`
struct PanickingReasoner;

#[async_trait]
impl Reasoner for PanickingReasoner {
    async fn think(&self, _context: &TaskContext) -> Result<String, ReasonerError> {
        Ok("thinking".to_string())
    }

    async fn decide(&self, _context: &TaskContext) -> Result<Action, ReasonerError> {
        panic!("reasoner bug")
    }

    async fn summarize(&self, _context: &TaskContext) -> Result<String, ReasonerError> {
        Ok(String::new())
    }
}

/// Never acts usefully, so the answer has to come from `summarize`
struct SummaryReasoner {
    panic_on_summary: bool,
}

#[async_trait]
impl Reasoner for SummaryReasoner {
    async fn think(&self, _context: &TaskContext) -> Result<String, ReasonerError> {
        Ok("nothing to do".to_string())
    }

    async fn decide(&self, context: &TaskContext) -> Result<Action, ReasonerError> {
        Ok(Action::new("noop", json!({ "task": context.task })))
    }

    async fn summarize(&self, _context: &TaskContext) -> Result<String, ReasonerError> {
        if self.panic_on_summary {
            panic!("summary bug")
        }
        Err(ReasonerError::Failed("summary backend down".to_string()))
    }
}

/// Returns an action with no name
struct BlankActionReasoner;

#[async_trait]
impl Reasoner for BlankActionReasoner {
    async fn think(&self, _context: &TaskContext) -> Result<String, ReasonerError> {
        Ok("hmm".to_string())
    }

    async fn decide(&self, _context: &TaskContext) -> Result<Action, ReasonerError> {
        Ok(Action::new("", json!({})))
    }

    async fn summarize(&self, context: &TaskContext) -> Result<String, ReasonerError> {
        Ok(format!("no action after {} attempts", context.observations.len()))
    }
}

#[tokio::test]
async fn test_calculate_scenario() {
    let mut exec = ExecutionLoop::rule_based(LoopSettings::default(), registry());
    let result = exec.execute("calculate 2+2").await;

    assert!(result.is_success());
    assert!(result.answer.contains('4'));
    assert_eq!(result.context.actions[0].name, "calculator");
}

#[tokio::test]
async fn test_text_task_uses_text_capability() {
    let mut exec = ExecutionLoop::rule_based(LoopSettings::default(), registry());
    let result = exec.execute("reverse the text 'stressed'").await;

    assert!(result.is_success());
    assert_eq!(result.answer, "desserts");
}

#[tokio::test]
async fn test_unknown_capability_is_an_observation() {
    let mut exec = ExecutionLoop::new(
        LoopSettings::default().with_max_iterations(3),
        Arc::new(FixedReasoner("does-not-exist")),
        registry(),
    );
    let result = exec.execute("anything").await;

    assert_eq!(result.status, AgentStatus::Completed);
    assert_eq!(result.iterations, 3);
    assert!(result
        .context
        .observations
        .iter()
        .all(|obs| obs.error_message() == Some("Tool not found: does-not-exist")));
    assert_eq!(result.answer, "gave up after 3 attempts");
}

#[tokio::test]
async fn test_capability_panic_is_contained() {
    let tools = registry();
    tools.register(Arc::new(ExplodingTool));

    let mut exec = ExecutionLoop::new(
        LoopSettings::default().with_max_iterations(2),
        Arc::new(FixedReasoner("explode")),
        tools,
    );
    let result = exec.execute("blow up").await;

    assert_eq!(result.status, AgentStatus::Completed);
    assert_eq!(result.iterations, 2);
    assert!(result.context.observations[0]
        .error_message()
        .is_some_and(|e| e.contains("panicked")));
}

#[tokio::test]
async fn test_reasoner_panic_becomes_error_state() {
    let mut exec = ExecutionLoop::new(LoopSettings::default(), Arc::new(PanickingReasoner), registry());
    let result = exec.execute("anything").await;

    assert_eq!(result.status, AgentStatus::Error);
    assert!(result.answer.starts_with("Unable to process task"));
    assert_eq!(exec.agent().status(), AgentStatus::Error);
}

#[tokio::test]
async fn test_loop_is_reusable_across_tasks() {
    let mut exec = ExecutionLoop::rule_based(LoopSettings::named("worker"), registry());

    let first = exec.execute("calculate 10/4").await;
    let second = exec.execute("calculate 3^2").await;

    assert_eq!(first.answer, "2.5");
    assert_eq!(second.answer, "9");
    assert_ne!(first.task_id, second.task_id);
    assert_eq!(first.agent_id, second.agent_id);
    assert_eq!(second.context.thoughts.len(), 1);
}

#[tokio::test]
async fn test_shared_memory_receives_traces_from_every_loop() {
    let memory = Arc::new(ShortTermMemory::new(100, Duration::from_secs(60)));
    let tools = registry();

    for name in ["one", "two"] {
        let mut exec = ExecutionLoop::rule_based(LoopSettings::named(name), Arc::clone(&tools))
            .with_memory(Arc::clone(&memory) as Arc<dyn Memory>);
        exec.execute("calculate 1+1").await;
    }

    let mut query = Map::new();
    query.insert("kind".to_string(), json!("result"));
    let results = memory.search(&query, 10);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].item["agent"], "two");
    assert_eq!(results[1].item["agent"], "one");
}

#[tokio::test]
async fn test_summary_panic_becomes_error_state() {
    let mut exec = ExecutionLoop::new(
        LoopSettings::default().with_max_iterations(2),
        Arc::new(SummaryReasoner {
            panic_on_summary: true,
        }),
        registry(),
    );
    let result = exec.execute("write a poem").await;

    assert_eq!(result.status, AgentStatus::Error);
    assert!(result.answer.starts_with("Unable to process task"));
    assert_eq!(result.iterations, 2);
    assert_eq!(exec.agent().status(), AgentStatus::Error);
    assert_eq!(
        exec.agent().history().last().map(|record| record.action.as_str()),
        Some("finish")
    );
}

#[tokio::test]
async fn test_summary_failure_becomes_error_state() {
    let mut exec = ExecutionLoop::new(
        LoopSettings::default().with_max_iterations(2),
        Arc::new(SummaryReasoner {
            panic_on_summary: false,
        }),
        registry(),
    );
    let result = exec.execute("write a poem").await;

    assert_eq!(result.status, AgentStatus::Error);
    assert!(result.answer.contains("summary backend down"));
    assert_eq!(exec.agent().status(), AgentStatus::Error);
}

#[tokio::test]
async fn test_blank_action_is_an_unknown_capability() {
    let mut exec = ExecutionLoop::new(
        LoopSettings::default().with_max_iterations(2),
        Arc::new(BlankActionReasoner),
        registry(),
    );
    let result = exec.execute("anything").await;

    assert_eq!(result.status, AgentStatus::Completed);
    assert_eq!(result.iterations, 2);
    assert!(result.context.observations[0]
        .error_message()
        .is_some_and(|e| e.starts_with("Tool not found")));
    assert_eq!(result.answer, "no action after 2 attempts");
}
