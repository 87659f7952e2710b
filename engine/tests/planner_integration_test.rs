//! Integration tests for the plan manager

use async_trait::async_trait;
use foreman_engine::conductor::{
    parse_steps, Plan, PlanManager, PlanStatus, PlanningError, Step, StepGenerator,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Generator backed by canned JSON, standing in for a model
struct JsonGenerator {
    initial: &'static str,
    revised: &'static str,
}

#[async_trait]
impl StepGenerator for JsonGenerator {
    async fn generate(&self, _task: &str, _context: &Value) -> Result<Vec<Step>, PlanningError> {
        parse_steps(self.initial)
    }

    async fn regenerate(&self, _plan: &Plan, _feedback: &str) -> Result<Vec<Step>, PlanningError> {
        parse_steps(self.revised)
    }
}

fn manager(initial: &'static str, revised: &'static str) -> PlanManager {
    PlanManager::new(Arc::new(JsonGenerator { initial, revised }))
}

const FAN_OUT: &str = r#"[
    {"id": "s1", "description": "calculate 1+1"},
    {"id": "s2", "description": "calculate 2+2", "dependencies": ["s1"]},
    {"id": "s3", "description": "reverse 'abc'", "dependencies": ["s1"]}
]"#;

#[tokio::test]
async fn test_dependency_gating_scenario() {
    let pm = manager(FAN_OUT, "[]");
    let mut plan = pm.create_plan("fan out", json!({})).await;

    assert_eq!(pm.get_next_step(&plan).map(|s| s.id.as_str()), Some("s1"));

    assert!(pm.mark_step_complete(&mut plan, "s1", json!("2")));
    let next = pm.get_next_step(&plan).map(|s| s.id.clone()).unwrap();
    assert!(next == "s2" || next == "s3");

    assert!(pm.mark_step_complete(&mut plan, "s3", json!("cba")));
    assert_eq!(pm.get_next_step(&plan).map(|s| s.id.as_str()), Some("s2"));
    assert!(pm.mark_step_complete(&mut plan, "s2", json!("4")));

    assert_eq!(plan.status, PlanStatus::Completed);
    assert_eq!(plan.current_step, 3);
    assert!(pm.get_next_step(&plan).is_none());
}

#[tokio::test]
async fn test_repeated_completion_is_idempotent() {
    let pm = manager(FAN_OUT, "[]");
    let mut plan = pm.create_plan("fan out", json!({})).await;

    pm.mark_step_complete(&mut plan, "s1", json!("2"));
    let cursor = plan.current_step;
    let completed = plan.completed_steps.len();

    pm.mark_step_complete(&mut plan, "s1", json!("2"));
    assert_eq!(plan.current_step, cursor);
    assert_eq!(plan.completed_steps.len(), completed);
}

#[tokio::test]
async fn test_replan_recovers_blocked_plan() {
    let pm = manager(
        r#"[{"id": "a", "description": "calculate 1+1"},
            {"id": "b", "description": "calculate 2+2", "dependencies": ["never"]}]"#,
        r#"[{"id": "b", "description": "calculate 2+2", "dependencies": ["a"]}]"#,
    );
    let mut plan = pm.create_plan("blocked", json!({"source": "test"})).await;

    let first = pm.get_next_step(&plan).cloned().unwrap();
    pm.mark_step_complete(&mut plan, &first.id, json!("2"));
    assert!(pm.get_next_step(&plan).is_none());
    assert_ne!(plan.status, PlanStatus::Completed);

    assert!(pm.replan(&mut plan, "b depends on a missing step").await);
    assert_eq!(plan.status, PlanStatus::Updated);
    assert_eq!(plan.revision, 1);
    assert_eq!(plan.current_step, 1);
    assert_eq!(plan.steps[0].id, "a");

    let next = pm.get_next_step(&plan).cloned().unwrap();
    assert_eq!(next.id, "r1-b");
    assert_eq!(next.dependencies, vec!["a"]);

    pm.mark_step_complete(&mut plan, &next.id, json!("4"));
    assert_eq!(plan.status, PlanStatus::Completed);
    assert_eq!(plan.result_of("a"), Some(&json!("2")));
    assert_eq!(plan.context["source"], "test");
}

#[tokio::test]
async fn test_unparseable_output_marks_plan_error() {
    let pm = manager("I could not come up with a plan.", "[]");
    let plan = pm.create_plan("anything", json!({})).await;

    assert_eq!(plan.status, PlanStatus::Error);
    assert!(plan.error.is_some());
    assert!(plan.steps.is_empty());
}

#[tokio::test]
async fn test_sequential_plan_for_compound_task() {
    let pm = PlanManager::sequential();
    let plan = pm
        .create_plan("calculate 2+3; then reverse 'stressed'", json!({}))
        .await;

    assert_eq!(plan.status, PlanStatus::Created);
    assert_eq!(plan.steps.len(), 2);
    assert_eq!(plan.steps[1].dependencies, vec!["step-1"]);
    assert_eq!(plan.steps[1].input["text"], "stressed");
}
