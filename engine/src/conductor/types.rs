//! Plan data model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Created,
    Updated,
    Completed,
    Error,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Completed => "completed",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// One unit of work in a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub id: String,
    pub name: String,
    pub description: String,

    /// Capability that carries out the step
    pub capability: String,

    /// Input handed to the capability
    pub input: Value,

    /// Steps that must be completed before this one is eligible
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// A finished step with its result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedStep {
    pub step: Step,
    pub result: Value,
    pub completed_at: DateTime<Utc>,
}

/// Dependency-gated sequence of steps for one task
///
/// Mutated only through [`PlanManager`](super::PlanManager); callers must
/// serialize access to a single plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: String,
    pub task: String,
    pub context: Value,
    pub steps: Vec<Step>,

    /// Index of the next step in reporting order
    pub current_step: usize,

    pub completed_steps: Vec<CompletedStep>,
    pub status: PlanStatus,

    /// Feedback passed to each replan, oldest first
    pub feedback: Vec<String>,

    /// Message of the most recent planning failure
    pub error: Option<String>,

    pub revision: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    pub fn completed_ids(&self) -> HashSet<&str> {
        self.completed_steps
            .iter()
            .map(|done| done.step.id.as_str())
            .collect()
    }

    pub fn is_step_completed(&self, step_id: &str) -> bool {
        self.completed_steps.iter().any(|done| done.step.id == step_id)
    }

    /// True when every dependency of `step` has been completed
    pub fn dependencies_met(&self, step: &Step) -> bool {
        let done = self.completed_ids();
        step.dependencies.iter().all(|dep| done.contains(dep.as_str()))
    }

    pub fn is_finished(&self) -> bool {
        self.status == PlanStatus::Completed
    }

    /// Steps not yet completed, in plan order
    pub fn pending_steps(&self) -> Vec<&Step> {
        let done = self.completed_ids();
        self.steps
            .iter()
            .filter(|step| !done.contains(step.id.as_str()))
            .collect()
    }

    pub fn result_of(&self, step_id: &str) -> Option<&Value> {
        self.completed_steps
            .iter()
            .find(|done| done.step.id == step_id)
            .map(|done| &done.result)
    }
}
