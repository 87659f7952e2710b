//! Plan Manager
//!
//! Builds plans from a task with a [`StepGenerator`], hands out the next
//! executable step, records results and merges replans over completed work.
//!
//! The manager never executes steps itself. Callers pull a step with
//! [`PlanManager::get_next_step`], run it, and push the result back with
//! [`PlanManager::mark_step_complete`].

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::types::{CompletedStep, Plan, PlanStatus, Step};
use crate::agent::reasoner::classify;

#[derive(Debug, thiserror::Error)]
pub enum PlanningError {
    #[error("Step generation failed: {0}")]
    Generation(String),

    #[error("Failed to parse plan steps: {0}")]
    Parse(String),

    #[error("Planner produced no steps for task: {0}")]
    Empty(String),
}

/// Planning collaborator that turns a task into steps
#[async_trait]
pub trait StepGenerator: Send + Sync {
    async fn generate(&self, task: &str, context: &Value) -> Result<Vec<Step>, PlanningError>;

    /// Produce the steps that remain after `plan`'s completed steps
    ///
    /// The default regenerates from the task and drops steps whose
    /// description matches a completed one.
    async fn regenerate(&self, plan: &Plan, _feedback: &str) -> Result<Vec<Step>, PlanningError> {
        let steps = self.generate(&plan.task, &plan.context).await?;
        Ok(steps
            .into_iter()
            .filter(|step| {
                !plan
                    .completed_steps
                    .iter()
                    .any(|done| done.step.description == step.description)
            })
            .collect())
    }
}

static CLAUSE_BOUNDARY: OnceLock<Regex> = OnceLock::new();

fn clause_boundary() -> &'static Regex {
    CLAUSE_BOUNDARY.get_or_init(|| {
        Regex::new(r"(?i)[.!?](?:\s+|$)|;|,?\s+and\s+then\s+|,?\s+then\s+")
            .expect("Invalid clause pattern")
    })
}

/// Split a task into clauses on sequencing words and sentence ends
pub fn split_clauses(task: &str) -> Vec<String> {
    clause_boundary()
        .split(task)
        .map(|clause| {
            let mut clause = clause.trim().trim_matches(',').trim();
            for prefix in ["and then ", "then ", "first ", "finally "] {
                if clause
                    .get(..prefix.len())
                    .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
                {
                    clause = clause[prefix.len()..].trim_start();
                }
            }
            clause.trim_matches(',').trim().to_string()
        })
        .filter(|clause| !clause.is_empty())
        .collect()
}

fn step_name(description: &str) -> String {
    let words: Vec<&str> = description.split_whitespace().take(5).collect();
    words.join(" ")
}

/// Default generator: one step per clause, each depending on the previous
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialStepGenerator;

#[async_trait]
impl StepGenerator for SequentialStepGenerator {
    async fn generate(&self, task: &str, _context: &Value) -> Result<Vec<Step>, PlanningError> {
        let clauses = split_clauses(task);
        if clauses.is_empty() {
            return Err(PlanningError::Empty(task.to_string()));
        }

        let mut steps: Vec<Step> = Vec::with_capacity(clauses.len());
        for (i, clause) in clauses.into_iter().enumerate() {
            let action = classify(&clause);
            let dependencies = steps.last().map(|prev| vec![prev.id.clone()]).unwrap_or_default();
            steps.push(Step {
                id: format!("step-{}", i + 1),
                name: step_name(&clause),
                description: clause,
                capability: action.name,
                input: action.input,
                dependencies,
            });
        }
        Ok(steps)
    }
}

/// Intermediate deserialization type for generated JSON steps
#[derive(Debug, Deserialize)]
struct RawStep {
    id: Option<String>,
    name: Option<String>,
    description: String,
    #[serde(alias = "tool")]
    capability: Option<String>,
    input: Option<Value>,
    #[serde(default)]
    dependencies: Vec<String>,
}

/// Parse a JSON array of steps, tolerating prose around the array.
///
/// Missing ids default to `step-N`; a missing capability is chosen by the
/// task classifier from the step description.
pub fn parse_steps(content: &str) -> Result<Vec<Step>, PlanningError> {
    let trimmed = content.trim();

    let json_str = match (trimmed.find('['), trimmed.rfind(']')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };

    let raw_steps: Vec<RawStep> =
        serde_json::from_str(json_str).map_err(|e| PlanningError::Parse(e.to_string()))?;

    Ok(raw_steps
        .into_iter()
        .enumerate()
        .map(|(i, raw)| {
            let (capability, input) = match raw.capability {
                Some(capability) => (capability, raw.input.unwrap_or(Value::Null)),
                None => {
                    let action = classify(&raw.description);
                    (action.name, raw.input.unwrap_or(action.input))
                }
            };

            Step {
                id: raw.id.unwrap_or_else(|| format!("step-{}", i + 1)),
                name: raw.name.unwrap_or_else(|| step_name(&raw.description)),
                description: raw.description,
                capability,
                input,
                dependencies: raw.dependencies,
            }
        })
        .collect())
}

pub struct PlanManager {
    generator: Arc<dyn StepGenerator>,
}

impl Default for PlanManager {
    fn default() -> Self {
        Self::sequential()
    }
}

impl PlanManager {
    pub fn new(generator: Arc<dyn StepGenerator>) -> Self {
        Self { generator }
    }

    pub fn sequential() -> Self {
        Self::new(Arc::new(SequentialStepGenerator))
    }

    /// Create a plan for a task
    ///
    /// A generator failure yields a plan in the `Error` state that can still
    /// be recovered with [`replan`](Self::replan).
    pub async fn create_plan(&self, task: &str, context: Value) -> Plan {
        let now = Utc::now();
        let mut plan = Plan {
            id: Uuid::new_v4().to_string(),
            task: task.to_string(),
            context,
            steps: Vec::new(),
            current_step: 0,
            completed_steps: Vec::new(),
            status: PlanStatus::Created,
            feedback: Vec::new(),
            error: None,
            revision: 0,
            created_at: now,
            updated_at: now,
        };

        let generated = match self.generator.generate(task, &plan.context).await {
            Ok(steps) if steps.is_empty() => Err(PlanningError::Empty(task.to_string())),
            other => other,
        };

        match generated {
            Ok(steps) => {
                info!("Created plan {} with {} steps", plan.id, steps.len());
                plan.steps = steps;
            }
            Err(e) => {
                error!("Planning failed for task '{}': {}", task, e);
                plan.status = PlanStatus::Error;
                plan.error = Some(e.to_string());
            }
        }

        plan
    }

    /// Next step whose dependencies are all completed
    ///
    /// Prefers the step at the cursor, otherwise scans forward. `None` means
    /// nothing is executable and the caller should replan (or the plan is done).
    pub fn get_next_step<'a>(&self, plan: &'a Plan) -> Option<&'a Step> {
        if plan.status == PlanStatus::Completed {
            return None;
        }

        let done = plan.completed_ids();
        let ready = |step: &Step| {
            !done.contains(step.id.as_str())
                && step.dependencies.iter().all(|dep| done.contains(dep.as_str()))
        };

        let next = plan.steps.iter().skip(plan.current_step).find(|&step| ready(step));
        if next.is_none() && plan.steps.len() > done.len() {
            debug!("No executable step in plan {}", plan.id);
        }
        next
    }

    /// Record a step result
    ///
    /// Returns false for unknown or already completed ids, leaving the plan
    /// untouched. The cursor moves only when the completed step is the one
    /// at the cursor.
    pub fn mark_step_complete(&self, plan: &mut Plan, step_id: &str, result: Value) -> bool {
        if plan.is_step_completed(step_id) {
            debug!("Step {} already completed in plan {}", step_id, plan.id);
            return false;
        }

        let Some(index) = plan.steps.iter().position(|step| step.id == step_id) else {
            warn!("Unknown step {} in plan {}", step_id, plan.id);
            return false;
        };

        plan.completed_steps.push(CompletedStep {
            step: plan.steps[index].clone(),
            result,
            completed_at: Utc::now(),
        });

        if index == plan.current_step {
            plan.current_step += 1;
            while plan
                .steps
                .get(plan.current_step)
                .is_some_and(|step| plan.is_step_completed(&step.id))
            {
                plan.current_step += 1;
            }
        }

        if plan.current_step >= plan.steps.len() {
            info!("Plan {} completed", plan.id);
            plan.status = PlanStatus::Completed;
        }
        plan.updated_at = Utc::now();

        true
    }

    /// Merge newly generated steps after the completed ones
    ///
    /// Completed steps are frozen at the front and the cursor is reset to the
    /// boundary. New step ids are prefixed with the revision so they never
    /// collide with earlier ones. Returns false when generation failed, in
    /// which case the plan moves to `Error` but keeps its steps.
    pub async fn replan(&self, plan: &mut Plan, feedback: &str) -> bool {
        plan.feedback.push(feedback.to_string());
        plan.updated_at = Utc::now();

        let generated = match self.generator.regenerate(plan, feedback).await {
            Ok(steps) => steps,
            Err(e) => {
                error!("Replanning failed for plan {}: {}", plan.id, e);
                plan.status = PlanStatus::Error;
                plan.error = Some(e.to_string());
                return false;
            }
        };

        plan.revision += 1;
        let prefix = format!("r{}-", plan.revision);

        let frozen: Vec<Step> = plan
            .steps
            .iter()
            .filter(|step| plan.is_step_completed(&step.id))
            .cloned()
            .collect();
        let frozen_ids: HashSet<String> = frozen.iter().map(|step| step.id.clone()).collect();
        let new_ids: HashSet<String> = generated.iter().map(|step| step.id.clone()).collect();

        let renamed = generated.into_iter().map(|mut step| {
            step.id = format!("{}{}", prefix, step.id);
            step.dependencies = step
                .dependencies
                .into_iter()
                .filter_map(|dep| {
                    if new_ids.contains(&dep) {
                        Some(format!("{}{}", prefix, dep))
                    } else if frozen_ids.contains(&dep) {
                        Some(dep)
                    } else {
                        warn!("Dropping unknown dependency {} from step {}", dep, step.id);
                        None
                    }
                })
                .collect();
            step
        });

        plan.current_step = frozen.len();
        plan.steps = frozen.into_iter().chain(renamed).collect();
        plan.error = None;
        plan.status = if plan.current_step >= plan.steps.len() {
            PlanStatus::Completed
        } else {
            PlanStatus::Updated
        };

        info!(
            "Replanned {} (revision {}): {} steps, cursor at {}",
            plan.id,
            plan.revision,
            plan.steps.len(),
            plan.current_step
        );

        true
    }
}
