//! Mode Coordinator
//!
//! Chooses between running a task through a single execution loop and
//! fanning it out to role-specialized loops, then merges their answers.
//!
//! # Flow
//!
//! 1. Score the task with [`score_task`]
//! 2. Resolve the execution mode (`single`, `multi`, or `auto` by threshold)
//! 3. Single: run the primary loop on the raw task
//! 4. Multi: one subtask per registered role, each run on its own spawned
//!    task, optionally raced against a timeout, then aggregated in role order
//!
//! Specialists share the tool registry and memory store, never mutable
//! aggregation state. Each returns its own [`TaskResult`].

pub mod complexity;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::agent::core::answer_from_observations;
use crate::agent::{AgentStatus, ExecutionLoop, LoopSettings, Reasoner, RuleBasedReasoner, TaskResult};
use crate::conductor::{Plan, PlanManager, PlanStatus};
use crate::memory::Memory;
use crate::tools::ToolRegistry;
use sdk::errors::EngineError;

pub use complexity::{score_task, ComplexityScore, DEFAULT_COMPLEXITY_THRESHOLD};

/// Maximum number of replans during one plan-driven run
pub const MAX_REPLANS: usize = 2;

/// Role order used when merging specialist answers
const ROLE_ORDER: &[&[&str]] = &[&["researcher"], &["planner"], &["executor", "coder"], &["critic"]];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Single,
    Multi,
    Auto,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multi => "multi",
            Self::Auto => "auto",
        }
    }
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "multi" => Ok(Self::Multi),
            "auto" => Ok(Self::Auto),
            other => Err(format!(
                "Invalid execution mode '{}'. Must be one of: single, multi, auto",
                other
            )),
        }
    }
}

/// Resolved coordinator parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinatorSettings {
    pub mode: ExecutionMode,
    pub complexity_threshold: f64,

    /// Per-subtask deadline; `None` waits for every specialist
    pub subtask_timeout: Option<Duration>,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Auto,
            complexity_threshold: DEFAULT_COMPLEXITY_THRESHOLD,
            subtask_timeout: None,
        }
    }
}

/// One role-tagged slice of a decomposed task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subtask {
    pub id: String,
    pub role: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SubtaskOutcome {
    Completed {
        subtask_id: String,
        role: String,
        result: TaskResult,
    },
    Failed {
        subtask_id: String,
        role: String,
        error: String,
    },
}

impl SubtaskOutcome {
    pub fn subtask_id(&self) -> &str {
        match self {
            Self::Completed { subtask_id, .. } | Self::Failed { subtask_id, .. } => subtask_id,
        }
    }

    pub fn role(&self) -> &str {
        match self {
            Self::Completed { role, .. } | Self::Failed { role, .. } => role,
        }
    }

    /// Answer of a specialist run that completed successfully
    pub fn answer(&self) -> Option<&str> {
        match self {
            Self::Completed { result, .. } if result.is_success() => Some(&result.answer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorResult {
    pub task: String,

    /// Mode actually used (`single` or `multi`)
    pub mode: ExecutionMode,

    pub complexity: ComplexityScore,
    pub answer: String,
    pub status: AgentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<TaskResult>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outcomes: Vec<SubtaskOutcome>,

    pub duration_ms: u64,
}

impl CoordinatorResult {
    pub fn outcome(&self, subtask_id: &str) -> Option<&SubtaskOutcome> {
        self.outcomes.iter().find(|o| o.subtask_id() == subtask_id)
    }
}

/// Entry in the coordinator's task history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task: String,
    pub mode: ExecutionMode,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub answer: String,
}

/// Loop registered by the coordinator, as reported by [`ModeCoordinator::list_agents`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    pub role: Option<String>,
    pub primary: bool,
    pub status: AgentStatus,
}

/// Outcome of a plan-driven run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRun {
    pub plan: Plan,
    pub answer: String,
    pub replans: usize,
}

struct Specialist {
    role: String,
    exec: Arc<Mutex<ExecutionLoop>>,
}

pub struct ModeCoordinator {
    settings: CoordinatorSettings,
    primary: ExecutionLoop,
    specialists: Vec<Specialist>,
    tools: Arc<ToolRegistry>,
    reasoner: Arc<dyn Reasoner>,
    memory: Option<Arc<dyn Memory>>,
    plans: PlanManager,
    history: Vec<TaskRecord>,
    last_result: Option<CoordinatorResult>,
}

impl ModeCoordinator {
    pub fn new(settings: CoordinatorSettings, primary: ExecutionLoop) -> Self {
        let tools = Arc::clone(primary.tools());
        Self {
            settings,
            primary,
            specialists: Vec::new(),
            tools,
            reasoner: Arc::new(RuleBasedReasoner),
            memory: None,
            plans: PlanManager::default(),
            history: Vec::new(),
            last_result: None,
        }
    }

    /// Reasoner used by specialists created with [`add_specialist`](Self::add_specialist)
    pub fn with_reasoner(mut self, reasoner: Arc<dyn Reasoner>) -> Self {
        self.reasoner = reasoner;
        self
    }

    /// Memory store attached to specialists created with [`add_specialist`](Self::add_specialist)
    pub fn with_memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_plan_manager(mut self, plans: PlanManager) -> Self {
        self.plans = plans;
        self
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn roles(&self) -> Vec<&str> {
        self.specialists.iter().map(|s| s.role.as_str()).collect()
    }

    /// Build and register a specialist loop for `role`
    ///
    /// The agent name defaults to `<role>-agent`.
    pub fn add_specialist(&mut self, role: impl Into<String>, mut settings: LoopSettings) {
        let role = role.into();
        if settings.name.is_none() {
            settings.name = Some(format!("{}-agent", role));
        }

        let mut exec = ExecutionLoop::new(settings, Arc::clone(&self.reasoner), Arc::clone(&self.tools));
        if let Some(memory) = &self.memory {
            exec = exec.with_memory(Arc::clone(memory));
        }
        self.add_specialist_loop(role, exec);
    }

    /// Register a prebuilt loop; an existing loop for the same role is replaced
    pub fn add_specialist_loop(&mut self, role: impl Into<String>, exec: ExecutionLoop) {
        let role = role.into();
        info!("Adding {} specialist {}", role, exec.agent().name());

        let exec = Arc::new(Mutex::new(exec));
        match self.specialists.iter_mut().find(|s| s.role == role) {
            Some(existing) => {
                warn!("Replacing existing specialist for role {}", role);
                existing.exec = exec;
            }
            None => self.specialists.push(Specialist { role, exec }),
        }
    }

    fn specialist(&self, role: &str) -> Option<&Arc<Mutex<ExecutionLoop>>> {
        self.specialists
            .iter()
            .find(|s| s.role == role)
            .map(|s| &s.exec)
    }

    /// Pick `single` or `multi` for a scored task
    fn resolve_mode(&self, score: &ComplexityScore) -> ExecutionMode {
        match self.settings.mode {
            ExecutionMode::Single => ExecutionMode::Single,
            ExecutionMode::Multi => {
                if self.specialists.is_empty() {
                    warn!("No specialists registered, falling back to single mode");
                    ExecutionMode::Single
                } else {
                    ExecutionMode::Multi
                }
            }
            ExecutionMode::Auto => {
                if score.total() < self.settings.complexity_threshold {
                    info!(
                        "Task complexity {:.1} below threshold {:.1}, using single mode",
                        score.total(),
                        self.settings.complexity_threshold
                    );
                    ExecutionMode::Single
                } else if self.specialists.is_empty() {
                    warn!(
                        "Task complexity {:.1} reaches threshold {:.1} but no specialists are registered",
                        score.total(),
                        self.settings.complexity_threshold
                    );
                    ExecutionMode::Single
                } else {
                    info!(
                        "Task complexity {:.1} reaches threshold {:.1}, using multi mode",
                        score.total(),
                        self.settings.complexity_threshold
                    );
                    ExecutionMode::Multi
                }
            }
        }
    }

    /// Run a task in the configured mode
    pub async fn execute(&mut self, task: &str) -> CoordinatorResult {
        let started_at = Utc::now();
        let start = Instant::now();

        let complexity = score_task(task);
        debug!("Complexity of '{}': {:?}", task, complexity);

        let mode = self.resolve_mode(&complexity);
        let mut result = match mode {
            ExecutionMode::Multi => self.execute_multi(task, complexity).await,
            _ => self.execute_single(task, complexity).await,
        };
        result.duration_ms = start.elapsed().as_millis() as u64;

        self.history.push(TaskRecord {
            task: task.to_string(),
            mode: result.mode,
            started_at,
            duration_ms: result.duration_ms,
            answer: result.answer.clone(),
        });
        self.last_result = Some(result.clone());

        result
    }

    async fn execute_single(&mut self, task: &str, complexity: ComplexityScore) -> CoordinatorResult {
        let primary = self.primary.execute(task).await;

        CoordinatorResult {
            task: task.to_string(),
            mode: ExecutionMode::Single,
            complexity,
            answer: primary.answer.clone(),
            status: primary.status,
            primary: Some(primary),
            subtasks: Vec::new(),
            outcomes: Vec::new(),
            duration_ms: 0,
        }
    }

    async fn execute_multi(&mut self, task: &str, complexity: ComplexityScore) -> CoordinatorResult {
        let subtasks = self.decompose(task);
        info!("Task decomposed into {} subtasks", subtasks.len());

        let outcomes = self.dispatch(&subtasks).await;
        let answer = aggregate(&outcomes);

        let status = if answer.is_empty() {
            AgentStatus::Error
        } else {
            AgentStatus::Completed
        };
        let answer = if answer.is_empty() {
            format!("Unable to process task: {}", task)
        } else {
            answer
        };

        CoordinatorResult {
            task: task.to_string(),
            mode: ExecutionMode::Multi,
            complexity,
            answer,
            status,
            primary: None,
            subtasks,
            outcomes,
            duration_ms: 0,
        }
    }

    /// One subtask per registered role, in registration order
    pub fn decompose(&self, task: &str) -> Vec<Subtask> {
        self.specialists
            .iter()
            .enumerate()
            .map(|(i, specialist)| Subtask {
                id: format!("subtask-{}", i + 1),
                role: specialist.role.clone(),
                description: format!("As a {}, {} {}", specialist.role, role_verb(&specialist.role), task),
            })
            .collect()
    }

    /// Run subtasks on their specialists concurrently
    ///
    /// Outcomes come back in subtask order. Unknown roles and timed-out or
    /// panicked runs become `Failed` entries; the rest are unaffected.
    pub async fn dispatch(&self, subtasks: &[Subtask]) -> Vec<SubtaskOutcome> {
        let deadline = self
            .settings
            .subtask_timeout
            .map(|timeout| tokio::time::Instant::now() + timeout);

        let mut pending: Vec<(&Subtask, Option<JoinHandle<TaskResult>>)> = Vec::with_capacity(subtasks.len());
        for subtask in subtasks {
            let handle = self.specialist(&subtask.role).map(|exec| {
                let exec = Arc::clone(exec);
                let description = subtask.description.clone();
                debug!("Dispatching {} to {}", subtask.id, subtask.role);
                tokio::spawn(async move { exec.lock().await.execute(description).await })
            });
            pending.push((subtask, handle));
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        for (subtask, handle) in pending {
            let failed = |error: String| SubtaskOutcome::Failed {
                subtask_id: subtask.id.clone(),
                role: subtask.role.clone(),
                error,
            };

            let Some(handle) = handle else {
                let err = EngineError::RoleNotFound(subtask.role.clone());
                warn!("{}", err);
                outcomes.push(failed(err.to_string()));
                continue;
            };

            let joined = match deadline {
                Some(deadline) => match tokio::time::timeout_at(deadline, handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        let err = EngineError::SubtaskTimeout {
                            subtask_id: subtask.id.clone(),
                            timeout_ms: self
                                .settings
                                .subtask_timeout
                                .map(|t| t.as_millis() as u64)
                                .unwrap_or_default(),
                        };
                        warn!("{}", err);
                        outcomes.push(failed(err.to_string()));
                        continue;
                    }
                },
                None => handle.await,
            };

            outcomes.push(match joined {
                Ok(result) => SubtaskOutcome::Completed {
                    subtask_id: subtask.id.clone(),
                    role: subtask.role.clone(),
                    result,
                },
                Err(e) => {
                    warn!("Subtask {} did not finish: {}", subtask.id, e);
                    failed(format!("Subtask {} did not finish: {}", subtask.id, e))
                }
            });
        }

        outcomes
    }

    /// Plan-driven execution
    ///
    /// Pulls executable steps from a fresh plan, runs each step's capability
    /// and records the observation, replanning when nothing is executable.
    pub async fn execute_plan(&mut self, task: &str) -> PlanRun {
        let mut plan = self.plans.create_plan(task, json!({ "roles": self.roles() })).await;
        let mut observations = Vec::new();
        let mut replans = 0;

        while plan.status != PlanStatus::Completed {
            match self.plans.get_next_step(&plan).cloned() {
                Some(step) => {
                    debug!("Running step {} with {}", step.id, step.capability);
                    let observation = self.tools.invoke(&step.capability, step.input.clone()).await;
                    self.plans
                        .mark_step_complete(&mut plan, &step.id, observation.to_value());
                    observations.push(observation);
                }
                None if replans < MAX_REPLANS => {
                    replans += 1;
                    let feedback = match &plan.error {
                        Some(error) => format!("Planning failed: {}", error),
                        None => format!(
                            "No executable step among {} pending steps",
                            plan.pending_steps().len()
                        ),
                    };
                    self.plans.replan(&mut plan, &feedback).await;
                }
                None => {
                    warn!("Plan {} stuck after {} replans", plan.id, replans);
                    break;
                }
            }
        }

        let answer = answer_from_observations(&observations)
            .unwrap_or_else(|| format!("Unable to process task: {}", task));

        PlanRun {
            plan,
            answer,
            replans,
        }
    }

    /// Most recent `limit` history entries, oldest first
    pub fn task_history(&self, limit: usize) -> &[TaskRecord] {
        let start = self.history.len().saturating_sub(limit);
        &self.history[start..]
    }

    pub fn last_result(&self) -> Option<&CoordinatorResult> {
        self.last_result.as_ref()
    }

    /// Primary loop followed by every specialist
    pub async fn list_agents(&self) -> Vec<AgentDescriptor> {
        let primary = self.primary.agent();
        let mut agents = vec![AgentDescriptor {
            id: primary.id().to_string(),
            name: primary.name().to_string(),
            role: None,
            primary: true,
            status: primary.status(),
        }];

        for specialist in &self.specialists {
            let exec = specialist.exec.lock().await;
            agents.push(AgentDescriptor {
                id: exec.agent().id().to_string(),
                name: exec.agent().name().to_string(),
                role: Some(specialist.role.clone()),
                primary: false,
                status: exec.agent().status(),
            });
        }

        agents
    }
}

fn role_verb(role: &str) -> &'static str {
    match role {
        "researcher" => "research",
        "planner" => "plan an approach to",
        "executor" | "coder" => "carry out",
        "critic" => "review",
        _ => "handle",
    }
}

fn role_rank(role: &str) -> usize {
    ROLE_ORDER
        .iter()
        .position(|names| names.contains(&role))
        .unwrap_or(ROLE_ORDER.len())
}

/// Merge successful answers as `[role]: answer` blocks in role order
pub fn aggregate(outcomes: &[SubtaskOutcome]) -> String {
    let mut answered: Vec<(&str, &str)> = outcomes
        .iter()
        .filter_map(|o| o.answer().map(|answer| (o.role(), answer)))
        .collect();
    answered.sort_by_key(|(role, _)| role_rank(role));

    answered
        .iter()
        .map(|(role, answer)| format!("[{}]: {}", role, answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{Action, ReasonerError, TaskContext};
    use async_trait::async_trait;

    fn coordinator(settings: CoordinatorSettings) -> ModeCoordinator {
        let tools = Arc::new(ToolRegistry::with_builtins());
        ModeCoordinator::new(settings, ExecutionLoop::rule_based(LoopSettings::named("primary"), tools))
    }

    fn auto(threshold: f64) -> CoordinatorSettings {
        CoordinatorSettings {
            mode: ExecutionMode::Auto,
            complexity_threshold: threshold,
            subtask_timeout: None,
        }
    }

    /// Sleeps in `think` so dispatch timeouts can fire
    struct SlowReasoner(Duration);

    #[async_trait]
    impl Reasoner for SlowReasoner {
        async fn think(&self, _context: &TaskContext) -> Result<String, ReasonerError> {
            tokio::time::sleep(self.0).await;
            Ok("slow".to_string())
        }

        async fn decide(&self, context: &TaskContext) -> Result<Action, ReasonerError> {
            RuleBasedReasoner.decide(context).await
        }

        async fn summarize(&self, context: &TaskContext) -> Result<String, ReasonerError> {
            RuleBasedReasoner.summarize(context).await
        }
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("AUTO".parse::<ExecutionMode>().unwrap(), ExecutionMode::Auto);
        assert_eq!(" multi ".parse::<ExecutionMode>().unwrap(), ExecutionMode::Multi);
        assert!("hybrid".parse::<ExecutionMode>().is_err());
    }

    #[tokio::test]
    async fn test_low_score_runs_primary_only() {
        let mut coord = coordinator(auto(7.0));
        coord.add_specialist("researcher", LoopSettings::default());

        let result = coord.execute("calculate 2+2").await;
        assert_eq!(result.mode, ExecutionMode::Single);
        assert_eq!(result.answer, "4");
        assert!(result.outcomes.is_empty());

        let agents = coord.list_agents().await;
        assert_eq!(agents[0].status, AgentStatus::Completed);
        assert_eq!(agents[1].status, AgentStatus::Initialized);
    }

    #[tokio::test]
    async fn test_high_score_without_roles_falls_back() {
        let mut coord = coordinator(auto(0.0));
        let result = coord.execute("calculate 2+2").await;
        assert_eq!(result.mode, ExecutionMode::Single);
        assert!(result.answer.contains('4'));
    }

    #[tokio::test]
    async fn test_multi_aggregates_in_role_order() {
        let mut coord = coordinator(auto(0.0));
        for role in ["critic", "analyst", "executor", "researcher"] {
            coord.add_specialist(role, LoopSettings::default());
        }

        let result = coord.execute("calculate 6*7").await;
        assert_eq!(result.mode, ExecutionMode::Multi);
        assert_eq!(result.subtasks.len(), 4);
        assert_eq!(result.subtasks[0].id, "subtask-1");
        assert_eq!(result.subtasks[0].description, "As a critic, review calculate 6*7");

        let roles: Vec<&str> = result
            .answer
            .split("\n\n")
            .filter_map(|block| block.strip_prefix('['))
            .filter_map(|block| block.split(']').next())
            .collect();
        assert_eq!(roles, vec!["researcher", "executor", "critic", "analyst"]);
        assert!(result.answer.contains("[executor]: 42"));
    }

    #[tokio::test]
    async fn test_missing_role_is_isolated() {
        let mut coord = coordinator(auto(0.0));
        coord.add_specialist("researcher", LoopSettings::default());

        let subtasks = vec![
            Subtask {
                id: "subtask-1".to_string(),
                role: "researcher".to_string(),
                description: "calculate 1+1".to_string(),
            },
            Subtask {
                id: "subtask-2".to_string(),
                role: "ghost".to_string(),
                description: "calculate 2+2".to_string(),
            },
        ];
        let outcomes = coord.dispatch(&subtasks).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].answer(), Some("2"));
        match &outcomes[1] {
            SubtaskOutcome::Failed { error, subtask_id, .. } => {
                assert_eq!(subtask_id, "subtask-2");
                assert_eq!(error, "No agent available for role: ghost");
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(aggregate(&outcomes), "[researcher]: 2");
    }

    #[tokio::test]
    async fn test_slow_specialist_times_out() {
        let mut coord = coordinator(CoordinatorSettings {
            mode: ExecutionMode::Multi,
            complexity_threshold: 7.0,
            subtask_timeout: Some(Duration::from_millis(50)),
        });
        coord.add_specialist("researcher", LoopSettings::default());

        let tools = Arc::new(ToolRegistry::with_builtins());
        coord.add_specialist_loop(
            "critic",
            ExecutionLoop::new(
                LoopSettings::named("slow-critic"),
                Arc::new(SlowReasoner(Duration::from_millis(500))),
                tools,
            ),
        );

        let result = coord.execute("calculate 1+2").await;
        assert_eq!(result.mode, ExecutionMode::Multi);
        assert_eq!(result.answer, "[researcher]: 3");

        match result.outcome("subtask-2") {
            Some(SubtaskOutcome::Failed { error, .. }) => assert!(error.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_and_last_result() {
        let mut coord = coordinator(CoordinatorSettings {
            mode: ExecutionMode::Single,
            ..Default::default()
        });
        coord.execute("calculate 1+1").await;
        coord.execute("calculate 2+2").await;
        coord.execute("calculate 3+3").await;

        let recent = coord.task_history(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].task, "calculate 2+2");
        assert_eq!(recent[1].answer, "6");
        assert_eq!(coord.task_history(10).len(), 3);
        assert_eq!(coord.last_result().map(|r| r.answer.as_str()), Some("6"));
    }

    #[tokio::test]
    async fn test_execute_plan_runs_every_step() {
        let mut coord = coordinator(CoordinatorSettings::default());
        let run = coord
            .execute_plan("calculate 2*5, then uppercase 'done'")
            .await;

        assert_eq!(run.plan.status, PlanStatus::Completed);
        assert_eq!(run.plan.completed_steps.len(), 2);
        assert_eq!(run.replans, 0);
        assert_eq!(run.answer, "DONE");
        assert_eq!(
            run.plan.result_of("step-1").and_then(|r| r["result"]["result"].as_str()),
            Some("10")
        );
    }

    #[tokio::test]
    async fn test_execute_plan_gives_up_after_replans() {
        let mut coord = coordinator(CoordinatorSettings::default());
        let run = coord.execute_plan("   ").await;

        assert_eq!(run.replans, MAX_REPLANS);
        assert_eq!(run.plan.status, PlanStatus::Error);
        assert_eq!(run.plan.feedback.len(), MAX_REPLANS);
        assert!(run.answer.starts_with("Unable to process task"));
    }
}
