//! Execution Loop
//!
//! Drives one agent through the think-decide-act-observe cycle for a task:
//!
//! 1. Ask the reasoner for a thought
//! 2. Ask the reasoner for an action (capability name plus input)
//! 3. Invoke the capability through the tool registry and record the observation
//! 4. Stop when the termination predicate holds or the iteration budget is spent
//! 5. Derive the final answer from the richest observation available
//!
//! # Limits
//!
//! - At most `max_iterations` iterations per task (default 10)
//! - Tool failures are observations, never loop failures
//! - Reasoner failures and panics, summaries included, end the run in the
//!   `Error` state
//!
//! `execute` never returns an error; every outcome is a [`TaskResult`].

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::context::{Action, TaskContext};
use super::reasoner::{Reasoner, ReasonerError, RuleBasedReasoner};
use super::state::{Agent, AgentStatus};
use crate::memory::Memory;
use crate::tools::{noop, ToolRegistry};
use sdk::errors::EngineError;
use sdk::Observation;

/// Default maximum number of iterations per task
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

/// Resolved parameters for one execution loop
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    /// Agent name; derived from the agent id when absent
    pub name: Option<String>,

    pub max_iterations: usize,

    /// Capabilities resolved eagerly when the loop is built
    pub tools: Vec<String>,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            name: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tools: Vec::new(),
        }
    }
}

impl LoopSettings {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }
}

/// Outcome of one loop run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Task ID
    pub task_id: String,

    /// Original task text
    pub task: String,

    /// Final answer
    pub answer: String,

    /// Terminal state of the run
    pub status: AgentStatus,

    /// Number of iterations started
    pub iterations: usize,

    /// Duration in milliseconds
    pub duration_ms: u64,

    pub agent_id: String,
    pub agent_name: String,

    /// Full thought/action/observation record
    pub context: TaskContext,
}

impl TaskResult {
    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Completed
    }
}

/// One agent's think-decide-act-observe loop
pub struct ExecutionLoop {
    agent: Agent,
    max_iterations: usize,
    reasoner: Arc<dyn Reasoner>,
    tools: Arc<ToolRegistry>,
    memory: Option<Arc<dyn Memory>>,
}

impl ExecutionLoop {
    /// Create a new execution loop
    pub fn new(
        settings: LoopSettings,
        reasoner: Arc<dyn Reasoner>,
        tools: Arc<ToolRegistry>,
    ) -> Self {
        let mut config = Map::new();
        config.insert("max_iterations".to_string(), json!(settings.max_iterations));
        config.insert("tools".to_string(), json!(settings.tools));

        let mut agent = Agent::new(settings.name).with_config(config);

        for tool in &settings.tools {
            let loaded = tools.resolve(tool).is_some();
            if !loaded {
                warn!("Agent {} could not load tool {}", agent.name(), tool);
            }
            agent.log_action(
                "load_tool",
                json!({ "tool_name": tool, "status": if loaded { "success" } else { "error" } }),
            );
        }

        Self {
            agent,
            max_iterations: settings.max_iterations,
            reasoner,
            tools,
            memory: None,
        }
    }

    /// Create a loop driven by the built-in rule-based reasoner
    pub fn rule_based(settings: LoopSettings, tools: Arc<ToolRegistry>) -> Self {
        Self::new(settings, Arc::new(RuleBasedReasoner), tools)
    }

    /// Attach a memory store that receives a trace of every iteration
    pub fn with_memory(mut self, memory: Arc<dyn Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Run a task to a terminal state
    pub async fn execute(&mut self, task: impl Into<String>) -> TaskResult {
        let task = task.into();
        let task_id = Uuid::new_v4().to_string();
        let start_time = Instant::now();

        info!(
            "Agent {} starting task {}: {}",
            self.agent.name(),
            task_id,
            task
        );

        self.agent.update_state(AgentStatus::Executing);
        self.agent
            .log_action("start", json!({ "task_id": task_id, "task": task }));

        let mut context = TaskContext::new(task.clone());

        let outcome = AssertUnwindSafe(self.run_iterations(&task_id, &mut context))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(ReasonerError::Failed("reasoner panicked".to_string())));

        let outcome = match outcome {
            Ok(()) => AssertUnwindSafe(self.final_answer(&context))
                .catch_unwind()
                .await
                .unwrap_or_else(|_| {
                    Err(ReasonerError::Failed(
                        "reasoner panicked while summarizing".to_string(),
                    ))
                }),
            Err(e) => Err(e),
        };

        let (status, answer) = match outcome {
            Ok(answer) => (AgentStatus::Completed, answer),
            Err(e) => {
                let err = EngineError::Reasoning(e.to_string());
                error!("Task {} failed: {}", task_id, err);
                (AgentStatus::Error, format!("Unable to process task: {}", e))
            }
        };

        self.agent.update_state(status);
        self.agent
            .log_action("finish", json!({ "task_id": task_id, "status": status }));
        self.record_result(&task_id, &task, &answer);

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let iterations = context.thoughts.len();

        info!(
            "Task {} {} in {}ms after {} iterations",
            task_id, status, duration_ms, iterations
        );

        TaskResult {
            task_id,
            task,
            answer,
            status,
            iterations,
            duration_ms,
            agent_id: self.agent.id().to_string(),
            agent_name: self.agent.name().to_string(),
            context,
        }
    }

    /// Execute up to `max_iterations` iterations
    async fn run_iterations(
        &mut self,
        task_id: &str,
        context: &mut TaskContext,
    ) -> Result<(), ReasonerError> {
        for iteration in 0..self.max_iterations {
            debug!(
                "Task {} iteration {}/{}",
                task_id,
                iteration + 1,
                self.max_iterations
            );

            let thought = self.reasoner.think(context).await?;
            context.thoughts.push(thought.clone());

            let action = self.reasoner.decide(context).await?;
            context.actions.push(action.clone());

            let observation = self.tools.invoke(&action.name, action.input.clone()).await;
            context.observations.push(observation.clone());

            self.agent.log_action(
                "iteration",
                json!({
                    "iteration": iteration,
                    "thought": thought,
                    "action": action,
                    "observation": observation,
                }),
            );
            self.record_iteration(task_id, context, iteration, &thought, &action, &observation);

            if self.reasoner.is_satisfied(context) {
                debug!("Task {} satisfied after iteration {}", task_id, iteration + 1);
                break;
            }
        }

        Ok(())
    }

    /// Derive the final answer: the newest useful tool result, else a summary.
    async fn final_answer(&self, context: &TaskContext) -> Result<String, ReasonerError> {
        if let Some(answer) = answer_from_observations(&context.observations) {
            return Ok(answer);
        }

        let summary = self.reasoner.summarize(context).await?;
        if summary.trim().is_empty() {
            return Ok(format!("Unable to process task: {}", context.task));
        }
        Ok(summary)
    }

    fn record_iteration(
        &self,
        task_id: &str,
        context: &TaskContext,
        iteration: usize,
        thought: &str,
        action: &Action,
        observation: &Observation,
    ) {
        let Some(memory) = &self.memory else {
            return;
        };

        let entry = json!({
            "kind": "iteration",
            "agent": self.agent.name(),
            "task_id": task_id,
            "task": context.task,
            "iteration": iteration,
            "thought": thought,
            "action": action,
            "observation": observation,
        });
        if memory.add(entry).is_none() {
            warn!("Failed to record iteration {} of task {}", iteration, task_id);
        }
    }

    fn record_result(&self, task_id: &str, task: &str, answer: &str) {
        let Some(memory) = &self.memory else {
            return;
        };

        let entry = json!({
            "kind": "result",
            "agent": self.agent.name(),
            "task_id": task_id,
            "task": task,
            "answer": answer,
        });
        if memory.add(entry).is_none() {
            warn!("Failed to record result of task {}", task_id);
        }
    }
}

/// Pick the newest successful non-noop observation and render its result.
///
/// A `result` field is preferred over the whole payload.
pub fn answer_from_observations(observations: &[Observation]) -> Option<String> {
    observations
        .iter()
        .rev()
        .filter(|obs| obs.tool() != noop::NAME)
        .find_map(|obs| obs.result())
        .map(|result| match result.get("result") {
            Some(inner) => render(inner),
            None => render(result),
        })
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
