//! Per-task execution context
//!
//! Append-only record of one loop run: the task text plus every thought,
//! action and observation produced so far. Owned by the loop running the task.

use sdk::Observation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An action chosen by the reasoner: a capability name and its input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub input: Value,
}

impl Action {
    pub fn new(name: impl Into<String>, input: Value) -> Self {
        Self {
            name: name.into(),
            input,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    pub task: String,
    pub thoughts: Vec<String>,
    pub actions: Vec<Action>,
    pub observations: Vec<Observation>,
}

impl TaskContext {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            ..Default::default()
        }
    }

    /// Index of the iteration currently in progress (or about to start)
    pub fn iteration(&self) -> usize {
        self.observations.len()
    }

    pub fn last_action(&self) -> Option<&Action> {
        self.actions.last()
    }

    pub fn last_observation(&self) -> Option<&Observation> {
        self.observations.last()
    }

    /// True when the last two iterations chose the same action and saw the
    /// same observation, meaning another iteration cannot make progress.
    pub fn is_stalled(&self) -> bool {
        let (actions, observations) = (&self.actions, &self.observations);
        if actions.len() < 2 || observations.len() < 2 {
            return false;
        }
        actions[actions.len() - 1] == actions[actions.len() - 2]
            && observations[observations.len() - 1] == observations[observations.len() - 2]
    }
}
