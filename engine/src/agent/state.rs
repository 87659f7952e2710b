//! Agent identity and lifecycle record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Lifecycle state of an agent
///
/// `Completed` and `Error` are terminal for one run; a new run resets the
/// agent to `Executing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Initialized,
    Executing,
    Completed,
    Error,
}

impl AgentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialized => "initialized",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Timestamped entry in an agent's action log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub details: Value,
}

/// Snapshot returned by [`Agent::info`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub status: AgentStatus,
    pub history_length: usize,
}

/// Identity, lifecycle state and append-only action log of one agent
#[derive(Debug, Clone)]
pub struct Agent {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    status: AgentStatus,
    history: Vec<ActionRecord>,
    config: Map<String, Value>,
}

impl Agent {
    /// Create an agent. Without a name, one is derived from the id.
    pub fn new(name: Option<String>) -> Self {
        let id = Uuid::new_v4().to_string();
        let name = name.unwrap_or_else(|| format!("agent-{}", &id[..8]));

        Self {
            id,
            name,
            created_at: Utc::now(),
            status: AgentStatus::Initialized,
            history: Vec::new(),
            config: Map::new(),
        }
    }

    pub fn with_config(mut self, config: Map<String, Value>) -> Self {
        self.config = config;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.config
    }

    pub fn update_state(&mut self, status: AgentStatus) {
        self.status = status;
    }

    /// Append an entry to the action log
    pub fn log_action(&mut self, action: impl Into<String>, details: Value) {
        self.history.push(ActionRecord {
            timestamp: Utc::now(),
            action: action.into(),
            details,
        });
    }

    pub fn info(&self) -> AgentInfo {
        AgentInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            status: self.status,
            history_length: self.history.len(),
        }
    }
}
