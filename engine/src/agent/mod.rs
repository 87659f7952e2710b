//! Agent
//!
//! One agent runs one task at a time through an iterative
//! think-decide-act-observe cycle. The reasoning step is pluggable through
//! [`Reasoner`]; capabilities are invoked through the tool registry.

pub mod context;
pub mod core;
pub mod reasoner;
pub mod state;

pub use context::{Action, TaskContext};
pub use core::{ExecutionLoop, LoopSettings, TaskResult, DEFAULT_MAX_ITERATIONS};
pub use reasoner::{classify, Reasoner, ReasonerError, RuleBasedReasoner};
pub use state::{ActionRecord, Agent, AgentInfo, AgentStatus};
