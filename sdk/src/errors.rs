//! Error types and handling
//!
//! This module provides the error types used throughout the Foreman engine.
//! All errors implement the `EngineErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! Component boundaries convert these errors into structured results (tool
//! observations, plan status, failed memory lookups). Only configuration
//! errors are allowed to abort process startup.

use thiserror::Error;

/// Trait for engine error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait EngineErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors are absorbed at a component boundary and the task
    /// keeps running. Non-recoverable errors stop the process at startup.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Tool**: Unknown capability or failed invocation
/// - **Reasoning**: The reasoning collaborator failed to produce a thought or action
/// - **Planning**: The planning collaborator failed to produce a plan
/// - **Memory**: Persistent memory I/O failure
/// - **Coordination**: Missing role or slow specialist
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, EngineErrorExt};
///
/// let error = EngineError::ToolNotFound("weather".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("bad mode".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Tool errors
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool error: {0}")]
    ToolError(String),

    // Reasoning collaborator errors
    #[error("Reasoning error: {0}")]
    Reasoning(String),

    // Planning errors
    #[error("Planning error: {0}")]
    Planning(String),

    // Memory errors
    #[error("Memory error: {0}")]
    Memory(String),

    // Coordination errors
    #[error("No agent available for role: {0}")]
    RoleNotFound(String),

    #[error("Subtask {subtask_id} timed out after {timeout_ms}ms")]
    SubtaskTimeout { subtask_id: String, timeout_ms: u64 },

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::ToolNotFound(_) => "The requested tool is not available",
            Self::ToolError(_) => "Tool operation failed",

            Self::Reasoning(_) => "The agent could not decide how to proceed. Try rephrasing the task",

            Self::Planning(_) => "Plan generation failed. The plan can be revised with feedback",

            Self::Memory(_) => "Memory storage is unavailable. The task continues without it",

            Self::RoleNotFound(_) => "No specialist is configured for this role",
            Self::SubtaskTimeout { .. } => "A specialist took too long and its result was discarded",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
