//! Foreman Engine Library
//!
//! Core of the foreman task-execution engine. It is used by both the main
//! binary and integration tests.

/// Agent identity, execution context, reasoning and the execution loop
pub mod agent;

/// CLI interface module
pub mod cli;

/// Dependency-aware step planning
pub mod conductor;

/// Configuration management module
pub mod config;

/// Single/multi-loop mode selection and fan-out
pub mod coordinator;

/// Command handlers module
pub mod handlers;

/// Working and persistent memory stores
pub mod memory;

/// Telemetry and Observability
pub mod telemetry;

/// Capability registry and built-in capabilities
pub mod tools;
