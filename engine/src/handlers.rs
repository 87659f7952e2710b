//! Command handlers for CLI operations
//!
//! - run: execute a task through the mode coordinator
//! - plan: build a step plan and execute it
//! - tools: list available capabilities
//! - memory stats: report memory store statistics
//! - config show/path: print the resolved configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::agent::{AgentStatus, ExecutionLoop};
use crate::config::Config;
use crate::coordinator::{CoordinatorResult, ExecutionMode, ModeCoordinator};
use crate::memory::{LongTermMemory, Memory, ShortTermMemory};
use crate::tools::ToolRegistry;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Working memory sized from configuration
pub fn build_short_term(config: &Config) -> Arc<ShortTermMemory> {
    Arc::new(ShortTermMemory::new(
        config.memory.short_term.capacity,
        config.short_term_ttl(),
    ))
}

/// Open the persistent store when enabled
///
/// An unusable store is logged and skipped so a task can still run.
pub fn open_long_term(config: &Config) -> Option<LongTermMemory> {
    if !config.memory.long_term.enabled {
        return None;
    }

    let path = config.long_term_path();
    match LongTermMemory::new(&path, config.memory.long_term.index_in_memory) {
        Ok(store) => Some(store),
        Err(e) => {
            warn!("Long-term memory unavailable at {}: {}", path.display(), e);
            None
        }
    }
}

/// Wire the primary loop and one specialist per configured role
pub fn build_coordinator(
    config: &Config,
    mode: Option<ExecutionMode>,
    memory: Arc<dyn Memory>,
) -> ModeCoordinator {
    let tools = Arc::new(ToolRegistry::with_builtins());

    let mut settings = config.coordinator_settings();
    if let Some(mode) = mode {
        settings.mode = mode;
    }

    let primary = ExecutionLoop::rule_based(config.loop_settings(), tools)
        .with_memory(Arc::clone(&memory));
    let mut coordinator = ModeCoordinator::new(settings, primary).with_memory(memory);

    for role in &config.specialized_agents.roles {
        coordinator.add_specialist(role.clone(), config.role_loop_settings(role));
    }

    coordinator
}

/// Run a task
pub async fn handle_run(
    task: String,
    mode: Option<ExecutionMode>,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let short_term = build_short_term(config);
    let mut coordinator = build_coordinator(config, mode, short_term);

    if format == OutputFormat::Text {
        println!("Executing task: {}", task);
        println!();
    }

    let result = coordinator.execute(&task).await;

    if let Some(store) = open_long_term(config) {
        let record = json!({
            "kind": "task",
            "task": result.task,
            "mode": result.mode,
            "status": result.status,
            "answer": result.answer,
            "duration_ms": result.duration_ms,
        });
        if store.add(record).is_none() {
            warn!("Failed to persist result of task: {}", task);
        }
    }

    match format {
        OutputFormat::Text => print_result(&result),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    Ok(())
}

fn print_result(result: &CoordinatorResult) {
    println!("Result:");
    println!("{}", result.answer);
    println!();

    let marker = if result.status == AgentStatus::Completed {
        "✓"
    } else {
        "✗"
    };
    println!("{} Task {}", marker, result.status);
    println!("  Mode: {}", result.mode);
    println!("  Complexity: {:.1}", result.complexity.total());
    println!("  Duration: {}ms", result.duration_ms);

    if let Some(primary) = &result.primary {
        println!("  Agent: {}", primary.agent_name);
        println!("  Iterations: {}", primary.iterations);
    }

    for outcome in &result.outcomes {
        match outcome.answer() {
            Some(_) => println!("  [{}] {} completed", outcome.role(), outcome.subtask_id()),
            None => println!("  [{}] {} failed", outcome.role(), outcome.subtask_id()),
        }
    }
}

/// Plan a task and run its steps
pub async fn handle_plan(task: String, config: &Config, format: OutputFormat) -> Result<()> {
    let mut coordinator = build_coordinator(config, None, build_short_term(config));
    let run = coordinator.execute_plan(&task).await;

    match format {
        OutputFormat::Text => {
            println!("Plan {} ({})", run.plan.id, run.plan.status);
            for step in &run.plan.steps {
                let marker = if run.plan.is_step_completed(&step.id) {
                    "✓"
                } else {
                    " "
                };
                println!("  {} {} [{}] {}", marker, step.id, step.capability, step.description);
            }
            if run.replans > 0 {
                println!("  Replans: {}", run.replans);
            }
            println!();
            println!("Result:");
            println!("{}", run.answer);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&run)?),
    }

    Ok(())
}

/// List available tools
pub async fn handle_tools(format: OutputFormat) -> Result<()> {
    let tools = ToolRegistry::with_builtins().list_available_tools();

    match format {
        OutputFormat::Text => {
            println!("Available tools:");
            for tool in &tools {
                println!("  {:<12} {}", tool.name, tool.description);
            }
        }
        OutputFormat::Json => {
            let output = json!({ "tools": tools, "count": tools.len() });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

/// Report statistics for both memory stores
pub async fn handle_memory_stats(config: &Config, format: OutputFormat) -> Result<()> {
    let short_term = build_short_term(config).stats();
    let long_term = open_long_term(config).map(|store| store.stats());

    match format {
        OutputFormat::Text => {
            println!("Short-term memory:");
            println!("  Capacity: {}", config.memory.short_term.capacity);
            println!("  TTL: {}s", config.memory.short_term.ttl);
            println!("  Size: {}", short_term.size());

            match &long_term {
                Some(stats) => {
                    println!("Long-term memory:");
                    println!("  Path: {}", config.long_term_path().display());
                    println!("  Items: {}", stats.size());
                }
                None => println!("Long-term memory: disabled"),
            }
        }
        OutputFormat::Json => {
            let output = json!({ "short_term": short_term, "long_term": long_term });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", config.to_toml()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

pub fn handle_config_path(format: OutputFormat) -> Result<()> {
    let path = Config::default_config_path().context("Failed to resolve config path")?;
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "path": path })),
    }
    Ok(())
}
