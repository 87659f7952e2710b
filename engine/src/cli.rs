//! CLI interface for foreman
//!
//! Command-line interface built with clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::coordinator::ExecutionMode;

/// Foreman task-execution engine
///
/// Runs natural-language tasks through a think-decide-act-observe loop,
/// fanning complex tasks out to specialized agents.
#[derive(Parser, Debug)]
#[command(name = "foreman")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a task
    Run {
        /// The task to execute
        task: String,

        /// Execution mode (single, multi, auto); overrides agent.mode
        #[arg(long, value_name = "MODE")]
        mode: Option<ExecutionMode>,
    },

    /// Build a step plan for a task and execute it
    Plan {
        /// The task to plan
        task: String,
    },

    /// List available tools
    Tools,

    /// Inspect memory stores
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// Show memory statistics
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved configuration
    Show,

    /// Show the configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["foreman", "tools"]);
        assert!(matches!(cli.command, Command::Tools));
        assert!(!cli.json);
        assert!(cli.log.is_none());
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["foreman", "--json", "--log", "debug", "tools"]);
        assert!(cli.json);
        assert_eq!(cli.log, Some("debug".to_string()));

        let cli = Cli::parse_from(["foreman", "tools", "--config", "/tmp/foreman.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/foreman.toml")));
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["foreman", "run", "calculate 2+2"]);
        if let Command::Run { task, mode } = cli.command {
            assert_eq!(task, "calculate 2+2");
            assert!(mode.is_none());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_run_with_mode() {
        let cli = Cli::parse_from(["foreman", "run", "--mode", "auto", "compare things"]);
        if let Command::Run { mode, .. } = cli.command {
            assert_eq!(mode, Some(ExecutionMode::Auto));
        } else {
            panic!("Expected Run command");
        }

        assert!(Cli::try_parse_from(["foreman", "run", "--mode", "swarm", "x"]).is_err());
    }

    #[test]
    fn test_memory_stats() {
        let cli = Cli::parse_from(["foreman", "memory", "stats"]);
        if let Command::Memory { action } = cli.command {
            assert!(matches!(action, MemoryAction::Stats));
        } else {
            panic!("Expected Memory command");
        }
    }

    #[test]
    fn test_config_show() {
        let cli = Cli::parse_from(["foreman", "config", "show"]);
        if let Command::Config { action } = cli.command {
            assert!(matches!(action, ConfigAction::Show));
        } else {
            panic!("Expected Config command");
        }
    }
}
