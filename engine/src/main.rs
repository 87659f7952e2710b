// Foreman task-execution engine
// Main entry point for the foreman binary

use clap::Parser;
use foreman_engine::cli::{Cli, Command, ConfigAction, MemoryAction};
use foreman_engine::config::Config;
use foreman_engine::handlers::{
    handle_config_path, handle_config_show, handle_memory_stats, handle_plan, handle_run,
    handle_tools, OutputFormat,
};
use foreman_engine::telemetry::{init_telemetry, init_telemetry_with_level};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Invalid configuration is the only failure that aborts startup
    let config = match &cli.config {
        Some(config_path) => Config::load_from_path(config_path),
        None => Config::load_or_create(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            init_telemetry();
            tracing::error!("{}", e);
            return Err(e.into());
        }
    };

    // --log wins over the configured level; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(config.core.log_level.as_str());
    init_telemetry_with_level(log_level);

    tracing::info!(
        "Foreman v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Command::Run { task, mode } => {
            tracing::info!("Executing task: {}", task);
            handle_run(task, mode, &config, format).await
        }

        Command::Plan { task } => {
            tracing::info!("Planning task: {}", task);
            handle_plan(task, &config, format).await
        }

        Command::Tools => handle_tools(format).await,

        Command::Memory { action } => match action {
            MemoryAction::Stats => handle_memory_stats(&config, format).await,
        },

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(format),
        },
    }
}
