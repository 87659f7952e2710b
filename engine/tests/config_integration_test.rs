//! Integration tests for configuration management
//!
//! Load real files from disk and check that resolved settings reach the
//! components unchanged.

use foreman_engine::config::Config;
use foreman_engine::coordinator::ExecutionMode;
use sdk::errors::{EngineError, EngineErrorExt};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn test_load_from_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        format!(
            r#"
[core]
log_level = "DEBUG"
data_dir = {data_dir:?}

[agent]
name = "night-shift"
mode = "auto"
max_iterations = 4
complexity_threshold = 3.0
subtask_timeout_secs = 5

[memory.short_term]
capacity = 200
ttl = 120

[memory.long_term]
index_in_memory = false

[tools]
enabled = ["calculator", "text"]
"#,
            data_dir = dir.path().display().to_string()
        ),
    )
    .unwrap();

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.core.data_dir, dir.path());
    assert_eq!(config.long_term_path(), dir.path().join("memory"));
    assert!(!config.memory.long_term.index_in_memory);
    assert_eq!(config.short_term_ttl(), Duration::from_secs(120));

    let loop_settings = config.loop_settings();
    assert_eq!(loop_settings.name.as_deref(), Some("night-shift"));
    assert_eq!(loop_settings.max_iterations, 4);
    assert_eq!(loop_settings.tools, vec!["calculator", "text"]);

    let coordinator = config.coordinator_settings();
    assert_eq!(coordinator.mode, ExecutionMode::Auto);
    assert_eq!(coordinator.complexity_threshold, 3.0);
    assert_eq!(coordinator.subtask_timeout, Some(Duration::from_secs(5)));
}

#[test]
fn test_missing_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_path(&dir.path().join("absent.toml")).unwrap_err();

    assert!(matches!(err, EngineError::Config(_)));
    assert!(!err.is_recoverable());
    assert!(!err.user_hint().is_empty());
}

#[test]
fn test_malformed_toml_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[agent\nmode = ").unwrap();

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn test_written_defaults_load_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, Config::default().to_toml().unwrap()).unwrap();

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.agent, Config::default().agent);
    assert_eq!(config.specialized_agents, Config::default().specialized_agents);
}
