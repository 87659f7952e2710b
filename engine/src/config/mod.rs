//! Configuration management
//!
//! Loads, validates and resolves the foreman configuration. The
//! configuration is a TOML document stored at ~/.foreman/config.toml.
//! Every key has a default, so a partial file is merged over the built-in
//! defaults.
//!
//! # Configuration Sections
//!
//! - **core**: log level and data directory
//! - **agent**: primary agent name, execution mode, iteration budget,
//!   complexity threshold and subtask timeout
//! - **memory**: short-term store sizing and the optional persistent store
//! - **tools**: capabilities resolved eagerly at startup
//! - **specialized_agents**: roles used for multi-loop execution and
//!   per-role overrides
//!
//! Components never see this document. They receive resolved settings
//! through [`Config::loop_settings`], [`Config::coordinator_settings`] and
//! friends.
//!
//! # Examples
//!
//! ```no_run
//! use foreman_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Mode: {}", config.agent.mode);
//! println!("Max iterations: {}", config.agent.max_iterations);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::agent::{LoopSettings, DEFAULT_MAX_ITERATIONS};
use crate::coordinator::{CoordinatorSettings, ExecutionMode, DEFAULT_COMPLEXITY_THRESHOLD};
use crate::memory::{DEFAULT_CAPACITY, DEFAULT_TTL_SECS};

const VALID_LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub core: CoreConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub memory: MemoryConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub specialized_agents: SpecializedAgentsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Logging level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Data directory for persistent memory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Name of the primary agent
    #[serde(default = "default_agent_name")]
    pub name: String,

    #[serde(default = "default_mode")]
    pub mode: ExecutionMode,

    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Score at or above which `auto` mode fans out to specialists
    #[serde(default = "default_complexity_threshold")]
    pub complexity_threshold: f64,

    /// Per-subtask timeout for multi-loop execution (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtask_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub short_term: ShortTermConfig,

    #[serde(default)]
    pub long_term: LongTermConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortTermConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Time to live in seconds
    #[serde(default = "default_ttl")]
    pub ttl: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongTermConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Defaults to `<data_dir>/memory`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_path: Option<PathBuf>,

    #[serde(default = "default_true")]
    pub index_in_memory: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Capabilities resolved eagerly when the primary loop is built
    #[serde(default)]
    pub enabled: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecializedAgentsConfig {
    /// Roles registered for multi-loop execution, in decomposition order
    #[serde(default = "default_roles")]
    pub roles: Vec<String>,

    /// Per-role overrides, keyed by role (`[specialized_agents.overrides.<role>]`)
    #[serde(default)]
    pub overrides: BTreeMap<String, RoleConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,

    /// Tools for this role; inherits `[tools] enabled` when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("~/.foreman")
}

fn default_agent_name() -> String {
    "foreman".to_string()
}

fn default_mode() -> ExecutionMode {
    ExecutionMode::Single
}

fn default_max_iterations() -> usize {
    DEFAULT_MAX_ITERATIONS
}

fn default_complexity_threshold() -> f64 {
    DEFAULT_COMPLEXITY_THRESHOLD
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_roles() -> Vec<String> {
    ["researcher", "planner", "executor", "critic"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            mode: default_mode(),
            max_iterations: default_max_iterations(),
            complexity_threshold: default_complexity_threshold(),
            subtask_timeout_secs: None,
        }
    }
}

impl Default for ShortTermConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl: default_ttl(),
        }
    }
}

impl Default for LongTermConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            storage_path: None,
            index_in_memory: true,
        }
    }
}

impl Default for SpecializedAgentsConfig {
    fn default() -> Self {
        Self {
            roles: default_roles(),
            overrides: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.foreman/config.toml)
    ///
    /// If the configuration file doesn't exist, writes the defaults there
    /// first.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read or written
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse, validate and process a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Write the default configuration to `path` and return it processed
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();

        // Written before processing so the file keeps portable `~` paths
        let toml_string = config.to_toml()?;
        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.foreman/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".foreman").join("config.toml"))
    }

    pub fn to_toml(&self) -> Result<String, EngineError> {
        toml::to_string_pretty(self)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Validate values and expand `~` in paths
    ///
    /// No directories are created here; the persistent memory store creates
    /// its own directory when it is opened.
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        self.core.log_level = self.core.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }

        if self.agent.max_iterations == 0 {
            return Err(EngineError::Config(
                "agent.max_iterations must be at least 1".to_string(),
            ));
        }

        let threshold = self.agent.complexity_threshold;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(EngineError::Config(format!(
                "agent.complexity_threshold must be a non-negative number, got {}",
                threshold
            )));
        }

        if self.memory.short_term.capacity == 0 {
            return Err(EngineError::Config(
                "memory.short_term.capacity must be at least 1".to_string(),
            ));
        }

        for (role, overrides) in &self.specialized_agents.overrides {
            if overrides.max_iterations == Some(0) {
                return Err(EngineError::Config(format!(
                    "specialized_agents.overrides.{}.max_iterations must be at least 1",
                    role
                )));
            }
        }

        self.core.data_dir = expand_path(&self.core.data_dir)?;
        if let Some(path) = &self.memory.long_term.storage_path {
            self.memory.long_term.storage_path = Some(expand_path(path)?);
        }

        Ok(())
    }

    /// Settings for the primary execution loop
    pub fn loop_settings(&self) -> LoopSettings {
        LoopSettings::named(self.agent.name.clone())
            .with_max_iterations(self.agent.max_iterations)
            .with_tools(self.tools.enabled.clone())
    }

    /// Settings for a specialist loop: agent defaults with role overrides applied
    pub fn role_loop_settings(&self, role: &str) -> LoopSettings {
        let overrides = self
            .specialized_agents
            .overrides
            .get(role)
            .cloned()
            .unwrap_or_default();

        LoopSettings::named(overrides.name.unwrap_or_else(|| format!("{}-agent", role)))
            .with_max_iterations(overrides.max_iterations.unwrap_or(self.agent.max_iterations))
            .with_tools(overrides.tools.unwrap_or_else(|| self.tools.enabled.clone()))
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            mode: self.agent.mode,
            complexity_threshold: self.agent.complexity_threshold,
            subtask_timeout: self.agent.subtask_timeout_secs.map(Duration::from_secs),
        }
    }

    pub fn short_term_ttl(&self) -> Duration {
        Duration::from_secs(self.memory.short_term.ttl)
    }

    /// Directory of the persistent memory store
    pub fn long_term_path(&self) -> PathBuf {
        self.memory
            .long_term
            .storage_path
            .clone()
            .unwrap_or_else(|| self.core.data_dir.join("memory"))
    }
}

/// Expand ~ in path to user's home directory
pub fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}
