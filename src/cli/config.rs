//! Voting CLI configuration file handling
//!
//! Configuration is TOML and lives in the per-user data directory:
//! - Config: ~/.local/share/voting/config.toml
//! - State: ~/.local/share/voting/session.cbor
//!
//! Only deployment settings live here (where the session file is, how to
//! log). Who owns the session and who may vote is part of the session
//! state itself and cannot be changed by editing this file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default session file name
const STATE_FILE_NAME: &str = "session.cbor";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Failed to parse config file '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Failed to serialize config: {0}")]
    Serialize(String),

    #[error("Failed to write config file '{path}': {reason}")]
    Write { path: PathBuf, reason: String },
}

/// Voting CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotingConfig {
    /// Session state configuration
    pub state: StateConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Session state location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path to the CBOR session file
    pub path: PathBuf,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

impl VotingConfig {
    /// Create a new configuration with the given state path
    pub fn new(state_path: PathBuf) -> Self {
        Self {
            state: StateConfig { path: state_path },
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load `path`, writing a commented default first if it does not exist.
    pub fn load_or_create(path: &Path, state_path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default(path, state_path)?;
        }
        Self::load(path)
    }

    /// Generate default configuration content as a string with comments
    ///
    /// The state path goes through the TOML serializer so quotes and
    /// backslashes in it are escaped.
    pub fn generate_default_toml(state_path: &Path) -> Result<String, ConfigError> {
        let state = toml::to_string(&Self::new(state_path.to_path_buf()).state)
            .map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(format!(
            r#"# Voting CLI Configuration
#
# Deployment settings only. The session owner, registered voters and
# proposals are stored in the session file and are managed through the
# CLI commands, never through this file.

[state]
# Path to the session state file (CBOR, integrity-checked on load)
{state}
[logging]
# Log level: trace, debug, info, warn, error
# RUST_LOG overrides this when set
level = "info"

# Log file path (optional, logs to stderr if not specified)
# file = "/var/log/voting.log"
"#
        ))
    }

    /// Create and save a default configuration file
    pub fn create_default(config_path: &Path, state_path: &Path) -> Result<(), ConfigError> {
        write_file(config_path, &Self::generate_default_toml(state_path)?)
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let write_err = |e: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}

/// Default data directory: `<data_dir>/voting`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("voting")
}

/// Default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Default state file path, next to the config file
///
/// - Config: /data/voting/config.toml
/// - State: /data/voting/session.cbor
pub fn default_state_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(STATE_FILE_NAME)
}
