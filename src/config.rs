// Configuration File Support
//
// This module provides configuration file parsing for the safeterm server.
// Supports TOML format with environment variable overrides.
// Configuration files are loaded from XDG config directory: ~/.config/safeterm/config.toml

use crate::history::DEFAULT_VIEW_SIZE;
use crate::tools::{
    CommandExecutor, CommandValidator, ExecutorConfig, DEFAULT_ALLOWLIST, DEFAULT_BLOCKLIST,
    DEFAULT_MAX_OUTPUT_SIZE, DEFAULT_TIMEOUT_SECS,
};
use crate::Terminal;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Longest accepted per-command deadline
const MAX_TIMEOUT_SECS: u64 = 300;

/// Smallest accepted output limit
const MIN_OUTPUT_BYTES: usize = 1024;

/// Accepted values for `logging.level`
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Accepted values for `logging.format`
const LOG_FORMATS: &[&str] = &["json", "pretty", "compact"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub logging: LoggingConfig,

    /// HTTP listener configuration
    pub server: ServerConfig,

    /// Command execution limits
    pub execution: ExecutionConfig,

    /// Blocklist and allowlist
    pub policy: PolicyConfig,

    /// History view configuration
    pub history: HistoryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: IpAddr,

    /// Listening port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 5025,
        }
    }
}

/// Command execution limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Wall-clock deadline per command in seconds
    pub timeout_secs: u64,

    /// Maximum captured output in bytes
    pub max_output_bytes: usize,

    /// Working directory for commands (inherited if unset)
    pub working_dir: Option<PathBuf>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_output_bytes: DEFAULT_MAX_OUTPUT_SIZE,
            working_dir: None,
        }
    }
}

/// Blocklist and allowlist, fixed for the life of the process
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PolicyConfig {
    /// Forbidden substrings
    pub blocklist: Vec<String>,

    /// Permitted command prefixes
    pub allowlist: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            blocklist: DEFAULT_BLOCKLIST.iter().map(|s| s.to_string()).collect(),
            allowlist: DEFAULT_ALLOWLIST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// History view configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistoryConfig {
    /// Number of entries returned by the history endpoint
    pub view_size: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            view_size: DEFAULT_VIEW_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from the default XDG config directory
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    /// If the config file does not exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    ///
    /// A missing file yields defaults (with environment overrides applied).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting configuration is invalid.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file from {:?}", path))?;

            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file from {:?}", path))?;

            tracing::info!("Loaded configuration from {:?}", path);
            config
        } else {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            Self::default()
        };

        let config = config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path
    ///
    /// Returns `~/.config/safeterm/config.toml` on Linux
    pub fn config_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("com", "safeterm", "safeterm") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            // Fallback if XDG dirs cannot be determined
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config").join("safeterm").join("config.toml")
        }
    }

    /// Apply environment variable overrides to the configuration
    ///
    /// Environment variables take precedence over config file values:
    /// - SAFETERM_LOG_LEVEL
    /// - SAFETERM_LOG_FORMAT
    /// - SAFETERM_HOST
    /// - SAFETERM_PORT
    /// - SAFETERM_TIMEOUT_SECS
    /// - SAFETERM_MAX_OUTPUT_BYTES
    ///
    /// Values that fail to parse or fall outside the accepted range are ignored.
    fn apply_env_overrides(mut self) -> Self {
        if let Ok(level) = std::env::var("SAFETERM_LOG_LEVEL") {
            if LOG_LEVELS.contains(&level.to_lowercase().as_str()) {
                self.logging.level = level;
            }
        }
        if let Ok(format) = std::env::var("SAFETERM_LOG_FORMAT") {
            if LOG_FORMATS.contains(&format.to_lowercase().as_str()) {
                self.logging.format = format;
            }
        }

        if let Ok(host) = std::env::var("SAFETERM_HOST") {
            if let Ok(host) = host.parse::<IpAddr>() {
                self.server.host = host;
            }
        }
        if let Ok(port) = std::env::var("SAFETERM_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                if port > 0 {
                    self.server.port = port;
                }
            }
        }

        if let Ok(secs) = std::env::var("SAFETERM_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                if secs > 0 && secs <= MAX_TIMEOUT_SECS {
                    self.execution.timeout_secs = secs;
                }
            }
        }
        if let Ok(bytes) = std::env::var("SAFETERM_MAX_OUTPUT_BYTES") {
            if let Ok(bytes) = bytes.parse::<usize>() {
                if bytes >= MIN_OUTPUT_BYTES {
                    self.execution.max_output_bytes = bytes;
                }
            }
        }

        self
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log level: {}. Must be one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            );
        }

        if !LOG_FORMATS.contains(&self.logging.format.to_lowercase().as_str()) {
            anyhow::bail!(
                "Invalid log format: {}. Must be one of: {}",
                self.logging.format,
                LOG_FORMATS.join(", ")
            );
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if self.execution.timeout_secs == 0 {
            anyhow::bail!("Execution timeout must be > 0 seconds");
        }
        if self.execution.timeout_secs > MAX_TIMEOUT_SECS {
            anyhow::bail!("Execution timeout must be <= {} seconds", MAX_TIMEOUT_SECS);
        }
        if self.execution.max_output_bytes < MIN_OUTPUT_BYTES {
            anyhow::bail!("Max output must be at least {} bytes", MIN_OUTPUT_BYTES);
        }

        if self.policy.allowlist.is_empty() {
            anyhow::bail!("Allowlist must contain at least one command prefix");
        }
        if self.policy.allowlist.iter().any(|p| p.trim().is_empty()) {
            anyhow::bail!("Allowlist entries must not be empty");
        }
        if self.policy.blocklist.iter().any(|p| p.is_empty()) {
            anyhow::bail!("Blocklist entries must not be empty");
        }

        if self.history.view_size == 0 {
            anyhow::bail!("History view size must be > 0");
        }

        Ok(())
    }

    /// Convert log level string to tracing::Level
    pub fn log_level(&self) -> Result<tracing::Level> {
        self.logging.level.to_lowercase().parse()
            .map_err(|e| anyhow::anyhow!("Failed to parse log level: {}", e))
    }

    /// Socket address to listen on
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    /// Per-command deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.execution.timeout_secs)
    }

    /// Build the terminal described by this configuration
    pub fn build_terminal(&self) -> Terminal {
        let validator = CommandValidator::with_policy(
            self.policy.blocklist.clone(),
            self.policy.allowlist.clone(),
        );

        let mut executor_config = ExecutorConfig::default()
            .with_timeout(self.timeout())
            .with_max_output_size(self.execution.max_output_bytes);
        if let Some(ref dir) = self.execution.working_dir {
            executor_config = executor_config.with_working_dir(dir);
        }

        Terminal::new(validator, CommandExecutor::with_config(executor_config))
            .with_view_size(self.history.view_size)
    }
}
