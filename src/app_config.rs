use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

/// Application configuration module
/// This module builds the server configuration once at startup from the
/// environment. The resulting value is shared read-only with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listening port
    pub port: u16,

    /// Run mode
    pub mode: RunMode,

    /// Program name or path of the validation tool
    pub tool: String,

    /// Timeout for each tool invocation in seconds
    pub timeout_secs: u64,

    /// Maximum size of a single uploaded file in bytes
    pub max_file_bytes: usize,

    /// Parent directory for request workspaces (system temp dir when unset)
    pub work_root: Option<PathBuf>,

    /// Log level
    pub log_level: LogLevel,
}

/// Server run mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    // @mode: Production defaults
    #[default]
    Release,
    // @mode: Verbose request logging
    Debug,
    // @mode: Used by the test suite
    Test,
}

impl RunMode {
    // @returns: Lowercase mode identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Release => "release",
            Self::Debug => "debug",
            Self::Test => "test",
        }
    }
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "release" => Ok(Self::Release),
            "debug" => Ok(Self::Debug),
            "test" => Ok(Self::Test),
            _ => Err(()),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Convert to the `log` crate filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

pub const ENV_PORT: &str = "PORT";
pub const ENV_MODE: &str = "VALIDATOR_MODE";
pub const ENV_TOOL: &str = "VALIDATOR_TOOL";
pub const ENV_TIMEOUT_SECS: &str = "VALIDATOR_TIMEOUT_SECS";
pub const ENV_MAX_FILE_BYTES: &str = "VALIDATOR_MAX_FILE_BYTES";
pub const ENV_WORK_ROOT: &str = "VALIDATOR_WORK_ROOT";
pub const ENV_LOG_LEVEL: &str = "VALIDATOR_LOG_LEVEL";

fn default_port() -> u16 {
    8080
}

fn default_tool() -> String {
    "hhfab".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_file_bytes() -> usize {
    10 * 1024 * 1024
}

impl ServerConfig {
    /// Build the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    ///
    /// Unset and blank variables fall back to defaults; present but
    /// unparsable values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(ENV_PORT) {
            config.port = parse_value(ENV_PORT, &value)?;
        }

        if let Some(value) = get(ENV_MODE) {
            config.mode = RunMode::from_str(&value).map_err(|_| invalid(ENV_MODE, &value))?;
            // Debug mode implies debug logging unless a level is set explicitly
            if config.mode == RunMode::Debug {
                config.log_level = LogLevel::Debug;
            }
        }

        if let Some(value) = get(ENV_TOOL) {
            config.tool = value.trim().to_string();
        }

        if let Some(value) = get(ENV_TIMEOUT_SECS) {
            config.timeout_secs = parse_value(ENV_TIMEOUT_SECS, &value)?;
        }

        if let Some(value) = get(ENV_MAX_FILE_BYTES) {
            config.max_file_bytes = parse_value(ENV_MAX_FILE_BYTES, &value)?;
        }

        if let Some(value) = get(ENV_WORK_ROOT) {
            config.work_root = Some(PathBuf::from(value.trim()));
        }

        if let Some(value) = get(ENV_LOG_LEVEL) {
            config.log_level =
                LogLevel::from_str(&value).map_err(|_| invalid(ENV_LOG_LEVEL, &value))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".to_string()));
        }
        if self.tool.trim().is_empty() {
            return Err(ConfigError::Invalid("tool name must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout must be at least one second".to_string()));
        }
        if self.max_file_bytes == 0 {
            return Err(ConfigError::Invalid("file size limit must be non-zero".to_string()));
        }
        Ok(())
    }

    /// Timeout for a single tool invocation
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Limit for the whole request body (both uploads plus form overhead)
    pub fn max_body_bytes(&self) -> usize {
        self.max_file_bytes.saturating_mul(2)
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse::<T>().map_err(|_| invalid(name, value))
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    }
}

/// Default implementation for ServerConfig
impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            port: default_port(),
            mode: RunMode::default(),
            tool: default_tool(),
            timeout_secs: default_timeout_secs(),
            max_file_bytes: default_max_file_bytes(),
            work_root: None,
            log_level: LogLevel::default(),
        }
    }
}
