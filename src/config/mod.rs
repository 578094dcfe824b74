//! Configuration management for driver-export
//!
//! This module handles loading, parsing, and managing configuration from various sources:
//! - Configuration files (TOML format)
//! - Environment variables
//! - Command-line arguments
//!
//! Configuration precedence (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file
//! 4. Default values

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};
use crate::query::{DEFAULT_SCHEMA, is_identifier};

/// Placeholder shown instead of the password when configuration is displayed
const MASKED_PASSWORD: &str = "********";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Export file configuration
    #[serde(default)]
    pub export: ExportConfig,

    /// Display configuration
    #[serde(default)]
    pub display: DisplayConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// ClickHouse connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Full HTTP endpoint; overrides host, port and secure when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Server host name
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP interface port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Use HTTPS
    #[serde(default)]
    pub secure: bool,

    /// User name sent with every request
    #[serde(default = "default_user")]
    pub user: String,

    /// Password sent with every request
    #[serde(default)]
    pub password: String,

    /// Database holding the driver tables
    #[serde(default = "default_database")]
    pub database: String,

    /// Query timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Output file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory for generated file names
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// chrono format used for the timestamp in generated file names
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    /// Field delimiter, a single ASCII character
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

/// Terminal output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Summary output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Enable colored output
    #[serde(default = "default_color_output")]
    pub color_output: bool,
}

/// Output format options
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable summary line
    #[default]
    Text,

    /// Single-line JSON object
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    8123
}

fn default_user() -> String {
    "default".to_string()
}

fn default_database() -> String {
    DEFAULT_SCHEMA.to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_timestamp_format() -> String {
    "%Y%m%d_%H%M%S".to_string()
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_color_output() -> bool {
    true
}

fn default_log_level() -> LogLevel {
    LogLevel::Warn
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: default_host(),
            port: default_port(),
            secure: false,
            user: default_user(),
            password: String::new(),
            database: default_database(),
            timeout: default_timeout(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            timestamp_format: default_timestamp_format(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            color_output: default_color_output(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Parse configuration from TOML text
    ///
    /// Sections and fields that are absent take their default values.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| ConfigError::InvalidFormat(e.to_string()).into())
    }

    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Explicit file path, or `None` for the default location
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    ///
    /// A missing default file yields the default configuration; a missing
    /// explicitly requested file is an error.
    pub fn load_from_file(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (Self::default_config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(ConfigError::FileNotFound(path.display().to_string()).into());
            }
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        tracing::debug!("Loaded config file {}", path.display());
        Self::from_toml(&text)
    }

    /// Override values from `CLICKHOUSE_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Override values using the given variable lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the value of a variable, if set
    ///
    /// # Returns
    /// * `Result<()>` - Error if a numeric variable cannot be parsed
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let conn = &mut self.connection;

        if let Some(url) = lookup("CLICKHOUSE_URL") {
            conn.url = Some(url);
        }
        if let Some(host) = lookup("CLICKHOUSE_HOST") {
            conn.host = host;
        }
        if let Some(port) = lookup("CLICKHOUSE_PORT") {
            conn.port = parse_env("CLICKHOUSE_PORT", &port)?;
        }
        if let Some(user) = lookup("CLICKHOUSE_USER") {
            conn.user = user;
        }
        if let Some(password) = lookup("CLICKHOUSE_PASSWORD") {
            conn.password = password;
        }
        if let Some(database) = lookup("CLICKHOUSE_DATABASE") {
            conn.database = database;
        }
        if let Some(timeout) = lookup("CLICKHOUSE_TIMEOUT") {
            conn.timeout = parse_env("CLICKHOUSE_TIMEOUT", &timeout)?;
        }

        Ok(())
    }

    /// Get the default configuration file path
    ///
    /// # Returns
    /// * `PathBuf` - `~/.driver-export/config.toml`
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".driver-export")
            .join("config.toml")
    }

    /// Validate the configuration
    ///
    /// # Returns
    /// * `Result<()>` - Ok if valid, error otherwise
    pub fn validate(&self) -> Result<()> {
        self.connection.validate()?;
        self.export.delimiter_byte()?;

        let format = &self.export.timestamp_format;
        if format.trim().is_empty() || StrftimeItems::new(format).any(|i| matches!(i, Item::Error))
        {
            return Err(invalid("export.timestamp_format", format).into());
        }

        Ok(())
    }

    /// Render the configuration as TOML with the password masked
    pub fn to_toml_masked(&self) -> Result<String> {
        let mut shown = self.clone();
        if !shown.connection.password.is_empty() {
            shown.connection.password = MASKED_PASSWORD.to_string();
        }
        toml::to_string_pretty(&shown).map_err(|e| ConfigError::Serialize(e.to_string()).into())
    }
}

impl ConnectionConfig {
    /// Get query timeout as Duration
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// HTTP endpoint of the ClickHouse server, without a trailing slash
    pub fn endpoint(&self) -> String {
        match &self.url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => {
                let scheme = if self.secure { "https" } else { "http" };
                format!("{scheme}://{}:{}", self.host, self.port)
            }
        }
    }

    /// Check connection values
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(invalid("connection.url", url).into());
            }
        } else if self.host.trim().is_empty() {
            return Err(invalid("connection.host", &self.host).into());
        }

        if self.port == 0 {
            return Err(invalid("connection.port", "0").into());
        }
        if self.timeout == 0 {
            return Err(invalid("connection.timeout", "0").into());
        }
        if !is_identifier(&self.database) {
            return Err(invalid("connection.database", &self.database).into());
        }

        Ok(())
    }
}

impl ExportConfig {
    /// The delimiter as the single byte the CSV writer expects
    pub fn delimiter_byte(&self) -> Result<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Ok(*b),
            _ => Err(invalid("export.delimiter", &self.delimiter).into()),
        }
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn invalid(field: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| invalid(key, value).into())
}
