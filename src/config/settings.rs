//! Configuration settings structures for fusion-kv
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bootstrap::RetryPolicy;
use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_address() -> String {
    "127.0.0.1:6379".to_string()
}

fn default_pool_size() -> u32 {
    4
}

fn default_connection_timeout() -> u64 {
    5
}

fn default_ping_timeout() -> u64 {
    3
}

fn default_scan_count() -> usize {
    100
}

fn default_max_attempts() -> u32 {
    10
}

fn default_initial_delay() -> u64 {
    5
}

fn default_max_delay() -> u64 {
    60
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/fusion-kv.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

// ============================================================================
// Redis Configuration
// ============================================================================

/// Connection settings for the Redis server
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedisSettings {
    /// Server address as `host:port`
    #[serde(default = "default_address")]
    pub address: String,

    /// ACL user name
    #[serde(default)]
    pub username: Option<String>,

    /// Password; an empty string means no authentication
    #[serde(default)]
    pub password: Option<String>,

    /// Logical database index
    #[serde(default)]
    pub database: u32,

    /// Maximum number of pooled connections
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Pool checkout timeout in seconds
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout: u64,

    /// Liveness PING timeout in seconds
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,

    /// Namespace prepended to every key as `<key_prefix>:<key>`
    #[serde(default)]
    pub key_prefix: String,

    /// COUNT hint for each SCAN step
    #[serde(default = "default_scan_count")]
    pub scan_count: usize,

    /// Whether to use TLS (`rediss://`)
    #[serde(default)]
    pub tls_enabled: bool,
}

impl RedisSettings {
    /// Connection URL for the `redis` client.
    ///
    /// Credentials are percent-encoded. The result contains the password, so
    /// it must not be logged.
    pub fn connection_url(&self) -> String {
        let scheme = if self.tls_enabled { "rediss" } else { "redis" };
        let username = self.username.as_deref().filter(|u| !u.is_empty());
        let password = self.password.as_deref().filter(|p| !p.is_empty());

        let auth = match (username, password) {
            (Some(user), Some(pass)) => format!(
                "{}:{}@",
                urlencoding::encode(user),
                urlencoding::encode(pass)
            ),
            (None, Some(pass)) => format!(":{}@", urlencoding::encode(pass)),
            (Some(user), None) => format!("{}@", urlencoding::encode(user)),
            (None, None) => String::new(),
        };

        format!("{}://{}{}/{}", scheme, auth, self.address, self.database)
    }
}

impl Default for RedisSettings {
    fn default() -> Self {
        Self {
            address: default_address(),
            username: None,
            password: None,
            database: 0,
            pool_size: default_pool_size(),
            connection_timeout: default_connection_timeout(),
            ping_timeout: default_ping_timeout(),
            key_prefix: String::new(),
            scan_count: default_scan_count(),
            tls_enabled: false,
        }
    }
}

impl fmt::Debug for RedisSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisSettings")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("pool_size", &self.pool_size)
            .field("connection_timeout", &self.connection_timeout)
            .field("ping_timeout", &self.ping_timeout)
            .field("key_prefix", &self.key_prefix)
            .field("scan_count", &self.scan_count)
            .field("tls_enabled", &self.tls_enabled)
            .finish()
    }
}

// ============================================================================
// Retry Configuration
// ============================================================================

/// Startup connection retry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Maximum number of PING attempts; 0 retries until cancelled
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt, in seconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay: u64,

    /// Upper bound for any single delay, in seconds
    #[serde(default = "default_max_delay")]
    pub max_delay: u64,

    /// Backoff multiplier applied per attempt
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

impl RetrySettings {
    /// Convert RetrySettings to the runtime RetryPolicy
    pub fn into_policy(self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_secs(self.initial_delay),
            max_delay: Duration::from_secs(self.max_delay),
            multiplier: self.multiplier,
        }
    }
}

// ============================================================================
// Logger Settings
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level or filter directive, e.g. "info" or "fusion_kv=debug"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let format = self
            .file
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::validation("logger.file.format", &e.to_string()))?;
        let file = FileConfig {
            enabled: self.file.enabled,
            path: PathBuf::from(self.file.path),
            append: self.file.append,
            format,
        };

        LoggerConfig::new(console, file, self.level)
            .map_err(|e| ConfigError::validation("logger", &e.to_string()))
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete fusion-kv settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Redis connection settings
    #[serde(default)]
    pub redis: RedisSettings,

    /// Startup retry settings
    #[serde(default)]
    pub retry: RetrySettings,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,
}
