//! Configuration validation logic
//!
//! Each settings section validates itself; `Settings::validate` returns the
//! first error encountered.

use tracing_subscriber::EnvFilter;

use crate::config::error::ConfigError;
use crate::config::settings::{FileSettings, LoggerSettings, RedisSettings, RetrySettings, Settings};

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl RedisSettings {
    /// Validate Redis connection settings
    ///
    /// # Validation Rules
    /// - Address must be `host:port` with a non-zero numeric port
    /// - Pool size, timeouts and scan count must be greater than 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_address()?;

        if self.pool_size == 0 {
            return Err(ConfigError::validation(
                "redis.pool_size",
                "Pool size must be greater than 0.",
            ));
        }

        if self.connection_timeout == 0 {
            return Err(ConfigError::validation(
                "redis.connection_timeout",
                "Connection timeout must be greater than 0 seconds.",
            ));
        }

        if self.ping_timeout == 0 {
            return Err(ConfigError::validation(
                "redis.ping_timeout",
                "Ping timeout must be greater than 0 seconds.",
            ));
        }

        if self.scan_count == 0 {
            return Err(ConfigError::validation(
                "redis.scan_count",
                "Scan count must be greater than 0.",
            ));
        }

        Ok(())
    }

    fn validate_address(&self) -> Result<(), ConfigError> {
        let address = self.address.trim();
        if address.is_empty() {
            return Err(ConfigError::validation(
                "redis.address",
                "Redis address is required. Expected format: host:port",
            ));
        }

        if address.contains("://") {
            return Err(ConfigError::ValidationError {
                field: "redis.address".to_string(),
                message: format!(
                    "Expected host:port, got a URL '{}'. Use redis.tls_enabled for rediss.",
                    address
                ),
            });
        }

        let valid = address
            .rsplit_once(':')
            .is_some_and(|(host, port)| {
                !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p != 0)
            });
        if !valid {
            return Err(ConfigError::ValidationError {
                field: "redis.address".to_string(),
                message: format!("Invalid address '{}'. Expected format: host:port", address),
            });
        }

        Ok(())
    }
}

impl RetrySettings {
    /// Validate retry settings
    ///
    /// # Validation Rules
    /// - Multiplier must be a finite number >= 1.0
    /// - Initial delay must not exceed max delay
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(ConfigError::ValidationError {
                field: "retry.multiplier".to_string(),
                message: format!("Multiplier must be at least 1.0, got {}.", self.multiplier),
            });
        }

        if self.initial_delay > self.max_delay {
            return Err(ConfigError::ValidationError {
                field: "retry.initial_delay".to_string(),
                message: format!(
                    "Initial delay ({}s) cannot exceed max delay ({}s).",
                    self.initial_delay, self.max_delay
                ),
            });
        }

        Ok(())
    }
}

impl FileSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.enabled && self.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "File path is required when file logging is enabled.",
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.format.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        Ok(())
    }
}

impl LoggerSettings {
    /// Validate logger settings
    ///
    /// The level accepts anything `EnvFilter` understands, from a bare
    /// `debug` to `fusion_kv=trace,redis=warn`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Err(e) = EnvFilter::try_new(&self.level) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!("Invalid log level '{}': {}", self.level, e),
            });
        }

        self.file.validate()
    }
}

impl Settings {
    /// Validate all configuration settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.redis.validate()?;
        self.retry.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
