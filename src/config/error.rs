//! Errors raised while loading and validating settings

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// `default.toml`, or the file named by `FUSION_KV_CONFIG_FILE`, is missing
    #[error("required config file {} does not exist", path.display())]
    FileNotFound { path: PathBuf },

    /// The merged layers do not fit the `Settings` shape
    #[error("settings do not deserialize: {0}")]
    ParseError(#[source] config::ConfigError),

    #[error("invalid setting `{field}`: {message}")]
    ValidationError {
        /// Dotted path of the offending setting, e.g. `redis.address`
        field: String,
        message: String,
    },

    #[error("unknown environment `{0}` (expected development, test, staging or production)")]
    UnknownEnvironment(String),

    /// Layered and single-file loading were both requested
    #[error("{dir_var} and {file_var} are mutually exclusive, set only one")]
    ConflictingSources {
        dir_var: &'static str,
        file_var: &'static str,
    },

    #[error("cannot read config sources: {0}")]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        ConfigError::FileNotFound { path: path.into() }
    }
}
