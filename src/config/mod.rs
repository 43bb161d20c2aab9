//! Layered configuration for fusion-kv
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base default configuration
//! 2. `{environment}.toml` - Selected by `FUSION_KV_APP_ENV`
//! 3. `local.toml` - Local overrides, not committed
//! 4. `FUSION_KV_*` environment variables, e.g. `FUSION_KV_REDIS__ADDRESS`
//!
//! `FUSION_KV_CONFIG_FILE` replaces layers 1-3 with a single file.

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{
    ConsoleSettings, FileSettings, LoggerSettings, RedisSettings, RetrySettings, Settings,
};
