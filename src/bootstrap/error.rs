use thiserror::Error;

use crate::config::ConfigError;
use crate::error::KvError;

/// Why the startup connection loop gave up.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The cancellation token fired before the server answered
    #[error("Connection bootstrap cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    /// Every attempt allowed by the retry policy failed
    #[error("Cache server unreachable after {attempts} attempt(s): {last_error}")]
    Exhausted { attempts: u32, last_error: KvError },

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The settings cannot produce a client at all; retrying will not help
    #[error("Invalid connection settings: {0}")]
    InvalidSettings(KvError),
}
