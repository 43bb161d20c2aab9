//! Logger Module
//!
//! A logging system based on `tracing-subscriber` with:
//! - Console output with color control
//! - Optional file output in Full, Compact or JSON format
//! - `EnvFilter` level directives

pub mod config;
pub mod error;
pub(crate) mod writer;

pub use self::config::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};
pub use self::error::LoggerError;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::{Layer, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber described by `config`.
///
/// # Errors
///
/// Returns [`LoggerError::AlreadyInitialized`] when a global subscriber is
/// already set, and a config or IO error if validation fails or the log
/// file cannot be opened.
pub fn init_logger(config: LoggerConfig) -> Result<(), LoggerError> {
    build_subscriber(&config)?
        .try_init()
        .map_err(|_| LoggerError::AlreadyInitialized)
}

/// Build the subscriber without installing it.
pub fn build_subscriber(
    config: &LoggerConfig,
) -> Result<impl Subscriber + Send + Sync + 'static, LoggerError> {
    config.validate()?;
    let filter = config.env_filter()?;

    // File layer goes first so console ANSI settings cannot leak into
    // span fields written to the file (tokio-rs/tracing#1817).
    let file_layer = if config.file.enabled {
        Some(file_layer(&config.file)?)
    } else {
        None
    };

    let console_layer = config.console.enabled.then(|| {
        let use_ansi = config.console.colored && std::io::stdout().is_terminal();
        fmt::layer()
            .with_ansi(use_ansi)
            .with_target(true)
            .with_level(true)
    });

    Ok(tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .with(filter))
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = writer::open_log_file(config)?;

    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    };

    Ok(layer)
}
