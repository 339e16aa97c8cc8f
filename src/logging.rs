//! Structured logging setup using tracing
//!
//! Console output is always enabled; the format is either human-readable or one
//! JSON object per line. `RUST_LOG` overrides the configured level when set.

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{Error, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Initialize the global tracing subscriber
///
/// # Errors
///
/// Returns [`Error::Config`] for an unknown log level, or [`Error::Other`] if a
/// global subscriber was already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let level = parse_log_level(&config.level)?;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    let layer = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| Error::Other(format!("failed to install tracing subscriber: {e}")))?;

    tracing::debug!(level = %level, format = ?config.format, "logging initialized");
    Ok(())
}

// Our crate at the requested level, everything else (reqwest, hyper) one notch quieter.
fn default_directive(level: Level) -> String {
    let deps = if level == Level::TRACE {
        "debug"
    } else if level == Level::ERROR {
        "error"
    } else {
        "warn"
    };
    format!("{deps},sticker_exporter={level}")
}

/// Parse log level from string
pub(crate) fn parse_log_level(level_str: &str) -> Result<Level> {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" | "warning" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(Error::config(
            "LOG_LEVEL",
            format!(
                "invalid log level: {level_str}. Must be one of: trace, debug, info, warn, error"
            ),
        )),
    }
}
