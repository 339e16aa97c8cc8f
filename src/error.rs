//! Error types for sticker-exporter
//!
//! This module provides the library-wide error type, including:
//! - Configuration errors carrying the offending environment key
//! - Telegram Bot API errors with the server-provided description
//! - External tool failures (spawn errors and non-zero/timeout outcomes)

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for sticker-exporter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sticker-exporter
///
/// User-facing replies never expose these variants directly; the pipeline turns
/// them into plain status strings and keeps the detail for the logs.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The environment key that caused the error (e.g., "MAX_PER_PACK")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Workspace could not be created or prepared
    #[error("workspace error at {path}: {reason}")]
    Workspace {
        /// The directory that could not be created
        path: PathBuf,
        /// The underlying reason
        reason: String,
    },

    /// Network error talking to the Bot API
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The Bot API answered with `ok: false`
    #[error("Telegram API error {code}: {description}")]
    TelegramApi {
        /// The `error_code` field (HTTP-like status)
        code: i32,
        /// The `description` field
        description: String,
        /// Seconds to wait before retrying, sent with 429 responses
        retry_after: Option<u64>,
    },

    /// External tool could not be executed at all (missing binary, permissions)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to an environment key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Why an external tool invocation did not succeed
///
/// Unlike [`Error`], these are ordinary outcomes: callers decide whether a
/// failure aborts the request (download) or only skips one unit (conversion).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolFailure {
    /// The process ran and exited unsuccessfully
    #[error("exited with code {}", code.map_or_else(|| "none (signal)".to_string(), |c| c.to_string()))]
    NonZeroExit {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
    },

    /// The process did not finish within the configured timeout and was killed
    #[error("timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}
