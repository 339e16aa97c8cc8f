//! Configuration types for sticker-exporter
//!
//! Every setting is sourced from the environment (optionally seeded from a `.env`
//! file by the binary). [`Config::from_lookup`] takes the lookup as a closure so
//! tests never have to touch the real process environment.

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Telegram bot settings
#[derive(Debug)]
pub struct BotConfig {
    /// Bot token issued by @BotFather (`BOT_TOKEN`, required)
    pub token: SecretString,

    /// Bot API base URL (default: "https://api.telegram.org")
    pub api_url: String,

    /// Long-poll timeout for `getUpdates` (default: 30 seconds)
    pub poll_timeout: Duration,
}

/// External tool (sticker-convert) settings
#[derive(Debug)]
pub struct ToolsConfig {
    /// Path to sticker-convert executable (auto-detected if None)
    pub sticker_convert_path: Option<PathBuf>,

    /// Both `TELETHON_API_ID` and `TELETHON_API_HASH` are set, so private pack
    /// downloads through Telethon were requested
    pub telethon: bool,

    /// Timeout for each sticker-convert invocation (default: 600 seconds)
    pub command_timeout: Duration,

    /// Value for `--processes` (0 = let sticker-convert decide)
    pub processes: u32,

    /// Value for `--steps` (None = tool default)
    pub steps: Option<String>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            sticker_convert_path: None,
            telethon: false,
            command_timeout: default_command_timeout(),
            processes: 0,
            steps: None,
        }
    }
}

/// Export behavior (chunk size, metadata, workspace location)
#[derive(Clone, Debug)]
pub struct ExportConfig {
    /// Maximum stickers per WhatsApp pack (default: 30)
    pub max_per_pack: usize,

    /// Author written into each converted pack (default: "Converted Bot")
    pub author: String,

    /// Parent directory for per-request workspaces (None = system temp dir)
    pub workspace_dir: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_per_pack: default_max_per_pack(),
            author: default_author(),
            workspace_dir: None,
        }
    }
}

/// Retry configuration for transient Bot API failures
#[derive(Clone, Debug)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 5)
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Log output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable console output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::config(
                "LOG_FORMAT",
                format!("unknown log format '{other}' (expected 'pretty' or 'json')"),
            )),
        }
    }
}

/// Logging configuration
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    pub level: String,

    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Main configuration for the bot
///
/// Groups settings into sub-configs:
/// - [`bot`](BotConfig) - token and Bot API endpoint
/// - [`tools`](ToolsConfig) - sticker-convert binary, credentials, tuning
/// - [`export`](ExportConfig) - chunk size, pack metadata, workspace location
/// - [`retry`](RetryConfig) - Bot API backoff
/// - [`logging`](LoggingConfig) - log level and format
#[derive(Debug)]
pub struct Config {
    /// Telegram bot settings
    pub bot: BotConfig,

    /// External tool settings
    pub tools: ToolsConfig,

    /// Export behavior
    pub export: ExportConfig,

    /// Retry behavior for Bot API calls
    pub retry: RetryConfig,

    /// Logging
    pub logging: LoggingConfig,
}

impl Config {
    /// Build configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `BOT_TOKEN` is missing or any value is malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let token = get("BOT_TOKEN")
            .ok_or_else(|| Error::config("BOT_TOKEN", "BOT_TOKEN environment variable is required"))?;

        let bot = BotConfig {
            token: SecretString::new(token),
            api_url: get("TELEGRAM_API_URL").unwrap_or_else(default_api_url),
            poll_timeout: parse_var::<u64>(&get, "POLL_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or_else(default_poll_timeout),
        };

        // sticker-convert reads the credentials itself; only their presence matters here
        let telethon = get("TELETHON_API_ID").is_some() && get("TELETHON_API_HASH").is_some();

        let tools = ToolsConfig {
            sticker_convert_path: get("STICKER_CONVERT_BIN").map(PathBuf::from),
            telethon,
            command_timeout: parse_var::<u64>(&get, "CMD_TIMEOUT")?
                .map(Duration::from_secs)
                .unwrap_or_else(default_command_timeout),
            processes: parse_var(&get, "STICKER_CONVERT_PROCESSES")?.unwrap_or(0),
            steps: get("STICKER_CONVERT_STEPS"),
        };

        let export = ExportConfig {
            max_per_pack: parse_var(&get, "MAX_PER_PACK")?.unwrap_or_else(default_max_per_pack),
            author: get("EXPORT_AUTHOR").unwrap_or_else(default_author),
            workspace_dir: get("WORKSPACE_DIR").map(PathBuf::from),
        };

        let logging = LoggingConfig {
            level: get("LOG_LEVEL").unwrap_or_else(default_log_level),
            format: get("LOG_FORMAT")
                .map(|v| v.parse())
                .transpose()?
                .unwrap_or_default(),
        };

        let config = Config {
            bot,
            tools,
            export,
            retry: RetryConfig::default(),
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check constraints the individual parsers cannot express
    pub fn validate(&self) -> Result<()> {
        crate::logging::parse_log_level(&self.logging.level)?;
        if self.export.max_per_pack == 0 {
            return Err(Error::config("MAX_PER_PACK", "MAX_PER_PACK must be at least 1"));
        }
        if self.tools.command_timeout.is_zero() {
            return Err(Error::config("CMD_TIMEOUT", "CMD_TIMEOUT must be at least 1 second"));
        }
        if !(self.bot.api_url.starts_with("http://") || self.bot.api_url.starts_with("https://"))
        {
            return Err(Error::config(
                "TELEGRAM_API_URL",
                format!("'{}' is not an http(s) URL", self.bot.api_url),
            ));
        }
        Ok(())
    }

    /// Whether private-pack downloads were requested via Telethon credentials
    pub fn wants_telethon(&self) -> bool {
        self.tools.telethon
    }
}

fn parse_var<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| Error::config(key, format!("invalid value '{raw}' for {key}: {e}")))
        })
        .transpose()
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_max_per_pack() -> usize {
    30
}

fn default_author() -> String {
    "Converted Bot".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}
