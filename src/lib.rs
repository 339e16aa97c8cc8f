//! # sticker-exporter
//!
//! Telegram bot that exports whole sticker packs as WhatsApp `.wastickers` bundles.
//!
//! A user sends a sticker, a `t.me/addstickers/<name>` link, or a bare pack name.
//! The bot downloads the pack with the external `sticker-convert` tool, splits it
//! into chunks that fit WhatsApp's per-pack limit, converts each chunk, and sends
//! the resulting files back into the chat.
//!
//! ## Layout
//!
//! - [`identifier`] - pack links and names to a validated [`PackId`]
//! - [`tool`] - the [`ToolRunner`](tool::ToolRunner) seam around sticker-convert
//! - [`workspace`], [`chunking`], [`artifact`] - filesystem stages of an export
//! - [`pipeline`] - [`ExportPipeline`] orchestrating one export end to end
//! - [`telegram`] - Bot API client and long-polling dispatcher
//!
//! ## Quick Start
//!
//! ```no_run
//! use sticker_exporter::pipeline::{ExportPipeline, PipelineSettings};
//! use sticker_exporter::telegram::{Bot, BotApi};
//! use sticker_exporter::tool::{CliToolRunner, ToolCapabilities};
//! use sticker_exporter::{Config, run_with_shutdown};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!
//!     let runner = CliToolRunner::resolve(config.tools.sticker_convert_path.as_deref());
//!     let caps = ToolCapabilities::probe(&runner, config.tools.command_timeout).await;
//!     let pipeline = ExportPipeline::new(
//!         Arc::new(runner),
//!         caps,
//!         PipelineSettings::from_config(&config),
//!     );
//!
//!     let api = BotApi::new(&config.bot.api_url, &config.bot.token, config.retry.clone())?;
//!     let bot = Bot::new(Arc::new(api), Arc::new(pipeline), config.bot.poll_timeout);
//!
//!     run_with_shutdown(bot).await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Export artifact discovery
pub mod artifact;
/// Sticker file enumeration and chunking
pub mod chunking;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Pack identifier extraction
pub mod identifier;
/// Tracing subscriber setup
pub mod logging;
pub mod pipeline;
/// Retry logic with exponential backoff
pub mod retry;
pub mod telegram;
pub mod tool;
/// Per-request scratch directories
pub mod workspace;

pub use config::Config;
pub use error::{Error, Result, ToolFailure};
pub use identifier::{PackId, extract_pack_id};
pub use pipeline::{ExportOutcome, ExportPipeline, ExportReport, PipelineSettings, Responder};
pub use telegram::{Bot, BotApi};
pub use tool::{CliToolRunner, ToolCapabilities, ToolRunner};

use tokio_util::sync::CancellationToken;

/// Run the bot until SIGTERM or SIGINT, then drain in-flight exports
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(bot: Bot) {
    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.cancel();
    });
    bot.run(shutdown).await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
                _ = sigint.recv() => tracing::info!("received SIGINT, shutting down"),
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("received SIGINT, shutting down");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("received SIGTERM, shutting down");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl+C, shutting down"),
        Err(e) => tracing::error!(error = %e, "failed to listen for Ctrl+C"),
    }
}
