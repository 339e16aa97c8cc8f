//! One-time capability probe of the installed sticker-convert

use super::traits::ToolRunner;
use std::ffi::OsString;
use std::time::Duration;
use tracing::{error, info, warn};

/// Flag that switches sticker-convert's downloader to Telethon (private packs)
pub const TELETHON_DOWNLOAD_FLAG: &str = "--download-telegram-telethon";

/// Features the installed sticker-convert advertises
///
/// Probed once at startup and passed by value into the pipeline; it never
/// changes for the lifetime of the process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolCapabilities {
    /// Supports [`TELETHON_DOWNLOAD_FLAG`]
    pub telethon_download: bool,
}

impl ToolCapabilities {
    /// Derive capabilities from the tool's `--help` text
    pub fn from_help(help: &str) -> Self {
        Self {
            telethon_download: help.contains(TELETHON_DOWNLOAD_FLAG),
        }
    }

    /// Run `--help` once and inspect the advertised flags
    ///
    /// Any failure (missing binary, non-zero exit, timeout) yields the empty
    /// capability set rather than an error.
    pub async fn probe(runner: &dyn ToolRunner, timeout: Duration) -> Self {
        let args = [OsString::from("--help")];
        match runner.invoke(&args, None, timeout).await {
            Ok(output) if output.is_success() => {
                let caps = Self::from_help(&output.stdout);
                info!(
                    runner = runner.name(),
                    telethon_download = caps.telethon_download,
                    "probed sticker-convert capabilities"
                );
                caps
            }
            Ok(output) => {
                warn!(
                    runner = runner.name(),
                    status = ?output.status,
                    "could not inspect sticker-convert flags"
                );
                Self::default()
            }
            Err(e) => {
                error!(runner = runner.name(), error = %e, "sticker-convert binary could not be executed");
                Self::default()
            }
        }
    }
}
