//! External conversion tool (sticker-convert) invocation
//!
//! The core abstraction is the [`ToolRunner`] trait: run the tool with some
//! arguments, inside an optional working directory, bounded by a timeout.
//!
//! - [`CliToolRunner`]: spawns the real binary via `tokio::process`
//! - [`ToolCapabilities`]: flags advertised by the installed binary, probed once
//! - [`DownloadArgs`] / [`ConvertArgs`]: the two command shapes the bot uses
//!
//! ## Usage
//!
//! ```no_run
//! use sticker_exporter::tool::{CliToolRunner, ToolCapabilities};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let runner = CliToolRunner::resolve(None);
//! let caps = ToolCapabilities::probe(&runner, Duration::from_secs(60)).await;
//! println!("telethon downloads: {}", caps.telethon_download);
//! # }
//! ```

mod args;
mod capabilities;
mod cli;
mod traits;

pub use args::{ConvertArgs, DownloadArgs, WHATSAPP_PRESET, chunk_title};
pub use capabilities::{TELETHON_DOWNLOAD_FLAG, ToolCapabilities};
pub use cli::{CliToolRunner, DEFAULT_BINARY_NAME};
pub use traits::{ToolOutput, ToolRunner, ToolStatus};
