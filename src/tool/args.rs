//! Argument builders for sticker-convert's download and convert modes

use super::capabilities::TELETHON_DOWNLOAD_FLAG;
use crate::identifier::PackId;
use std::ffi::OsString;
use std::path::Path;

/// Preset and export target requested from sticker-convert
pub const WHATSAPP_PRESET: &str = "whatsapp";

/// Arguments for downloading a whole pack
#[derive(Debug)]
pub struct DownloadArgs<'a> {
    /// Pack to download
    pub pack: &'a PackId,
    /// Bot token sticker-convert authenticates with
    pub token: &'a str,
    /// Directory receiving the raw sticker files
    pub output_dir: &'a Path,
    /// Prepend the Telethon download flag
    pub use_telethon: bool,
}

impl DownloadArgs<'_> {
    /// Render the argument vector
    pub fn build(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(8);
        if self.use_telethon {
            args.push(TELETHON_DOWNLOAD_FLAG.into());
        }
        args.push("--download-telegram".into());
        args.push(self.pack.source_url().into());
        args.push("--telegram-token".into());
        args.push(self.token.into());
        args.push("--no-compress".into());
        args.push("--output-dir".into());
        args.push(self.output_dir.into());
        args
    }
}

/// Arguments for converting one chunk directory into a `.wastickers` export
#[derive(Debug)]
pub struct ConvertArgs<'a> {
    /// Directory holding the chunk's sticker files
    pub input_dir: &'a Path,
    /// Directory receiving the export
    pub output_dir: &'a Path,
    /// Pack title shown in WhatsApp
    pub title: String,
    /// Pack author shown in WhatsApp
    pub author: &'a str,
    /// `--processes` value; omitted when 0
    pub processes: u32,
    /// `--steps` value; omitted when `None`
    pub steps: Option<&'a str>,
}

impl ConvertArgs<'_> {
    /// Render the argument vector
    pub fn build(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--input-dir".into(),
            self.input_dir.into(),
            "--preset".into(),
            WHATSAPP_PRESET.into(),
            "--export-whatsapp".into(),
            "--output-dir".into(),
            self.output_dir.into(),
            "--title".into(),
            self.title.as_str().into(),
            "--author".into(),
            self.author.into(),
        ];
        if self.processes > 0 {
            args.push("--processes".into());
            args.push(self.processes.to_string().into());
        }
        if let Some(steps) = self.steps {
            args.push("--steps".into());
            args.push(steps.into());
        }
        args
    }
}

/// Title given to the `index`-th (1-based) chunk of a pack
pub fn chunk_title(pack: &PackId, index: usize) -> String {
    format!("{pack} - part {index}")
}
