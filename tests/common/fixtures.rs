//! Pipeline settings and sticker name generators

use secrecy::SecretString;
use std::path::Path;
use std::time::Duration;
use sticker_exporter::pipeline::PipelineSettings;

/// Token handed to the fake tool; tests assert it is passed through
pub const TEST_TOKEN: &str = "42:test-token";

/// Settings that place workspaces under `parent`
pub fn settings(parent: &Path, max_per_pack: usize) -> PipelineSettings {
    PipelineSettings {
        bot_token: SecretString::new(TEST_TOKEN.to_string()),
        max_per_pack,
        command_timeout: Duration::from_secs(5),
        author: "Converted Bot".to_string(),
        processes: 0,
        steps: None,
        workspace_dir: Some(parent.to_path_buf()),
        telethon_requested: false,
    }
}

/// `count` sticker file names with mixed extensions, zero-padded so they sort
pub fn sticker_names(count: usize) -> Vec<String> {
    let extensions = ["webp", "tgs", "webm", "png"];
    (0..count)
        .map(|i| format!("sticker_{i:03}.{}", extensions[i % extensions.len()]))
        .collect()
}

/// Entries left under a workspace parent directory
pub fn entries_in(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default()
}
