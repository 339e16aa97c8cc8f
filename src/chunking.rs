//! Sticker enumeration and chunk materialization
//!
//! WhatsApp caps a sticker pack at 30 items, so a downloaded Telegram pack is
//! split into contiguous chunks of at most `max_per_pack` files, each staged in
//! its own directory before conversion.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Extensions sticker-convert produces for static, animated and video stickers
pub const STICKER_EXTENSIONS: &[&str] = &["webp", "tgs", "png", "webm"];

/// Whether `path` has one of the [`STICKER_EXTENSIONS`] (case-insensitive)
pub fn is_sticker_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            STICKER_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// List sticker files directly inside `dir`, sorted by path
///
/// Subdirectories and files with other extensions are skipped.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub async fn list_sticker_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !is_sticker_file(&path) {
            continue;
        }
        if fs::metadata(&path).await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Split `files` into contiguous chunks of at most `max_per_chunk`
///
/// Chunk boundaries are `[i, i + max)`; only the last chunk may be shorter.
/// A `max_per_chunk` of 0 is treated as 1 (configuration rejects it earlier).
pub fn chunk_files<T>(files: &[T], max_per_chunk: usize) -> std::slice::Chunks<'_, T> {
    files.chunks(max_per_chunk.max(1))
}

/// Stage `files` inside `chunk_dir`
///
/// Each file is hard-linked into place; if linking fails (cross-device,
/// permissions, unsupported filesystem) it is copied instead.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created or a file can be
/// neither linked nor copied.
pub async fn materialize_chunk(files: &[PathBuf], chunk_dir: &Path) -> Result<()> {
    fs::create_dir_all(chunk_dir).await?;

    for source in files {
        let Some(name) = source.file_name() else {
            continue;
        };
        let target = chunk_dir.join(name);
        if let Err(e) = fs::hard_link(source, &target).await {
            debug!(
                source = %source.display(),
                error = %e,
                "hard link failed, copying instead"
            );
            fs::copy(source, &target).await?;
        }
    }

    Ok(())
}
