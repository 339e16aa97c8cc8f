//! Export artifact discovery
//!
//! sticker-convert writes one `.wastickers` bundle per conversion. Some builds
//! emit the same archive as `.zip`; that file is renamed so users can open it
//! directly with a WhatsApp sticker importer.

use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Extension of a WhatsApp sticker bundle
pub const ARTIFACT_EXTENSION: &str = "wastickers";

/// Extension accepted as a fallback and renamed to [`ARTIFACT_EXTENSION`]
pub const FALLBACK_EXTENSION: &str = "zip";

/// Find the export produced in `dir`
///
/// Returns the first `.wastickers` file (by name). Otherwise the first `.zip`
/// that can be renamed to `<stem>.wastickers` is renamed and returned. Returns
/// `None` when neither exists.
///
/// # Errors
///
/// Returns an I/O error if `dir` cannot be read. A failed rename is logged and
/// the next candidate is tried.
pub async fn locate_artifact(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut bundles = Vec::new();
    let mut archives = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if has_extension(&path, ARTIFACT_EXTENSION) {
            bundles.push(path);
        } else if has_extension(&path, FALLBACK_EXTENSION) {
            archives.push(path);
        }
    }

    bundles.sort();
    if let Some(found) = bundles.into_iter().next() {
        return Ok(Some(found));
    }

    archives.sort();
    for archive in archives {
        let target = archive.with_extension(ARTIFACT_EXTENSION);
        match fs::rename(&archive, &target).await {
            Ok(()) => {
                debug!(
                    from = %archive.display(),
                    to = %target.display(),
                    "renamed zip export to .wastickers"
                );
                return Ok(Some(target));
            }
            Err(e) => {
                warn!(archive = %archive.display(), error = %e, "could not rename zip export");
            }
        }
    }

    Ok(None)
}

fn has_extension(path: &Path, wanted: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(wanted))
}
