//! Per-request workspace lifecycle
//!
//! A [`Workspace`] owns every file downloaded or generated for one export. It is
//! created fresh for each request and removed exactly once when the request ends:
//! explicitly through [`Workspace::release`] on every normal path, and through the
//! inner [`TempDir`]'s `Drop` if the task unwinds before reaching it.

use crate::error::{Error, Result};
use crate::identifier::PackId;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::task::spawn_blocking;
use tracing::{debug, warn};

/// Subdirectory receiving the raw downloaded pack
const FULL_PACK_DIR: &str = "full_pack";

/// Ephemeral directory tree scoped to one export request
///
/// Layout:
/// - `<root>/full_pack` - files downloaded by sticker-convert
/// - `<root>/chunk_<n>` - linked/copied files of the n-th chunk (1-based)
/// - `<root>/output_<n>` - export produced for the n-th chunk
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace for `pack`
    ///
    /// The root is created under `parent` (created if missing) or the system
    /// temp directory, with a `pack_<name>_` prefix so stray directories are
    /// easy to attribute.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Workspace`] if the directories cannot be created.
    pub async fn create(parent: Option<&Path>, pack: &PackId) -> Result<Self> {
        let parent = parent.map(Path::to_path_buf);
        let prefix = format!("pack_{pack}_");

        spawn_blocking(move || {
            let mut builder = tempfile::Builder::new();
            builder.prefix(&prefix);

            let (dir, location) = match &parent {
                Some(parent) => {
                    std::fs::create_dir_all(parent).map_err(|e| Error::Workspace {
                        path: parent.clone(),
                        reason: e.to_string(),
                    })?;
                    (builder.tempdir_in(parent), parent.clone())
                }
                None => (builder.tempdir(), std::env::temp_dir()),
            };
            let dir = dir.map_err(|e| Error::Workspace {
                path: location,
                reason: e.to_string(),
            })?;

            let full_pack = dir.path().join(FULL_PACK_DIR);
            std::fs::create_dir_all(&full_pack).map_err(|e| Error::Workspace {
                path: full_pack.clone(),
                reason: e.to_string(),
            })?;

            Ok(Self { dir })
        })
        .await
        .map_err(|e| Error::Other(format!("workspace creation task failed: {e}")))?
    }

    /// Root directory of this workspace
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the pack is downloaded into
    pub fn full_pack_dir(&self) -> PathBuf {
        self.root().join(FULL_PACK_DIR)
    }

    /// Directory holding the files of chunk `index` (1-based)
    pub fn chunk_dir(&self, index: usize) -> PathBuf {
        self.root().join(format!("chunk_{index}"))
    }

    /// Directory receiving the export of chunk `index` (1-based)
    pub fn output_dir(&self, index: usize) -> PathBuf {
        self.root().join(format!("output_{index}"))
    }

    /// Recursively remove the workspace
    ///
    /// Consumes the workspace so removal happens at most once. Failures are
    /// logged and otherwise ignored.
    pub async fn release(self) {
        let root = self.root().to_path_buf();
        match spawn_blocking(move || self.dir.close()).await {
            Ok(Ok(())) => debug!(workspace = %root.display(), "workspace removed"),
            Ok(Err(e)) => {
                warn!(workspace = %root.display(), error = %e, "could not remove workspace")
            }
            Err(e) => {
                warn!(workspace = %root.display(), error = %e, "workspace removal task failed")
            }
        }
    }
}
