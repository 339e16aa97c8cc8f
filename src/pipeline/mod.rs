//! Pack export pipeline
//!
//! One run turns a pack identifier into delivered `.wastickers` files:
//! 1. Init - create a fresh [`Workspace`]
//! 2. Download - sticker-convert fetches the whole pack into `full_pack`
//! 3. Enumerate - list sticker files, sorted
//! 4. Chunk & convert - stage each chunk and convert it; a failed chunk is skipped
//! 5. Deliver - send every artifact, reporting individual send failures
//! 6. Cleanup - remove the workspace, whatever happened above
//!
//! Runs share nothing mutable, so any number can execute concurrently.

use crate::artifact::locate_artifact;
use crate::chunking::{chunk_files, list_sticker_files, materialize_chunk};
use crate::config::Config;
use crate::error::{Result, ToolFailure};
use crate::identifier::PackId;
use crate::tool::{ConvertArgs, DownloadArgs, ToolCapabilities, ToolRunner, chunk_title};
use crate::workspace::Workspace;
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod messages;
mod report;
mod responder;

pub use report::{ExportOutcome, ExportReport};
pub use responder::Responder;
pub(crate) use responder::notify;

/// Settings an export run needs, extracted from [`Config`]
#[derive(Debug)]
pub struct PipelineSettings {
    /// Token sticker-convert uses to download packs
    pub bot_token: SecretString,
    /// Maximum stickers per converted pack
    pub max_per_pack: usize,
    /// Timeout for each sticker-convert invocation
    pub command_timeout: Duration,
    /// Author written into converted packs
    pub author: String,
    /// `--processes` (0 = omitted)
    pub processes: u32,
    /// `--steps` (None = omitted)
    pub steps: Option<String>,
    /// Parent directory for workspaces (None = system temp)
    pub workspace_dir: Option<PathBuf>,
    /// Telethon credentials are configured
    pub telethon_requested: bool,
}

impl PipelineSettings {
    /// Extract pipeline settings from the bot configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            bot_token: SecretString::new(config.bot.token.expose_secret().clone()),
            max_per_pack: config.export.max_per_pack,
            command_timeout: config.tools.command_timeout,
            author: config.export.author.clone(),
            processes: config.tools.processes,
            steps: config.tools.steps.clone(),
            workspace_dir: config.export.workspace_dir.clone(),
            telethon_requested: config.wants_telethon(),
        }
    }
}

/// Export pipeline executor
///
/// Holds only immutable state; share it behind an `Arc` across request tasks.
pub struct ExportPipeline {
    /// External tool used for download and conversion
    runner: Arc<dyn ToolRunner>,
    /// Flags supported by the installed tool, probed once at startup
    capabilities: ToolCapabilities,
    settings: PipelineSettings,
}

impl ExportPipeline {
    /// Create a new pipeline executor
    pub fn new(
        runner: Arc<dyn ToolRunner>,
        capabilities: ToolCapabilities,
        settings: PipelineSettings,
    ) -> Self {
        if settings.telethon_requested && !capabilities.telethon_download {
            warn!(
                "TELETHON_API_ID/HASH provided but sticker-convert does not support \
                 --download-telegram-telethon; falling back to normal download, private packs may fail"
            );
        }
        Self {
            runner,
            capabilities,
            settings,
        }
    }

    /// Maximum stickers per converted pack
    pub fn max_per_pack(&self) -> usize {
        self.settings.max_per_pack
    }

    /// Whether downloads use sticker-convert's Telethon mode
    pub fn uses_telethon(&self) -> bool {
        self.settings.telethon_requested && self.capabilities.telethon_download
    }

    /// Export `pack` and deliver the results through `responder`
    ///
    /// Never fails: every error is reported to the requester as a status string
    /// and summarized in the returned [`ExportReport`]. The workspace is removed
    /// before this returns.
    pub async fn run(&self, pack: &PackId, responder: &dyn Responder) -> ExportReport {
        let mut report = ExportReport::new(pack);

        let workspace = match Workspace::create(self.settings.workspace_dir.as_deref(), pack).await
        {
            Ok(workspace) => workspace,
            Err(e) => {
                error!(pack = %pack, error = %e, "failed to create workspace");
                notify(responder, messages::WORKSPACE_FAILED).await;
                report.outcome = ExportOutcome::WorkspaceFailed;
                return report;
            }
        };
        report.workspace = Some(workspace.root().to_path_buf());
        info!(pack = %pack, workspace = %workspace.root().display(), "workspace created");

        report.outcome = match self.export(pack, &workspace, responder, &mut report).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(pack = %pack, error = %e, "unexpected error during export");
                notify(responder, &messages::unexpected(&e.to_string())).await;
                ExportOutcome::Internal(e.to_string())
            }
        };

        workspace.release().await;

        info!(
            pack = %pack,
            outcome = ?report.outcome,
            total_files = report.total_files,
            chunks = report.chunks,
            failed_chunks = report.failed_chunks.len(),
            delivered = report.artifacts_delivered,
            "export finished"
        );
        report
    }

    async fn export(
        &self,
        pack: &PackId,
        workspace: &Workspace,
        responder: &dyn Responder,
        report: &mut ExportReport,
    ) -> Result<ExportOutcome> {
        let full_dir = workspace.full_pack_dir();

        if let Some(failure) = self.download(pack, workspace, &full_dir).await? {
            let text = match &failure {
                ToolFailure::TimedOut(after) => messages::download_timed_out(*after),
                ToolFailure::NonZeroExit { .. } => messages::DOWNLOAD_FAILED.to_string(),
            };
            notify(responder, &text).await;
            return Ok(ExportOutcome::DownloadFailed(failure));
        }

        let files = list_sticker_files(&full_dir).await?;
        report.total_files = files.len();
        info!(pack = %pack, total = files.len(), "found sticker files");

        if files.is_empty() {
            notify(responder, messages::NO_STICKERS).await;
            return Ok(ExportOutcome::NoStickers);
        }

        let max = self.settings.max_per_pack;
        notify(responder, &messages::downloaded(files.len(), max)).await;

        let mut artifacts = Vec::new();
        for (offset, chunk) in chunk_files(&files, max).enumerate() {
            let index = offset + 1;
            report.chunks = index;
            match self.convert_chunk(pack, workspace, index, chunk).await? {
                ChunkResult::Artifact(path) => artifacts.push(path),
                ChunkResult::Missing => report.missing_artifacts.push(index),
                ChunkResult::Failed(failure) => {
                    report.failed_chunks.push(index);
                    let text = match failure {
                        ToolFailure::TimedOut(_) => messages::chunk_timed_out(index),
                        ToolFailure::NonZeroExit { .. } => messages::chunk_failed(index),
                    };
                    notify(responder, &text).await;
                }
            }
        }

        if artifacts.is_empty() {
            notify(responder, messages::NO_ARTIFACTS).await;
            return Ok(ExportOutcome::NoArtifacts);
        }

        self.deliver(&artifacts, responder, report).await;
        notify(responder, messages::ALL_DONE).await;
        Ok(ExportOutcome::Completed)
    }

    /// Run the download; `Some(failure)` when sticker-convert did not succeed
    async fn download(
        &self,
        pack: &PackId,
        workspace: &Workspace,
        full_dir: &Path,
    ) -> Result<Option<ToolFailure>> {
        let args = DownloadArgs {
            pack,
            token: self.settings.bot_token.expose_secret(),
            output_dir: full_dir,
            use_telethon: self.uses_telethon(),
        }
        .build();

        let output = self
            .runner
            .invoke(&args, Some(workspace.root()), self.settings.command_timeout)
            .await?;

        let failure = output.failure();
        if let Some(failure) = &failure {
            error!(
                pack = %pack,
                failure = %failure,
                stderr = %output.stderr,
                "download command failed"
            );
        }
        Ok(failure)
    }

    async fn convert_chunk(
        &self,
        pack: &PackId,
        workspace: &Workspace,
        index: usize,
        files: &[PathBuf],
    ) -> Result<ChunkResult> {
        let chunk_dir = workspace.chunk_dir(index);
        materialize_chunk(files, &chunk_dir).await?;

        let output_dir = workspace.output_dir(index);
        tokio::fs::create_dir_all(&output_dir).await?;

        let args = ConvertArgs {
            input_dir: &chunk_dir,
            output_dir: &output_dir,
            title: chunk_title(pack, index),
            author: &self.settings.author,
            processes: self.settings.processes,
            steps: self.settings.steps.as_deref(),
        }
        .build();

        let output = self
            .runner
            .invoke(&args, Some(workspace.root()), self.settings.command_timeout)
            .await?;

        if let Some(failure) = output.failure() {
            error!(
                pack = %pack,
                chunk = index,
                failure = %failure,
                stderr = %output.stderr,
                "conversion failed for chunk"
            );
            return Ok(ChunkResult::Failed(failure));
        }

        match locate_artifact(&output_dir).await? {
            Some(path) => {
                info!(pack = %pack, chunk = index, artifact = %path.display(), "created export");
                Ok(ChunkResult::Artifact(path))
            }
            None => {
                warn!(pack = %pack, chunk = index, "no .wastickers produced for chunk");
                Ok(ChunkResult::Missing)
            }
        }
    }

    async fn deliver(
        &self,
        artifacts: &[PathBuf],
        responder: &dyn Responder,
        report: &mut ExportReport,
    ) {
        for artifact in artifacts {
            let name = artifact
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| artifact.display().to_string());

            match responder.send_document(artifact).await {
                Ok(()) => report.artifacts_delivered += 1,
                Err(e) => {
                    error!(artifact = %artifact.display(), error = %e, "failed to send export");
                    notify(responder, &messages::send_failed(&name)).await;
                    report.delivery_failures.push(name);
                }
            }
        }
    }
}

enum ChunkResult {
    Artifact(PathBuf),
    Missing,
    Failed(ToolFailure),
}
