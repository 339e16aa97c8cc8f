//! Summary of one export run

use crate::error::ToolFailure;
use crate::identifier::PackId;
use std::path::PathBuf;

/// Terminal state of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// At least one artifact was produced and delivery was attempted
    Completed,
    /// The workspace could not be created; nothing else ran
    WorkspaceFailed,
    /// The download invocation failed; no conversion ran
    DownloadFailed(ToolFailure),
    /// The download produced no sticker files; no chunk was created
    NoStickers,
    /// Every chunk failed or produced no artifact
    NoArtifacts,
    /// An unexpected error aborted the run
    Internal(String),
}

/// What happened during one [`ExportPipeline::run`](super::ExportPipeline::run)
#[must_use]
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Pack that was exported
    pub pack: PackId,
    /// Terminal state
    pub outcome: ExportOutcome,
    /// Sticker files found after download
    pub total_files: usize,
    /// Chunks the files were split into
    pub chunks: usize,
    /// 1-based indices of chunks whose conversion failed
    pub failed_chunks: Vec<usize>,
    /// 1-based indices of chunks that converted but left no artifact
    pub missing_artifacts: Vec<usize>,
    /// Artifacts sent successfully
    pub artifacts_delivered: usize,
    /// File names that could not be sent
    pub delivery_failures: Vec<String>,
    /// Root of the (already removed) workspace, if one was created
    pub workspace: Option<PathBuf>,
}

impl ExportReport {
    pub(crate) fn new(pack: &PackId) -> Self {
        Self {
            pack: pack.clone(),
            outcome: ExportOutcome::Internal("export did not finish".into()),
            total_files: 0,
            chunks: 0,
            failed_chunks: Vec::new(),
            missing_artifacts: Vec::new(),
            artifacts_delivered: 0,
            delivery_failures: Vec::new(),
            workspace: None,
        }
    }

    /// Whether the run ended in [`ExportOutcome::Completed`]
    pub fn is_completed(&self) -> bool {
        self.outcome == ExportOutcome::Completed
    }
}
