//! Traits and types for external tool invocation

use crate::error::ToolFailure;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

/// How an invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    /// Exit code 0
    Success,
    /// Non-zero exit, or terminated by a signal (`code: None`)
    Failed {
        /// Process exit code
        code: Option<i32>,
    },
    /// The timeout elapsed before the process finished; the process was killed
    TimedOut {
        /// The timeout that was exceeded
        after: Duration,
    },
}

impl ToolStatus {
    /// Whether the invocation succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, ToolStatus::Success)
    }
}

/// Captured result of one external tool invocation
#[must_use]
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Exit classification
    pub status: ToolStatus,
    /// Captured standard output (lossy UTF-8)
    pub stdout: String,
    /// Captured standard error (lossy UTF-8)
    pub stderr: String,
}

impl ToolOutput {
    /// Successful output with the given stdout
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Success,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            status: ToolStatus::Failed { code: Some(code) },
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the invocation succeeded
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The failure reason, or `None` on success
    pub fn failure(&self) -> Option<ToolFailure> {
        match self.status {
            ToolStatus::Success => None,
            ToolStatus::Failed { code } => Some(ToolFailure::NonZeroExit { code }),
            ToolStatus::TimedOut { after } => Some(ToolFailure::TimedOut(after)),
        }
    }
}

/// Trait for running the external conversion tool
///
/// The pipeline only ever talks to sticker-convert through this trait, so tests
/// substitute a fake that records arguments and writes fixture files instead of
/// spawning processes.
///
/// Implementations must report non-zero exits and timeouts through
/// [`ToolOutput::status`]; `Err` is reserved for failing to start the process.
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the tool with `args`, optionally inside `workdir`, bounded by `timeout`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ExternalTool`] if the process could not be spawned.
    async fn invoke(
        &self,
        args: &[OsString],
        workdir: Option<&Path>,
        timeout: Duration,
    ) -> crate::Result<ToolOutput>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
