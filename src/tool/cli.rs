//! Subprocess-backed tool runner using the external sticker-convert binary

use super::traits::{ToolOutput, ToolRunner, ToolStatus};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Executable name searched for in PATH
pub const DEFAULT_BINARY_NAME: &str = "sticker-convert";

/// Flags whose following argument must never reach the logs
const SECRET_FLAGS: &[&str] = &["--telegram-token"];

/// Captured output is truncated to this many characters in log lines
const LOG_OUTPUT_LIMIT: usize = 2000;

/// Tool runner that spawns the sticker-convert binary
///
/// Each invocation captures stdout/stderr and is bounded by the caller's timeout.
/// On Unix the child leads its own process group; a timed-out run has the whole
/// group killed, so helpers it spawned do not outlive the workspace.
///
/// # Examples
///
/// ```no_run
/// use sticker_exporter::tool::{CliToolRunner, ToolRunner};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let runner = CliToolRunner::resolve(None);
/// let output = runner
///     .invoke(&["--help".into()], None, Duration::from_secs(30))
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CliToolRunner {
    binary_path: PathBuf,
}

impl CliToolRunner {
    /// Create a runner with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find sticker-convert in PATH
    pub fn from_path() -> Option<Self> {
        which::which(DEFAULT_BINARY_NAME).ok().map(Self::new)
    }

    /// Resolve the binary once at startup
    ///
    /// An override that exists on disk wins. A missing override is logged and
    /// ignored in favour of a PATH lookup. If nothing is found the bare name is
    /// kept so spawn errors still name the expected program.
    pub fn resolve(override_path: Option<&Path>) -> Self {
        if let Some(path) = override_path {
            if path.exists() {
                return Self::new(path.to_path_buf());
            }
            warn!(
                path = %path.display(),
                "sticker-convert binary not found at override path, falling back to PATH lookup"
            );
        }
        Self::from_path().unwrap_or_else(|| {
            warn!("sticker-convert not found in PATH; invocations will likely fail");
            Self::new(PathBuf::from(DEFAULT_BINARY_NAME))
        })
    }

    /// Path of the binary this runner spawns
    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }
}

#[async_trait]
impl ToolRunner for CliToolRunner {
    async fn invoke(
        &self,
        args: &[OsString],
        workdir: Option<&Path>,
        timeout: Duration,
    ) -> crate::Result<ToolOutput> {
        let mut command = Command::new(&self.binary_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a timeout also reaches sticker-convert's workers and ffmpeg
        #[cfg(unix)]
        command.process_group(0);
        if let Some(dir) = workdir {
            command.current_dir(dir);
        }

        info!(command = %display_command(&self.binary_path, args), "running external tool");
        let started = Instant::now();

        let child = command.spawn().map_err(|e| {
            crate::Error::ExternalTool(format!(
                "Failed to execute {}: {}",
                self.binary_path.display(),
                e
            ))
        })?;
        let pid = child.id();

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(crate::Error::ExternalTool(format!(
                    "Failed to wait for {}: {}",
                    self.binary_path.display(),
                    e
                )));
            }
            Err(_) => {
                kill_process_group(pid);
                error!(
                    timeout_secs = timeout.as_secs(),
                    "external tool timed out, process group killed"
                );
                return Ok(ToolOutput {
                    status: ToolStatus::TimedOut { after: timeout },
                    stdout: String::new(),
                    stderr: format!("timeout: no exit after {}s", timeout.as_secs()),
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let elapsed_ms = started.elapsed().as_millis() as u64;

        debug!(elapsed_ms, stdout = %truncate_for_log(&stdout), "external tool finished");

        let status = if output.status.success() {
            ToolStatus::Success
        } else {
            let code = output.status.code();
            warn!(code = ?code, stderr = %truncate_for_log(&stderr), "external tool failed");
            ToolStatus::Failed { code }
        };

        Ok(ToolOutput {
            status,
            stdout,
            stderr,
        })
    }

    fn name(&self) -> &'static str {
        "cli-sticker-convert"
    }
}

/// SIGKILL every process in the group led by `pid`
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|id| i32::try_from(id).ok()) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers and touches no memory of ours
    if unsafe { libc::kill(-pgid, libc::SIGKILL) } != 0 {
        debug!(
            pgid,
            error = %std::io::Error::last_os_error(),
            "process group already gone"
        );
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Render a command line for logging with secret arguments masked
pub(crate) fn display_command(program: &Path, args: &[OsString]) -> String {
    let mut rendered = vec![program.display().to_string()];
    let mut mask_next = false;
    for arg in args {
        let arg = arg.to_string_lossy();
        if mask_next {
            rendered.push("***".to_string());
            mask_next = false;
            continue;
        }
        mask_next = SECRET_FLAGS.contains(&&*arg);
        rendered.push(arg.into_owned());
    }
    rendered.join(" ")
}

pub(crate) fn truncate_for_log(text: &str) -> &str {
    match text.char_indices().nth(LOG_OUTPUT_LIMIT) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
