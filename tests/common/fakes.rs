//! Recording fakes for the tool runner and the responder

use async_trait::async_trait;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use sticker_exporter::pipeline::Responder;
use sticker_exporter::tool::{ToolOutput, ToolRunner, ToolStatus};
use sticker_exporter::{Error, Result};

/// What the fake download does
#[derive(Debug, Clone)]
pub enum DownloadBehavior {
    /// Write these file names into the output directory and succeed
    Files(Vec<String>),
    /// Exit with this code
    Fail(i32),
    /// Report a timeout
    TimeOut,
    /// Fail to spawn at all
    SpawnError,
}

/// What the fake conversion does for one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertBehavior {
    /// Write `<title>.wastickers`
    Wastickers,
    /// Write `<title>.zip`
    Zip,
    /// Succeed without writing anything
    Nothing,
    /// Exit with code 1
    Fail,
    /// Report a timeout
    TimeOut,
}

/// One recorded invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub args: Vec<String>,
    pub workdir: Option<PathBuf>,
    /// Files present in `--input-dir` when a conversion ran
    pub input_files: Vec<String>,
}

impl Invocation {
    pub fn is_download(&self) -> bool {
        self.args.iter().any(|a| a == "--download-telegram")
    }

    pub fn is_convert(&self) -> bool {
        self.args.iter().any(|a| a == "--export-whatsapp")
    }

    /// Value following `flag`
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// [`ToolRunner`] that imitates sticker-convert on the filesystem
pub struct FakeRunner {
    download: DownloadBehavior,
    /// Behavior per chunk, 1-based by position; chunks past the end use `Wastickers`
    convert: Vec<ConvertBehavior>,
    help: String,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new(download: DownloadBehavior) -> Self {
        Self {
            download,
            convert: Vec::new(),
            help: String::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Download that yields `count` sticker files
    pub fn with_stickers(count: usize) -> Self {
        Self::new(DownloadBehavior::Files(super::sticker_names(count)))
    }

    pub fn convert(mut self, behaviors: Vec<ConvertBehavior>) -> Self {
        self.convert = behaviors;
        self
    }

    pub fn help(mut self, help: &str) -> Self {
        self.help = help.to_string();
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<Invocation> {
        self.calls().into_iter().filter(Invocation::is_download).collect()
    }

    pub fn converts(&self) -> Vec<Invocation> {
        self.calls().into_iter().filter(Invocation::is_convert).collect()
    }

    fn run_download(&self, args: &[String], timeout: Duration) -> Result<ToolOutput> {
        let out_dir = value_after(args, "--output-dir").map(PathBuf::from);
        match &self.download {
            DownloadBehavior::Files(names) => {
                let dir = out_dir.ok_or_else(|| Error::Other("no --output-dir".into()))?;
                std::fs::create_dir_all(&dir)?;
                for name in names {
                    std::fs::write(dir.join(name), name.as_bytes())?;
                }
                Ok(ToolOutput::success("downloaded"))
            }
            DownloadBehavior::Fail(code) => Ok(ToolOutput::failed(*code, "pack not found")),
            DownloadBehavior::TimeOut => Ok(timed_out(timeout)),
            DownloadBehavior::SpawnError => Err(Error::ExternalTool(
                "Failed to execute sticker-convert: No such file or directory".into(),
            )),
        }
    }

    fn run_convert(&self, args: &[String], chunk: usize, timeout: Duration) -> Result<ToolOutput> {
        let behavior = self
            .convert
            .get(chunk - 1)
            .copied()
            .unwrap_or(ConvertBehavior::Wastickers);
        let out_dir = value_after(args, "--output-dir")
            .map(PathBuf::from)
            .ok_or_else(|| Error::Other("no --output-dir".into()))?;
        let title = value_after(args, "--title").unwrap_or("pack");

        match behavior {
            ConvertBehavior::Wastickers => {
                std::fs::write(out_dir.join(format!("{title}.wastickers")), b"bundle")?;
                Ok(ToolOutput::success("converted"))
            }
            ConvertBehavior::Zip => {
                std::fs::write(out_dir.join(format!("{title}.zip")), b"bundle")?;
                Ok(ToolOutput::success("converted"))
            }
            ConvertBehavior::Nothing => Ok(ToolOutput::success("nothing to do")),
            ConvertBehavior::Fail => Ok(ToolOutput::failed(1, "conversion error")),
            ConvertBehavior::TimeOut => Ok(timed_out(timeout)),
        }
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn invoke(
        &self,
        args: &[OsString],
        workdir: Option<&Path>,
        timeout: Duration,
    ) -> Result<ToolOutput> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        let input_files = value_after(&args, "--input-dir")
            .map(|d| super::entries_in(Path::new(d)))
            .map(|mut files| {
                files.sort();
                files
            })
            .unwrap_or_default();

        let invocation = Invocation {
            args: args.clone(),
            workdir: workdir.map(Path::to_path_buf),
            input_files,
        };
        let (is_download, is_convert) = (invocation.is_download(), invocation.is_convert());
        let chunk = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(invocation);
            calls.iter().filter(|c| c.is_convert()).count()
        };

        if args.iter().any(|a| a == "--help") {
            return Ok(ToolOutput::success(self.help.clone()));
        }
        if is_download {
            return self.run_download(&args, timeout);
        }
        if is_convert {
            return self.run_convert(&args, chunk, timeout);
        }
        Ok(ToolOutput::failed(2, "unrecognized arguments"))
    }

    fn name(&self) -> &'static str {
        "fake-sticker-convert"
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

fn timed_out(after: Duration) -> ToolOutput {
    ToolOutput {
        status: ToolStatus::TimedOut { after },
        stdout: String::new(),
        stderr: format!("timeout: no exit after {}s", after.as_secs()),
    }
}

/// [`Responder`] that records everything sent to the chat
#[derive(Default)]
pub struct RecordingResponder {
    /// Text and Markdown replies in order
    pub texts: Mutex<Vec<String>>,
    /// Replies sent through `reply_markdown`
    pub markdown: Mutex<Vec<String>>,
    /// File names of delivered documents, with their byte length at send time
    pub documents: Mutex<Vec<(String, usize)>>,
    fail_documents: HashSet<String>,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `send_document` fail for files with this name
    pub fn failing_document(mut self, name: &str) -> Self {
        self.fail_documents.insert(name.to_string());
        self
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }

    pub fn markdown(&self) -> Vec<String> {
        self.markdown.lock().unwrap().clone()
    }

    pub fn document_names(&self) -> Vec<String> {
        self.documents
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn has_text_containing(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn reply_text(&self, text: &str) -> Result<()> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn reply_markdown(&self, text: &str) -> Result<()> {
        self.markdown.lock().unwrap().push(text.to_string());
        self.texts.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn send_document(&self, path: &Path) -> Result<()> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.fail_documents.contains(&name) {
            return Err(Error::Other(format!("upload rejected: {name}")));
        }
        let len = std::fs::read(path)?.len();
        self.documents.lock().unwrap().push((name, len));
        Ok(())
    }
}
