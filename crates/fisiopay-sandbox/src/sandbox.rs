//! Parent-side sandbox: spawn the worker, enforce the wall clock, parse
//! the single-line reply

use crate::error::ExtractionError;
use crate::protocol::{find_reply, WorkerReply};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Name of the worker binary, expected next to the current executable
/// unless an explicit path is configured
pub const WORKER_BINARY: &str = "fisiopay-pdftext";

/// Sandbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Path to the worker binary; defaults to a sibling of the current
    /// executable
    #[serde(default)]
    pub worker_path: Option<PathBuf>,

    /// Wall-clock budget for one extraction (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            worker_path: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// The text-extraction sandbox
///
/// Each call spawns one worker process with the PDF path as its sole
/// argument. The worker's stdin and stderr are null devices - library
/// noise dies at the process boundary - and its stdout is read in full,
/// then scanned for the one protocol line. A worker that outlives the
/// timeout is killed and yields no text at all.
pub struct TextSandbox {
    worker_path: PathBuf,
    timeout: Duration,
}

impl TextSandbox {
    /// Create a sandbox with an explicit worker path and timeout
    pub fn new(worker_path: PathBuf, timeout: Duration) -> Self {
        Self {
            worker_path,
            timeout,
        }
    }

    /// Create a sandbox from configuration
    ///
    /// Without an explicit `worker_path` the worker is looked up next to
    /// the current executable, which is where cargo places sibling binaries.
    pub fn from_config(config: &SandboxConfig) -> Result<Self, ExtractionError> {
        let worker_path = match &config.worker_path {
            Some(path) => path.clone(),
            None => default_worker_path()?,
        };
        Ok(Self::new(worker_path, Duration::from_secs(config.timeout_secs)))
    }

    /// Extract the visible text of a PDF
    ///
    /// Returns the concatenated text of every page or an
    /// [`ExtractionError`]. Never retries: transient and permanent worker
    /// failures look the same from here.
    pub async fn extract_text(&self, pdf_path: &Path) -> Result<String, ExtractionError> {
        // The worker contract is an absolute path as the sole argument
        let pdf_path = std::path::absolute(pdf_path)?;
        debug!(worker = %self.worker_path.display(), pdf = %pdf_path.display(), "spawning extraction worker");

        let mut child = Command::new(&self.worker_path)
            .arg(&pdf_path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or(ExtractionError::MalformedOutput)?;

        let outcome = timeout(self.timeout, async {
            let mut output = String::new();
            stdout.read_to_string(&mut output).await?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, output))
        })
        .await;

        let (status, output) = match outcome {
            Err(_elapsed) => {
                warn!(pdf = %pdf_path.display(), "extraction worker timed out, killing it");
                let _ = child.kill().await;
                return Err(ExtractionError::Timeout);
            }
            Ok(result) => result?,
        };

        match find_reply(&output) {
            Some(WorkerReply::Success { success: true, text }) => Ok(text),
            Some(WorkerReply::Failure { error }) => Err(ExtractionError::Worker(error)),
            // A reply claiming success:false, or no parseable line at all
            _ => {
                warn!(exit = ?status.code(), "no protocol line in worker output");
                Err(ExtractionError::MalformedOutput)
            }
        }
    }
}

/// Worker path next to the current executable
fn default_worker_path() -> Result<PathBuf, ExtractionError> {
    let exe = std::env::current_exe()?;
    let dir = exe.parent().ok_or_else(|| {
        ExtractionError::Spawn(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "current executable has no parent directory",
        ))
    })?;
    Ok(dir.join(format!("{}{}", WORKER_BINARY, std::env::consts::EXE_SUFFIX)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = SandboxConfig::default();
        assert!(config.worker_path.is_none());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_explicit_worker_path_wins() {
        let config = SandboxConfig {
            worker_path: Some(PathBuf::from("/opt/fisiopay/bin/fisiopay-pdftext")),
            timeout_secs: 5,
        };
        let sandbox = TextSandbox::from_config(&config).unwrap();
        assert_eq!(
            sandbox.worker_path,
            PathBuf::from("/opt/fisiopay/bin/fisiopay-pdftext")
        );
        assert_eq!(sandbox.timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_worker_is_spawn_error() {
        let sandbox = TextSandbox::new(
            PathBuf::from("/nonexistent/worker-binary"),
            Duration::from_secs(1),
        );
        let result = sandbox.extract_text(Path::new("/tmp/whatever.pdf")).await;
        assert!(matches!(result, Err(ExtractionError::Spawn(_))));
    }
}
