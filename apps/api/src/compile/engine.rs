//! Typesetting engine invocation.
//!
//! The engine runs with the workspace as its working directory so template-relative
//! paths (`fonts/Lato.ttf`, `images/logo.png`) resolve without absolute paths in the
//! document. Its stdout is discarded; the `.log` it writes is what gets diagnosed.

use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch {engine}: {source}")]
    Launch {
        engine: String,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for {engine}: {source}")]
    Wait {
        engine: String,
        #[source]
        source: io::Error,
    },
}

impl EngineError {
    /// The binary does not exist or cannot be executed.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            EngineError::Launch { source, .. }
                if matches!(source.kind(), io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied)
        )
    }
}

/// How an engine run ended. Whether it produced a PDF is checked separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    /// `code` is `None` when the process was killed by a signal.
    Exited { code: Option<i32> },
    TimedOut,
}

#[async_trait]
pub trait TypesetEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Probes whether the engine can be launched at all.
    async fn is_available(&self) -> bool;

    /// Typesets `source_file` inside `workdir`, killing the run after `timeout`.
    async fn run(
        &self,
        workdir: &Path,
        source_file: &str,
        timeout: Duration,
    ) -> Result<EngineOutcome, EngineError>;
}

/// A TeX engine launched as a subprocess (`xelatex` by default).
#[derive(Debug, Clone)]
pub struct LatexEngine {
    binary: String,
    args: Vec<String>,
}

impl LatexEngine {
    /// Batch mode so the engine never waits on the terminal after an error.
    pub fn new(binary: impl Into<String>) -> Self {
        Self::with_args(
            binary,
            vec![
                "-interaction=nonstopmode".to_string(),
                "-output-directory=.".to_string(),
            ],
        )
    }

    /// `args` go before the source file name.
    pub fn with_args(binary: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            binary: binary.into(),
            args,
        }
    }
}

#[async_trait]
impl TypesetEngine for LatexEngine {
    fn name(&self) -> &str {
        &self.binary
    }

    async fn is_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .is_ok()
    }

    async fn run(
        &self,
        workdir: &Path,
        source_file: &str,
        timeout: Duration,
    ) -> Result<EngineOutcome, EngineError> {
        debug!(engine = %self.binary, workdir = %workdir.display(), "Starting engine");

        let mut child = Command::new(&self.binary)
            .args(&self.args)
            .arg(source_file)
            .current_dir(workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| EngineError::Launch {
                engine: self.binary.clone(),
                source,
            })?;

        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(engine = %self.binary, %status, "Engine finished");
                Ok(EngineOutcome::Exited {
                    code: status.code(),
                })
            }
            Ok(Err(source)) => Err(EngineError::Wait {
                engine: self.binary.clone(),
                source,
            }),
            Err(_) => {
                warn!(
                    engine = %self.binary,
                    timeout_secs = timeout.as_secs(),
                    "Engine exceeded time limit, killing"
                );
                if let Err(e) = child.kill().await {
                    warn!(engine = %self.binary, "Failed to kill timed-out engine: {e}");
                }
                Ok(EngineOutcome::TimedOut)
            }
        }
    }
}
