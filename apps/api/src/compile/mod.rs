// LaTeX → PDF compilation pipeline.
// Flow: validate → workspace → template assets → class file + source → engine →
//       PDF or log diagnosis → reap workspace.
// The engine and the asset store sit behind traits so the pipeline runs without TeX installed.

pub mod assets;
pub mod diagnose;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod request;
pub mod rewrite;
pub mod workspace;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Config;

pub use assets::{AssetCopy, LocalTemplateStore, TemplateAssetStore};
pub use engine::{EngineOutcome, LatexEngine, TypesetEngine};
pub use error::CompileError;
pub use request::CompilationRequest;

use diagnose::{diagnose_log, diagnose_without_log};
use request::validate_structure;
use rewrite::prepare_document;
use workspace::{Workspace, LOG_FILE, PDF_FILE, SOURCE_FILE};

/// A successfully typeset document.
#[derive(Debug, Clone)]
pub struct CompiledPdf {
    pub bytes: Vec<u8>,
}

/// Stateless apart from its collaborators; safe to share across concurrent requests.
pub struct LatexCompiler {
    engine: Arc<dyn TypesetEngine>,
    assets: Arc<dyn TemplateAssetStore>,
    temp_root: PathBuf,
    timeout: Duration,
}

impl LatexCompiler {
    pub fn new(
        engine: Arc<dyn TypesetEngine>,
        assets: Arc<dyn TemplateAssetStore>,
        temp_root: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            engine,
            assets,
            temp_root: temp_root.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            Arc::new(LatexEngine::new(config.latex_engine.clone())),
            Arc::new(LocalTemplateStore::new(config.templates_dir.clone())),
            config.temp_dir.clone(),
            config.compile_timeout,
        )
    }

    pub fn engine(&self) -> &dyn TypesetEngine {
        self.engine.as_ref()
    }

    /// Compiles one document. The structural check runs before anything touches the
    /// filesystem; once a workspace exists it is reaped whatever the outcome.
    pub async fn compile(&self, request: &CompilationRequest) -> Result<CompiledPdf, CompileError> {
        validate_structure(&request.source)?;

        let workspace = Workspace::create(&self.temp_root)
            .await
            .map_err(CompileError::Workspace)?;

        let result = self.compile_in(&workspace, request).await;
        let _ = workspace.reap();

        match &result {
            Ok(pdf) => info!(bytes = pdf.bytes.len(), "Compiled resume PDF"),
            Err(e) if e.is_document_error() => info!("Compilation rejected: {e}"),
            Err(e) => warn!("Compilation failed: {e}"),
        }
        result
    }

    async fn compile_in(
        &self,
        workspace: &Workspace,
        request: &CompilationRequest,
    ) -> Result<CompiledPdf, CompileError> {
        // Template assets first so request files win on name collisions.
        if let Some(template) = request.template_identifier() {
            match self.assets.copy_template_assets(template, workspace.path()).await? {
                AssetCopy::Copied { files } => {
                    debug!(template, files, "Copied template assets")
                }
                AssetCopy::NotFound => debug!(template, "Template has no asset directory"),
            }
        }

        let document = prepare_document(request);
        if let Some(class_file) = &document.class_file {
            workspace
                .write_file(&class_file.file_name(), class_file.contents)
                .await
                .map_err(CompileError::Workspace)?;
        }
        workspace
            .write_file(SOURCE_FILE, &document.source)
            .await
            .map_err(CompileError::Workspace)?;

        let outcome = self
            .engine
            .run(workspace.path(), SOURCE_FILE, self.timeout)
            .await
            .map_err(|e| {
                if e.is_unavailable() {
                    CompileError::EngineUnavailable {
                        engine: self.engine.name().to_string(),
                        source: e,
                    }
                } else {
                    CompileError::Internal(e.into())
                }
            })?;

        // The PDF, not the exit code, decides success: engines exit non-zero on
        // recoverable errors and still write usable output.
        if outcome != EngineOutcome::TimedOut {
            if let Some(bytes) = workspace
                .read_optional(PDF_FILE)
                .await
                .map_err(CompileError::Workspace)?
            {
                return Ok(CompiledPdf { bytes });
            }
        }

        debug!(files = ?workspace.list_files(), "Compile failed, workspace contents");

        let diagnosis = match workspace
            .read_optional(LOG_FILE)
            .await
            .map_err(CompileError::Workspace)?
        {
            Some(log) => diagnose_log(&String::from_utf8_lossy(&log)),
            None => diagnose_without_log(self.engine.name(), outcome),
        };

        match outcome {
            EngineOutcome::TimedOut => Err(CompileError::Timeout {
                seconds: self.timeout.as_secs(),
                details: format!(
                    "The document took longer than {}s to compile. Check for runaway loops or \
                     very large images.\n{}",
                    self.timeout.as_secs(),
                    diagnosis.details
                ),
            }),
            EngineOutcome::Exited { .. } => Err(diagnosis.into()),
        }
    }
}
