use std::io;

use thiserror::Error;

use crate::compile::assets::AssetError;
use crate::compile::diagnose::Diagnosis;
use crate::compile::engine::EngineError;

/// Installation guidance shown when the typesetting engine cannot be launched.
pub const ENGINE_INSTALL_GUIDANCE: &str = "Please install a LaTeX distribution that provides XeLaTeX:\n\n\
Linux: install TeX Live (e.g. `apt install texlive-xetex texlive-fonts-recommended`)\n\
macOS: install MacTeX from https://www.tug.org/mactex/\n\
Windows: install MiKTeX from https://miktex.org/ or TeX Live from https://www.tug.org/texlive/\n\n\
After installation, restart the server. To verify installation, run: xelatex --version";

/// Everything that can go wrong while turning a `CompilationRequest` into a PDF.
///
/// The first three variants are the caller's problem (fix the document and retry);
/// the rest are environment or server faults.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{message}")]
    InvalidDocument { message: String, details: String },

    #[error("{message}")]
    CompilationFailed { message: String, details: String },

    #[error("LaTeX compilation timed out after {seconds}s")]
    Timeout { seconds: u64, details: String },

    #[error("LaTeX engine '{engine}' is not installed or not in the system PATH")]
    EngineUnavailable {
        engine: String,
        #[source]
        source: EngineError,
    },

    #[error("Failed to prepare compilation workspace: {0}")]
    Workspace(#[source] io::Error),

    #[error("Failed to load template assets: {0}")]
    TemplateAssets(#[from] AssetError),

    #[error("Compilation failed")]
    Internal(#[from] anyhow::Error),
}

impl CompileError {
    pub fn invalid(message: impl Into<String>, details: impl Into<String>) -> Self {
        CompileError::InvalidDocument {
            message: message.into(),
            details: details.into(),
        }
    }

    /// True when the caller can fix the problem by editing the document.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            CompileError::InvalidDocument { .. }
                | CompileError::CompilationFailed { .. }
                | CompileError::Timeout { .. }
        )
    }

    /// One-line summary for a UI banner.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Multi-line context for an expandable panel.
    pub fn details(&self) -> String {
        match self {
            CompileError::InvalidDocument { details, .. }
            | CompileError::CompilationFailed { details, .. }
            | CompileError::Timeout { details, .. } => details.clone(),
            CompileError::EngineUnavailable { .. } => ENGINE_INSTALL_GUIDANCE.to_string(),
            CompileError::Workspace(e) => e.to_string(),
            CompileError::TemplateAssets(e) => format!(
                "The template's bundled assets could not be copied. This is a server \
                 configuration problem, not an error in your document.\n{e}"
            ),
            CompileError::Internal(e) => format!("{e:#}"),
        }
    }
}

impl From<Diagnosis> for CompileError {
    fn from(diagnosis: Diagnosis) -> Self {
        CompileError::CompilationFailed {
            message: diagnosis.message,
            details: diagnosis.details,
        }
    }
}
