//! Compilation request and the structural checks run before any filesystem work.

use serde::Deserialize;

use crate::compile::error::CompileError;

pub const DOCUMENT_CLASS: &str = r"\documentclass";
pub const BEGIN_DOCUMENT: &str = r"\begin{document}";
pub const END_DOCUMENT: &str = r"\end{document}";

/// Input to a single compilation.
///
/// Field names follow what the editor client sends (`texContent`, `clsContent`,
/// `templateName`); the descriptive names are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompilationRequest {
    #[serde(rename = "texContent", alias = "source", default)]
    pub source: String,
    #[serde(rename = "clsContent", alias = "classOverride", default)]
    pub class_override: Option<String>,
    #[serde(rename = "templateName", alias = "templateIdentifier", default)]
    pub template_identifier: Option<String>,
}

#[cfg(test)]
impl CompilationRequest {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_class_override(mut self, class_source: impl Into<String>) -> Self {
        self.class_override = Some(class_source.into());
        self
    }

    pub fn with_template(mut self, template_identifier: impl Into<String>) -> Self {
        self.template_identifier = Some(template_identifier.into());
        self
    }
}

impl CompilationRequest {
    /// The class override, treating an empty string as absent.
    pub fn class_override(&self) -> Option<&str> {
        self.class_override.as_deref().filter(|s| !s.is_empty())
    }

    /// The template identifier, treating an empty string as absent.
    pub fn template_identifier(&self) -> Option<&str> {
        self.template_identifier.as_deref().filter(|s| !s.is_empty())
    }
}

/// Checks the document skeleton. Reports only the first violation, in the order
/// empty → `\begin{document}` → `\end{document}` → `\documentclass`.
pub fn validate_structure(source: &str) -> Result<(), CompileError> {
    if source.trim().is_empty() {
        return Err(CompileError::invalid(
            "Empty LaTeX content",
            "Please provide LaTeX content to compile.",
        ));
    }

    if !source.contains(BEGIN_DOCUMENT) {
        return Err(CompileError::invalid(
            r"Missing \begin{document}",
            "Your LaTeX document must include \\begin{document} and \\end{document} tags.\n\n\
             Make sure your document has:\n\
             - \\documentclass{...}\n\
             - \\begin{document}\n\
             - Your content\n\
             - \\end{document}",
        ));
    }

    if !source.contains(END_DOCUMENT) {
        return Err(CompileError::invalid(
            r"Missing \end{document}",
            "Your LaTeX document must include \\end{document} at the end.",
        ));
    }

    if !source.contains(DOCUMENT_CLASS) {
        return Err(CompileError::invalid(
            r"Missing \documentclass",
            "Your LaTeX document must start with \\documentclass{...} declaration.",
        ));
    }

    Ok(())
}
