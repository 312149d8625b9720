//! Template asset store: one directory of fonts, images and class/style files per
//! template, copied into a workspace before the request's own files are written.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

use crate::compile::rewrite::sanitize_identifier;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read template directory {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("asset copy task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCopy {
    Copied { files: usize },
    /// No asset directory exists for this template. Not an error: the document may
    /// be self-contained.
    NotFound,
}

#[async_trait]
pub trait TemplateAssetStore: Send + Sync {
    /// Recursively copies the template's assets into `destination`.
    async fn copy_template_assets(
        &self,
        template_identifier: &str,
        destination: &Path,
    ) -> Result<AssetCopy, AssetError>;
}

/// Asset store backed by a local directory, `<root>/<SanitizedName>/...`.
#[derive(Debug, Clone)]
pub struct LocalTemplateStore {
    root: PathBuf,
}

impl LocalTemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory for a template, keyed by the sanitized identifier. `None` when the
    /// identifier has no usable characters.
    pub fn template_dir(&self, template_identifier: &str) -> Option<PathBuf> {
        let safe_name = sanitize_identifier(template_identifier);
        (!safe_name.is_empty()).then(|| self.root.join(safe_name))
    }
}

#[async_trait]
impl TemplateAssetStore for LocalTemplateStore {
    async fn copy_template_assets(
        &self,
        template_identifier: &str,
        destination: &Path,
    ) -> Result<AssetCopy, AssetError> {
        let Some(source) = self.template_dir(template_identifier) else {
            return Ok(AssetCopy::NotFound);
        };
        let destination = destination.to_path_buf();

        // Directory walking and file copies are blocking; keep them off the runtime.
        tokio::task::spawn_blocking(move || -> Result<AssetCopy, AssetError> {
            if !source.is_dir() {
                debug!(template = %source.display(), "No asset directory for template");
                return Ok(AssetCopy::NotFound);
            }
            let files = copy_tree(&source, &destination)?;
            Ok(AssetCopy::Copied { files })
        })
        .await?
    }
}

/// Copies the contents of `source` (not the directory itself) into `destination`.
/// Existing files in `destination` are overwritten. Returns the number of files copied.
fn copy_tree(source: &Path, destination: &Path) -> Result<usize, AssetError> {
    let mut files = 0;

    for entry in WalkDir::new(source).min_depth(1).follow_links(true) {
        let entry = entry.map_err(|e| AssetError::Walk {
            path: source.to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| AssetError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source: e,
            })?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| AssetError::Copy {
                    from: entry.path().to_path_buf(),
                    to: parent.to_path_buf(),
                    source: e,
                })?;
            }
            fs::copy(entry.path(), &target).map_err(|e| AssetError::Copy {
                from: entry.path().to_path_buf(),
                to: target.clone(),
                source: e,
            })?;
            files += 1;
        }
    }

    Ok(files)
}
