//! Per-request compile workspaces.
//!
//! Each request gets `<temp_root>/resume_<unix-millis>_<uuid>`; nothing is shared
//! between requests. A `Workspace` removes its directory exactly once: explicitly via
//! [`Workspace::reap`], or from `Drop` on any other exit path (error, panic, a
//! cancelled future).

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

pub const SOURCE_FILE: &str = "resume.tex";
pub const PDF_FILE: &str = "resume.pdf";
pub const LOG_FILE: &str = "resume.log";

#[derive(Debug)]
pub struct Workspace {
    path: PathBuf,
    reaped: bool,
}

impl Workspace {
    /// Creates a fresh, uniquely named directory under `temp_root` (which is created
    /// if missing).
    pub async fn create(temp_root: &Path) -> io::Result<Self> {
        let name = format!(
            "resume_{}_{}",
            Utc::now().timestamp_millis(),
            Uuid::new_v4().simple()
        );
        let path = temp_root.join(name);
        fs::create_dir_all(&path).await?;

        debug!(workspace = %path.display(), "Created compile workspace");
        Ok(Self {
            path,
            reaped: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes `contents` to `name` directly under the workspace root. `name` must be a
    /// single plain file name; anything with separators, `..` or a root is refused.
    pub async fn write_file(&self, name: &str, contents: &str) -> io::Result<()> {
        fs::write(self.file_path(name)?, contents).await
    }

    fn file_path(&self, name: &str) -> io::Result<PathBuf> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.path.join(file)),
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("refusing to write outside the workspace: {name:?}"),
            )),
        }
    }

    /// Reads a file from the workspace root, `None` if it does not exist.
    pub async fn read_optional(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.path.join(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Relative paths of every file in the workspace, for failure logging.
    pub fn list_files(&self) -> Vec<String> {
        WalkDir::new(&self.path)
            .min_depth(1)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                entry
                    .path()
                    .strip_prefix(&self.path)
                    .ok()
                    .map(|p| p.display().to_string())
            })
            .collect()
    }

    /// Schedules removal of the directory without waiting for it.
    pub fn reap(mut self) -> JoinHandle<()> {
        self.reaped = true;
        spawn_reap(self.path.clone())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        self.reaped = true;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(remove_workspace(self.path.clone()));
            }
            Err(_) => {
                if let Err(e) = std::fs::remove_dir_all(&self.path) {
                    if e.kind() != io::ErrorKind::NotFound {
                        warn!(workspace = %self.path.display(), "Failed to remove workspace: {e}");
                    }
                }
            }
        }
    }
}

/// Removes `path` recursively on a detached task. Failures are logged, never returned.
pub fn spawn_reap(path: PathBuf) -> JoinHandle<()> {
    tokio::spawn(remove_workspace(path))
}

async fn remove_workspace(path: PathBuf) {
    match fs::remove_dir_all(&path).await {
        Ok(()) => debug!(workspace = %path.display(), "Removed compile workspace"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(workspace = %path.display(), "Failed to remove workspace: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_workspaces_are_unique() {
        let root = TempDir::new().unwrap();
        let a = Workspace::create(root.path()).await.unwrap();
        let b = Workspace::create(root.path()).await.unwrap();

        assert_ne!(a.path(), b.path());
        assert!(a.path().is_dir());
        assert!(b.path().is_dir());
        let name = a.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("resume_"));
    }

    #[tokio::test]
    async fn test_creates_missing_temp_root() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a/b/temp");
        let ws = Workspace::create(&nested).await.unwrap();
        assert!(ws.path().starts_with(&nested));
        assert!(ws.path().is_dir());
    }

    #[tokio::test]
    async fn test_read_optional_missing_file() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create(root.path()).await.unwrap();

        assert_eq!(ws.read_optional(PDF_FILE).await.unwrap(), None);
        ws.write_file(SOURCE_FILE, "hello").await.unwrap();
        assert_eq!(
            ws.read_optional(SOURCE_FILE).await.unwrap(),
            Some(b"hello".to_vec())
        );
        assert_eq!(ws.list_files(), vec![SOURCE_FILE.to_string()]);
    }

    #[tokio::test]
    async fn test_write_file_rejects_paths_outside_root() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create(root.path()).await.unwrap();
        let outside = root.path().join("outside.cls");

        for name in [
            outside.to_str().unwrap(),
            "../outside.cls",
            "sub/x.cls",
            "..",
            "",
        ] {
            let err = ws.write_file(name, "x").await.unwrap_err();
            assert_eq!(err.kind(), io::ErrorKind::InvalidInput, "{name:?}");
        }

        assert!(!outside.exists());
        assert!(ws.list_files().is_empty());
    }

    #[tokio::test]
    async fn test_reap_removes_directory() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create(root.path()).await.unwrap();
        let path = ws.path().to_path_buf();
        ws.write_file(SOURCE_FILE, "x").await.unwrap();

        ws.reap().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_reap_of_missing_directory_is_silent() {
        let root = TempDir::new().unwrap();
        spawn_reap(root.path().join("never-created")).await.unwrap();
    }

    #[test]
    fn test_drop_outside_runtime_removes_synchronously() {
        let root = TempDir::new().unwrap();
        let rt = tokio::runtime::Runtime::new().unwrap();
        let ws = rt.block_on(Workspace::create(root.path())).unwrap();
        let path = ws.path().to_path_buf();
        drop(rt);

        drop(ws);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_drop_inside_runtime_schedules_removal() {
        let root = TempDir::new().unwrap();
        let ws = Workspace::create(root.path()).await.unwrap();
        let path = ws.path().to_path_buf();

        drop(ws);
        for _ in 0..100 {
            if !path.exists() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("workspace {} was not removed", path.display());
    }
}
