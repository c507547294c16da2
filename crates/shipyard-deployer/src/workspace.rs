//! Filesystem workspace store.
//!
//! Each project lives in `<output_dir>/<owner>/<project>`. The store writes request
//! workspaces there and reads them back as ordered snapshots.

use async_trait::async_trait;
use shipyard_core::deployment::{validate_owner_account, validate_project_name};
use shipyard_core::workspace::validate_path;
use shipyard_core::{Error, Result, Workspace, WorkspaceSnapshot, WorkspaceStore};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const VCS_DIR: &str = ".git";

/// Stores project workspaces under a single output directory.
#[derive(Debug, Clone)]
pub struct FsWorkspaceStore {
    output_dir: PathBuf,
}

impl FsWorkspaceStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Directory holding `owner/project`.
    pub fn project_dir(&self, owner: &str, project: &str) -> Result<PathBuf> {
        validate_owner_account(owner).map_err(|e| Error::Filesystem(e.to_string()))?;
        validate_project_name(project).map_err(|e| Error::Filesystem(e.to_string()))?;
        Ok(self.output_dir.join(owner).join(project))
    }

    /// Read every regular file under `root` into a workspace, skipping
    /// version-control metadata.
    pub async fn read_tree(root: &Path) -> Result<Workspace> {
        let mut workspace = Workspace::new();
        Self::scan_directory(root, root, &mut workspace).await?;
        Ok(workspace)
    }

    /// Recursively scan a directory.
    #[async_recursion::async_recursion]
    async fn scan_directory(
        base_path: &Path,
        current_path: &Path,
        workspace: &mut Workspace,
    ) -> Result<()> {
        let mut entries = tokio::fs::read_dir(current_path).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_name = entry.file_name();
            let file_type = entry.file_type().await?;

            if file_name.eq_ignore_ascii_case(VCS_DIR) {
                continue;
            }

            if file_type.is_dir() {
                Self::scan_directory(base_path, &path, workspace).await?;
            } else if file_type.is_file() {
                let relative = relative_key(base_path, &path)?;
                let content = tokio::fs::read(&path).await?;
                workspace.insert(relative, content);
            } else {
                warn!(path = %path.display(), "Skipping non-regular file");
            }
        }

        Ok(())
    }

    /// Remove everything in `root` except version-control metadata.
    async fn clear(root: &Path) -> Result<()> {
        let mut entries = tokio::fs::read_dir(root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_name().eq_ignore_ascii_case(VCS_DIR) {
                continue;
            }
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(&path).await?;
            } else {
                tokio::fs::remove_file(&path).await?;
            }
            debug!(path = %path.display(), "Removed stale entry");
        }
        Ok(())
    }
}

/// `/`-joined path of `path` relative to `base`.
fn relative_key(base: &Path, path: &Path) -> Result<String> {
    let relative = path
        .strip_prefix(base)
        .map_err(|_| Error::Filesystem(format!("{} escapes workspace", path.display())))?;

    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

#[async_trait]
impl WorkspaceStore for FsWorkspaceStore {
    async fn materialize(
        &self,
        owner: &str,
        project: &str,
        workspace: &Workspace,
    ) -> Result<PathBuf> {
        let root = self.project_dir(owner, project)?;
        tokio::fs::create_dir_all(&root).await?;
        Self::clear(&root).await?;

        for (path, content) in workspace.iter() {
            validate_path(path).map_err(|e| Error::Filesystem(e.to_string()))?;
            let target = root.join(path);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&target, content).await?;
        }

        info!(owner, project, files = workspace.len(), path = %root.display(), "Workspace materialized");
        Ok(root)
    }

    async fn read(&self, owner: &str, project: &str) -> Result<WorkspaceSnapshot> {
        let root = self.project_dir(owner, project)?;

        match tokio::fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(Error::NotFound(format!(
                    "{} is not a directory",
                    root.display()
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "no workspace for project '{}'",
                    project
                )));
            }
            Err(e) => return Err(e.into()),
        }

        let files = Self::read_tree(&root).await?;
        debug!(owner, project, files = files.len(), "Workspace read");
        Ok(WorkspaceSnapshot { root, files })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipyard_core::ErrorKind;

    fn demo() -> Workspace {
        [
            ("README.md", "# Demo"),
            ("src/App.tsx", "export default function App() {}"),
            ("src/screens/Home.tsx", "export {}"),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_materialize_then_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path());

        let root = store.materialize("acme", "demo-app", &demo()).await.unwrap();
        assert_eq!(root, dir.path().join("acme/demo-app"));

        let snapshot = store.read("acme", "demo-app").await.unwrap();
        assert_eq!(snapshot.root, root);
        assert_eq!(snapshot.files, demo());
    }

    #[tokio::test]
    async fn test_read_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path());
        store.materialize("acme", "demo-app", &demo()).await.unwrap();

        let first = store.read("acme", "demo-app").await.unwrap();
        let second = store.read("acme", "demo-app").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_read_missing_project_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path());
        let err = store.read("acme", "nope").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_materialize_removes_stale_files_but_keeps_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path());
        let root = dir.path().join("acme/demo-app");
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref: refs/heads/main").unwrap();
        std::fs::create_dir_all(root.join("old")).unwrap();
        std::fs::write(root.join("old/stale.txt"), "stale").unwrap();

        store.materialize("acme", "demo-app", &demo()).await.unwrap();

        assert!(!root.join("old").exists());
        assert!(root.join(".git/HEAD").exists());
        let snapshot = store.read("acme", "demo-app").await.unwrap();
        assert_eq!(snapshot.files, demo());
    }

    #[tokio::test]
    async fn test_empty_workspace_materializes_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path());
        let root = store.materialize("acme", "empty", &Workspace::new()).await.unwrap();
        assert!(root.is_dir());
        assert!(store.read("acme", "empty").await.unwrap().files.is_empty());
    }

    #[tokio::test]
    async fn test_materialize_rejects_escaping_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path().join("out"));
        let ws: Workspace = [("../escape.txt", "x")].into_iter().collect();
        let err = store.materialize("acme", "demo-app", &ws).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FilesystemError);
        assert!(!dir.path().join("out/escape.txt").exists());
    }

    #[tokio::test]
    async fn test_rejects_project_name_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path());
        assert!(store.read("acme", "..").await.is_err());
        assert!(store.read("..", "demo-app").await.is_err());
        assert!(store.materialize("acme", "a/b", &demo()).await.is_err());
    }

    #[tokio::test]
    async fn test_same_project_under_different_owners_is_separate() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path());
        let other: Workspace = [("OTHER.md", "other")].into_iter().collect();

        let first = store.materialize("acme", "demo-app", &demo()).await.unwrap();
        let second = store.materialize("globex", "demo-app", &other).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.read("acme", "demo-app").await.unwrap().files, demo());
        assert_eq!(store.read("globex", "demo-app").await.unwrap().files, other);
    }

    #[tokio::test]
    async fn test_vcs_dir_match_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsWorkspaceStore::new(dir.path());
        let root = dir.path().join("acme/demo-app");
        std::fs::create_dir_all(root.join(".GIT")).unwrap();
        std::fs::write(root.join(".GIT/HEAD"), "ref: refs/heads/main").unwrap();

        store.materialize("acme", "demo-app", &demo()).await.unwrap();
        let snapshot = store.read("acme", "demo-app").await.unwrap();
        assert_eq!(snapshot.files, demo());
    }
}
