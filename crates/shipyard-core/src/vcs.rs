//! Local version-control types and the initializer/publisher traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Credential, RemoteRepositoryHandle, Result};

/// Author and committer identity recorded on the initial commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// Version-control state of a project directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalRepositoryState {
    pub root_path: PathBuf,
    pub has_commit: bool,
    pub head_commit_id: Option<String>,
}

impl LocalRepositoryState {
    pub fn uninitialized(root_path: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root_path.into(),
            has_commit: false,
            head_commit_id: None,
        }
    }

    pub fn committed(root_path: impl Into<PathBuf>, head: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            has_commit: true,
            head_commit_id: Some(head.into()),
        }
    }
}

/// Turns a plain directory into a repository with one commit.
#[async_trait]
pub trait RepositoryInitializer: Send + Sync {
    /// Initialize metadata if absent, stage everything and commit.
    ///
    /// Fails with `EmptyWorkspace` when there is nothing to commit. When the
    /// tree is already committed and nothing new is staged, returns the
    /// existing head instead of creating an empty commit.
    async fn initialize(
        &self,
        root: &Path,
        identity: &CommitIdentity,
        message: &str,
    ) -> Result<LocalRepositoryState>;
}

/// Attaches a remote to a local repository and pushes to it.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Configure the remote. Fails with `RemoteAlreadyBound` when a remote of
    /// the same name exists.
    async fn bind(&self, local: &LocalRepositoryState, remote: &RemoteRepositoryHandle)
    -> Result<()>;

    /// Point an existing remote at `remote`.
    async fn rebind(
        &self,
        local: &LocalRepositoryState,
        remote: &RemoteRepositoryHandle,
    ) -> Result<()>;

    /// Push the local head to `branch` on the bound remote.
    async fn push(
        &self,
        local: &LocalRepositoryState,
        remote: &RemoteRepositoryHandle,
        branch: &str,
        credential: &Credential,
    ) -> Result<()>;
}
