//! Workspace contents and the store that materializes them on disk.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::{Result, ValidationError};

/// The files that make up one generated project, keyed by relative path.
///
/// Paths are kept in sorted order so two workspaces with the same contents
/// compare equal regardless of how they were built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct Workspace {
    files: BTreeMap<String, Vec<u8>>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), content.into());
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files.get(path).map(|c| c.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> {
        self.files.iter().map(|(p, c)| (p.as_str(), c.as_slice()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(|p| p.as_str())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check every path before anything touches the filesystem.
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        self.files.keys().try_for_each(|p| validate_path(p))
    }
}

impl From<BTreeMap<String, String>> for Workspace {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self {
            files: map.into_iter().map(|(p, c)| (p, c.into_bytes())).collect(),
        }
    }
}

impl<P: Into<String>, C: Into<Vec<u8>>> FromIterator<(P, C)> for Workspace {
    fn from_iter<I: IntoIterator<Item = (P, C)>>(iter: I) -> Self {
        Self {
            files: iter
                .into_iter()
                .map(|(p, c)| (p.into(), c.into()))
                .collect(),
        }
    }
}

/// Validate a single workspace path.
///
/// Paths must be relative, `/`-separated, free of `.`/`..` and empty
/// components, and must not reach into version-control metadata.
pub fn validate_path(path: &str) -> std::result::Result<(), ValidationError> {
    let reject = |reason| {
        Err(ValidationError::Path {
            path: path.to_string(),
            reason,
        })
    };

    if path.is_empty() {
        return reject("path is empty");
    }
    if path.starts_with('/') || path.contains('\\') || path.contains(':') {
        return reject("path must be relative and use '/' separators");
    }
    if path.contains('\0') {
        return reject("path contains a NUL byte");
    }
    for component in path.split('/') {
        match component {
            "" => return reject("path contains an empty component"),
            "." | ".." => return reject("path contains a relative component"),
            c if c.eq_ignore_ascii_case(".git") => {
                return reject("path enters version-control metadata");
            }
            _ => {}
        }
    }
    Ok(())
}

/// A materialized workspace as read back from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceSnapshot {
    pub root: PathBuf,
    pub files: Workspace,
}

/// Trait for workspace storage backends.
#[async_trait]
pub trait WorkspaceStore: Send + Sync {
    /// Write `workspace` as the complete contents of `owner/project`'s
    /// directory and return its root.
    async fn materialize(&self, owner: &str, project: &str, workspace: &Workspace)
    -> Result<PathBuf>;

    /// Read the project's materialized tree. Fails with `NotFound` when the
    /// project has no directory.
    async fn read(&self, owner: &str, project: &str) -> Result<WorkspaceSnapshot>;
}
