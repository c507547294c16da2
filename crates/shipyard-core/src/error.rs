//! Error types for Shipyard.
//!
//! Every deployment step classifies its own failures into [`Error`] before
//! returning; callers only ever see one of the [`ErrorKind`] variants.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication failed: {0}")]
    AuthFailure(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("remote unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("empty workspace: {0}")]
    EmptyWorkspace(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),

    #[error("version control error: {0}")]
    VcsTool(String),

    #[error("remote already bound: {0}")]
    RemoteAlreadyBound(String),

    #[error("non-fast-forward: {0}")]
    NonFastForward(String),
}

impl Error {
    /// Build an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::NotFound => Error::NotFound(message),
            ErrorKind::AuthFailure => Error::AuthFailure(message),
            ErrorKind::Conflict => Error::Conflict(message),
            ErrorKind::RemoteUnavailable => Error::RemoteUnavailable(message),
            ErrorKind::EmptyWorkspace => Error::EmptyWorkspace(message),
            ErrorKind::FilesystemError => Error::Filesystem(message),
            ErrorKind::VcsToolError => Error::VcsTool(message),
            ErrorKind::RemoteAlreadyBound => Error::RemoteAlreadyBound(message),
            ErrorKind::NonFastForward => Error::NonFastForward(message),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::AuthFailure(_) => ErrorKind::AuthFailure,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::RemoteUnavailable(_) => ErrorKind::RemoteUnavailable,
            Error::EmptyWorkspace(_) => ErrorKind::EmptyWorkspace,
            Error::Filesystem(_) => ErrorKind::FilesystemError,
            Error::VcsTool(_) => ErrorKind::VcsToolError,
            Error::RemoteAlreadyBound(_) => ErrorKind::RemoteAlreadyBound,
            Error::NonFastForward(_) => ErrorKind::NonFastForward,
        }
    }

    /// The human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::NotFound(m)
            | Error::AuthFailure(m)
            | Error::Conflict(m)
            | Error::RemoteUnavailable(m)
            | Error::EmptyWorkspace(m)
            | Error::Filesystem(m)
            | Error::VcsTool(m)
            | Error::RemoteAlreadyBound(m)
            | Error::NonFastForward(m) => m,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Filesystem(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// The fixed failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NotFound,
    AuthFailure,
    Conflict,
    RemoteUnavailable,
    EmptyWorkspace,
    FilesystemError,
    VcsToolError,
    RemoteAlreadyBound,
    NonFastForward,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NotFound",
            ErrorKind::AuthFailure => "AuthFailure",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::RemoteUnavailable => "RemoteUnavailable",
            ErrorKind::EmptyWorkspace => "EmptyWorkspace",
            ErrorKind::FilesystemError => "FilesystemError",
            ErrorKind::VcsToolError => "VcsToolError",
            ErrorKind::RemoteAlreadyBound => "RemoteAlreadyBound",
            ErrorKind::NonFastForward => "NonFastForward",
        }
    }

    /// Only transient remote conditions can succeed on an unchanged retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RemoteUnavailable)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejections raised before any deployment step runs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid project name '{name}': {reason}")]
    ProjectName { name: String, reason: &'static str },

    #[error("invalid owner account '{owner}': {reason}")]
    OwnerAccount { owner: String, reason: &'static str },

    #[error("invalid workspace path '{path}': {reason}")]
    Path { path: String, reason: &'static str },
}
