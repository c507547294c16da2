//! Deployment backends for Shipyard.
//!
//! Provides implementations of the core traits:
//! - GitHub repository provisioning over the REST API
//! - Local git initialization and publishing via the `git` CLI
//! - Filesystem workspace storage

pub mod git;
pub mod github;
pub mod workspace;

pub use git::GitCli;
pub use github::GitHubProvisioner;
pub use workspace::FsWorkspaceStore;
