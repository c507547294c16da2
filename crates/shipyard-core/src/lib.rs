//! Core domain types and traits for Shipyard.
//!
//! This crate contains:
//! - Deployment request, state machine and outcome types
//! - The failure taxonomy shared by every deployment step
//! - Traits for the workspace store, repository provisioner, initializer and publisher
//! - Credential and identifier wrappers

pub mod credential;
pub mod deployment;
pub mod error;
pub mod id;
pub mod repository;
pub mod vcs;
pub mod workspace;

pub use credential::Credential;
pub use deployment::{DeploymentOutcome, DeploymentRequest, DeploymentState, Stage};
pub use error::{Error, ErrorKind, Result, ValidationError};
pub use id::DeploymentId;
pub use repository::{RemoteRepositoryHandle, RepositoryProvisioner, Visibility};
pub use vcs::{CommitIdentity, LocalRepositoryState, Publisher, RepositoryInitializer};
pub use workspace::{Workspace, WorkspaceSnapshot, WorkspaceStore};
