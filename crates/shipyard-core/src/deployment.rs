//! Deployment request, state machine and outcome types.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::{Credential, Error, ErrorKind, ValidationError, Visibility, Workspace};

// Repository names on the hosting platform.
static PROJECT_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]{1,100}$").unwrap());

// Account names: alphanumerics and single hyphens, no leading/trailing hyphen.
static OWNER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,37}[A-Za-z0-9])?$").unwrap());

/// A request to publish a workspace as a new remote repository.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    pub project_name: String,
    pub owner_account: String,
    pub credential: Credential,
    #[serde(rename = "files", default)]
    pub workspace: Workspace,
    /// Falls back to the configured default when absent.
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

impl DeploymentRequest {
    /// Reject requests that could never be published, before any step runs.
    ///
    /// An empty workspace is not rejected here; it fails at the
    /// Initializing stage with `EmptyWorkspace`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_project_name(&self.project_name)?;
        validate_owner_account(&self.owner_account)?;
        self.workspace.validate()
    }
}

pub fn validate_project_name(name: &str) -> Result<(), ValidationError> {
    let reject = |reason| {
        Err(ValidationError::ProjectName {
            name: name.to_string(),
            reason,
        })
    };

    if !PROJECT_NAME_REGEX.is_match(name) {
        return reject("must be 1-100 characters of letters, digits, '.', '-' or '_'");
    }
    if name == "." || name == ".." {
        return reject("reserved name");
    }
    if name.to_ascii_lowercase().ends_with(".git") {
        return reject("must not end with '.git'");
    }
    Ok(())
}

pub fn validate_owner_account(owner: &str) -> Result<(), ValidationError> {
    if OWNER_REGEX.is_match(owner) && !owner.contains("--") {
        Ok(())
    } else {
        Err(ValidationError::OwnerAccount {
            owner: owner.to_string(),
            reason: "must be 1-39 letters, digits or single hyphens, not starting or ending with '-'",
        })
    }
}

/// The step at which a deployment failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Provisioning,
    Initializing,
    Publishing,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Provisioning => "Provisioning",
            Stage::Initializing => "Initializing",
            Stage::Publishing => "Publishing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of one deployment attempt.
///
/// `Idle -> Provisioning -> Initializing -> Publishing -> Succeeded`, with
/// `Failed(stage)` reachable from every running state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeploymentState {
    Idle,
    Provisioning,
    Initializing,
    Publishing,
    Succeeded,
    Failed(Stage),
}

impl DeploymentState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeploymentState::Succeeded | DeploymentState::Failed(_))
    }

    /// The stage this state runs, if it is a running state.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            DeploymentState::Provisioning => Some(Stage::Provisioning),
            DeploymentState::Initializing => Some(Stage::Initializing),
            DeploymentState::Publishing => Some(Stage::Publishing),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: DeploymentState) -> bool {
        use DeploymentState::*;
        match (*self, next) {
            (Idle, Provisioning) => true,
            (Provisioning, Initializing) => true,
            (Initializing, Publishing) => true,
            (Publishing, Succeeded) => true,
            (current, Failed(stage)) => current.stage() == Some(stage),
            _ => false,
        }
    }
}

/// The single terminal result of a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentOutcome {
    Success {
        repo_url: String,
    },
    Failure {
        stage: Stage,
        error_kind: ErrorKind,
        message: String,
    },
}

impl DeploymentOutcome {
    pub fn failure(stage: Stage, err: &Error) -> Self {
        DeploymentOutcome::Failure {
            stage,
            error_kind: err.kind(),
            message: err.message().to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DeploymentOutcome::Success { .. })
    }
}
