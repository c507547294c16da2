//! Remote repository types and the provisioner trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Credential, Result};

/// Visibility of a newly created remote repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

impl Visibility {
    pub fn is_private(&self) -> bool {
        matches!(self, Visibility::Private)
    }
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            other => Err(format!("unknown visibility: {}", other)),
        }
    }
}

/// A remote repository created by a provisioner. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepositoryHandle {
    pub owner: String,
    pub name: String,
    pub clone_url: String,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
}

/// Trait for remote repository hosting backends.
#[async_trait]
pub trait RepositoryProvisioner: Send + Sync {
    /// Name of this provisioner.
    fn name(&self) -> &'static str;

    /// Create a new, empty repository.
    ///
    /// Not idempotent: a second call for the same owner and name fails with
    /// `Conflict`.
    async fn create_repository(
        &self,
        owner: &str,
        name: &str,
        visibility: Visibility,
        credential: &Credential,
    ) -> Result<RemoteRepositoryHandle>;
}
