//! Application state.

use shipyard_config::ShipyardConfig;
use shipyard_core::Result;
use shipyard_deployer::{FsWorkspaceStore, GitCli, GitHubProvisioner};
use shipyard_orchestrator::{DeploymentOrchestrator, DeploymentSettings, RetryPolicy};
use std::path::PathBuf;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<DeploymentOrchestrator>,
    pub git: GitCli,
    pub output_dir: PathBuf,
    pub max_body_bytes: usize,
}

impl AppState {
    /// Wire the GitHub, git and filesystem backends from configuration.
    pub fn from_config(config: &ShipyardConfig) -> Result<Self> {
        let provisioner = GitHubProvisioner::new(
            config.github.api_url.clone(),
            &config.github.user_agent,
            config.github.timeout,
        )?;
        let store = FsWorkspaceStore::new(config.workspace.output_dir.clone());
        let git = GitCli::new(
            config.git.binary.clone(),
            config.git.remote.clone(),
            config.git.branch.clone(),
            config.git.timeout,
        );

        let orchestrator = DeploymentOrchestrator::new(
            Arc::new(provisioner),
            Arc::new(store),
            Arc::new(git.clone()),
            Arc::new(git.clone()),
            DeploymentSettings::from_config(config),
        )
        .with_retry(RetryPolicy::from(&config.retry));

        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            git,
            output_dir: config.workspace.output_dir.clone(),
            max_body_bytes: config.server.max_body_bytes,
        })
    }
}
