//! Deploy command.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use serde_json::json;
use shipyard_config::ShipyardConfig;
use shipyard_core::{Credential, DeploymentOutcome, DeploymentRequest, Visibility, Workspace};
use shipyard_deployer::{FsWorkspaceStore, GitCli, GitHubProvisioner};
use shipyard_orchestrator::{
    DeploymentEvent, DeploymentOrchestrator, DeploymentSettings, RetryPolicy,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

pub struct DeployArgs {
    pub dir: PathBuf,
    pub project: String,
    pub owner: String,
    pub token: String,
    pub public: bool,
}

impl DeployArgs {
    fn visibility(&self) -> Option<Visibility> {
        self.public.then_some(Visibility::Public)
    }
}

async fn read_workspace(dir: &Path) -> Result<Workspace> {
    let workspace = FsWorkspaceStore::read_tree(dir)
        .await
        .with_context(|| format!("Failed to read project directory: {}", dir.display()))?;
    println!("Read {} files from {}", workspace.len(), dir.display());
    Ok(workspace)
}

async fn build_request(args: &DeployArgs) -> Result<DeploymentRequest> {
    let request = DeploymentRequest {
        project_name: args.project.clone(),
        owner_account: args.owner.clone(),
        credential: Credential::new(args.token.clone()),
        workspace: read_workspace(&args.dir).await?,
        visibility: args.visibility(),
    };
    request.validate()?;
    Ok(request)
}

fn orchestrator(config: &ShipyardConfig) -> Result<DeploymentOrchestrator> {
    let provisioner = GitHubProvisioner::new(
        config.github.api_url.clone(),
        &config.github.user_agent,
        config.github.timeout,
    )?;
    let git = Arc::new(GitCli::new(
        config.git.binary.clone(),
        config.git.remote.clone(),
        config.git.branch.clone(),
        config.git.timeout,
    ));

    Ok(DeploymentOrchestrator::new(
        Arc::new(provisioner),
        Arc::new(FsWorkspaceStore::new(config.workspace.output_dir.clone())),
        git.clone(),
        git,
        DeploymentSettings::from_config(config),
    )
    .with_retry(RetryPolicy::from(&config.retry)))
}

/// Run the deployment in this process, printing stage progress.
pub async fn local(config_path: Option<&Path>, args: DeployArgs) -> Result<()> {
    let config = ShipyardConfig::load(config_path).context("Failed to load configuration")?;
    let request = build_request(&args).await?;
    let orchestrator = Arc::new(orchestrator(&config)?);

    println!("Deploying {}/{}\n", request.owner_account, request.project_name);

    let (tx, mut rx) = mpsc::channel(32);
    let handle = tokio::spawn({
        let orchestrator = orchestrator.clone();
        async move { orchestrator.deploy_with_events(request, tx).await }
    });

    while let Some(event) = rx.recv().await {
        print_event(&event);
    }

    let outcome = handle.await.context("Deployment task failed")?;
    report(outcome)
}

fn print_event(event: &DeploymentEvent) {
    match event {
        DeploymentEvent::StageStarted { stage } => {
            println!("▶ {}", stage);
        }
        DeploymentEvent::StageRetrying {
            stage,
            attempt,
            delay,
            message,
        } => {
            println!(
                "  ↻ {} attempt {} failed ({}), retrying in {:?}",
                stage, attempt, message, delay
            );
        }
        DeploymentEvent::StageCompleted { stage, success } => {
            if *success {
                println!("✓ {} completed\n", stage);
            } else {
                println!("✗ {} failed\n", stage);
            }
        }
        DeploymentEvent::DeploymentCompleted { .. } => {}
    }
}

fn report(outcome: DeploymentOutcome) -> Result<()> {
    match outcome {
        DeploymentOutcome::Success { repo_url } => {
            println!("✓ Published to {}", repo_url);
            Ok(())
        }
        DeploymentOutcome::Failure {
            stage,
            error_kind,
            message,
        } => bail!("Deployment failed at {} ({}): {}", stage, error_kind, message),
    }
}

/// Wire form of a server response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployResponse {
    success: bool,
    repo_url: Option<String>,
    stage: Option<String>,
    error_kind: Option<String>,
    message: Option<String>,
    error: Option<String>,
}

fn wire_files(workspace: &Workspace) -> Result<BTreeMap<&str, &str>> {
    workspace
        .iter()
        .map(|(path, content)| {
            let text = std::str::from_utf8(content)
                .with_context(|| format!("{} is not valid UTF-8", path))?;
            Ok((path, text))
        })
        .collect()
}

/// Post the deployment to a running server.
pub async fn remote(api_url: &str, args: DeployArgs) -> Result<()> {
    let request = build_request(&args).await?;
    let body = json!({
        "projectName": request.project_name,
        "ownerAccount": request.owner_account,
        "credential": request.credential.expose(),
        "files": wire_files(&request.workspace)?,
        "visibility": request.visibility,
    });

    let url = format!("{}/deploy", api_url.trim_end_matches('/'));
    println!("Deploying {}/{} via {}", request.owner_account, request.project_name, url);

    let response = reqwest::Client::new()
        .post(&url)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach {}", url))?;

    let status = response.status();
    let response: DeployResponse = response
        .json()
        .await
        .with_context(|| format!("Unexpected response from server ({})", status))?;

    if response.success {
        println!("✓ Published to {}", response.repo_url.unwrap_or_default());
        return Ok(());
    }

    match (response.stage, response.error_kind, response.message) {
        (Some(stage), Some(kind), Some(message)) => {
            bail!("Deployment failed at {} ({}): {}", stage, kind, message)
        }
        _ => bail!(
            "Request rejected ({}): {}",
            status,
            response.error.unwrap_or_default()
        ),
    }
}
