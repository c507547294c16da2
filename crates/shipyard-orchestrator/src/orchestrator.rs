//! Deployment orchestrator - publishes a workspace as a new remote repository.

use shipyard_config::{ShipyardConfig, TemplateContext};
use shipyard_core::{
    CommitIdentity, DeploymentId, DeploymentOutcome, DeploymentRequest, DeploymentState, Error,
    ErrorKind, LocalRepositoryState, Publisher, RemoteRepositoryHandle, RepositoryInitializer,
    RepositoryProvisioner, Result, Stage, Visibility, WorkspaceStore,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

use crate::RetryPolicy;

/// Event emitted during a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentEvent {
    StageStarted {
        stage: Stage,
    },
    StageRetrying {
        stage: Stage,
        attempt: u32,
        delay: Duration,
        message: String,
    },
    StageCompleted {
        stage: Stage,
        success: bool,
    },
    DeploymentCompleted {
        success: bool,
    },
}

/// Fixed inputs shared by every deployment.
#[derive(Debug, Clone)]
pub struct DeploymentSettings {
    pub branch: String,
    pub identity: CommitIdentity,
    /// Template rendered with `${project.name}`/`${project.owner}`.
    pub commit_message: String,
    pub default_visibility: Visibility,
}

impl DeploymentSettings {
    pub fn from_config(config: &ShipyardConfig) -> Self {
        Self {
            branch: config.git.branch.clone(),
            identity: config.git.identity(),
            commit_message: config.git.commit_message.clone(),
            default_visibility: config.deploy.visibility,
        }
    }
}

/// Tracks the state machine of one attempt and reports progress.
struct Progress {
    state: DeploymentState,
    events: Option<mpsc::Sender<DeploymentEvent>>,
}

impl Progress {
    fn new(events: Option<mpsc::Sender<DeploymentEvent>>) -> Self {
        Self {
            state: DeploymentState::Idle,
            events,
        }
    }

    async fn emit(&self, event: DeploymentEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event).await;
        }
    }

    fn transition(&mut self, next: DeploymentState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "Deployment state transition");
        self.state = next;
    }

    async fn enter(&mut self, stage: Stage) {
        let next = match stage {
            Stage::Provisioning => DeploymentState::Provisioning,
            Stage::Initializing => DeploymentState::Initializing,
            Stage::Publishing => DeploymentState::Publishing,
        };
        self.transition(next);
        self.emit(DeploymentEvent::StageStarted { stage }).await;
    }

    async fn complete(&self, stage: Stage) {
        info!(%stage, "Stage completed successfully");
        self.emit(DeploymentEvent::StageCompleted {
            stage,
            success: true,
        })
        .await;
    }

    async fn fail(&mut self, stage: Stage, err: Error) -> DeploymentOutcome {
        error!(%stage, kind = %err.kind(), error = %err.message(), "Stage failed");
        self.transition(DeploymentState::Failed(stage));
        self.emit(DeploymentEvent::StageCompleted {
            stage,
            success: false,
        })
        .await;
        self.emit(DeploymentEvent::DeploymentCompleted { success: false })
            .await;
        DeploymentOutcome::failure(stage, &err)
    }

    async fn succeed(&mut self, repo_url: String) -> DeploymentOutcome {
        self.transition(DeploymentState::Succeeded);
        self.emit(DeploymentEvent::DeploymentCompleted { success: true })
            .await;
        DeploymentOutcome::Success { repo_url }
    }
}

/// Sequences provisioning, initialization and publishing.
///
/// Each step runs at most once per attempt (retries of a `RemoteUnavailable`
/// step aside) and the first failure ends the attempt. Nothing is rolled back:
/// a repository created before a later failure is left in place.
pub struct DeploymentOrchestrator {
    provisioner: Arc<dyn RepositoryProvisioner>,
    store: Arc<dyn WorkspaceStore>,
    initializer: Arc<dyn RepositoryInitializer>,
    publisher: Arc<dyn Publisher>,
    settings: DeploymentSettings,
    retry: RetryPolicy,
}

impl DeploymentOrchestrator {
    pub fn new(
        provisioner: Arc<dyn RepositoryProvisioner>,
        store: Arc<dyn WorkspaceStore>,
        initializer: Arc<dyn RepositoryInitializer>,
        publisher: Arc<dyn Publisher>,
        settings: DeploymentSettings,
    ) -> Self {
        Self {
            provisioner,
            store,
            initializer,
            publisher,
            settings,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn settings(&self) -> &DeploymentSettings {
        &self.settings
    }

    /// Publish `request.workspace` as a new repository.
    pub async fn deploy(&self, request: DeploymentRequest) -> DeploymentOutcome {
        self.run(DeploymentId::new(), request, None).await
    }

    /// Like [`deploy`](Self::deploy), reporting progress on `events`.
    pub async fn deploy_with_events(
        &self,
        request: DeploymentRequest,
        events: mpsc::Sender<DeploymentEvent>,
    ) -> DeploymentOutcome {
        self.run(DeploymentId::new(), request, Some(events)).await
    }

    #[instrument(
        skip_all,
        fields(
            deployment_id = %id,
            project = %request.project_name,
            owner = %request.owner_account,
        )
    )]
    async fn run(
        &self,
        id: DeploymentId,
        request: DeploymentRequest,
        events: Option<mpsc::Sender<DeploymentEvent>>,
    ) -> DeploymentOutcome {
        let mut progress = Progress::new(events);
        info!(files = request.workspace.len(), "Starting deployment");

        progress.enter(Stage::Provisioning).await;
        let remote = match self.provision(&request, &progress).await {
            Ok(remote) => remote,
            Err(e) => return progress.fail(Stage::Provisioning, e).await,
        };
        progress.complete(Stage::Provisioning).await;

        progress.enter(Stage::Initializing).await;
        let local = match self.initialize(&request).await {
            Ok(local) => local,
            Err(e) => return progress.fail(Stage::Initializing, e).await,
        };
        progress.complete(Stage::Initializing).await;

        progress.enter(Stage::Publishing).await;
        if let Err(e) = self.publish(&request, &local, &remote, &progress).await {
            return progress.fail(Stage::Publishing, e).await;
        }
        progress.complete(Stage::Publishing).await;

        info!(repo_url = %remote.html_url, "Deployment succeeded");
        progress.succeed(remote.html_url).await
    }

    async fn provision(
        &self,
        request: &DeploymentRequest,
        progress: &Progress,
    ) -> Result<RemoteRepositoryHandle> {
        let visibility = request
            .visibility
            .unwrap_or(self.settings.default_visibility);

        self.run_with_retry(Stage::Provisioning, progress, || {
            self.provisioner.create_repository(
                &request.owner_account,
                &request.project_name,
                visibility,
                &request.credential,
            )
        })
        .await
    }

    async fn initialize(&self, request: &DeploymentRequest) -> Result<LocalRepositoryState> {
        let root = self
            .store
            .materialize(
                &request.owner_account,
                &request.project_name,
                &request.workspace,
            )
            .await?;
        let snapshot = self
            .store
            .read(&request.owner_account, &request.project_name)
            .await?;
        debug!(root = %root.display(), files = snapshot.files.len(), "Workspace snapshot ready");

        let message = TemplateContext::new(&request.project_name, &request.owner_account)
            .render(&self.settings.commit_message);

        let local = self
            .initializer
            .initialize(&snapshot.root, &self.settings.identity, &message)
            .await?;

        if !local.has_commit {
            return Err(Error::VcsTool(format!(
                "no commit recorded in {}",
                local.root_path.display()
            )));
        }
        Ok(local)
    }

    async fn publish(
        &self,
        request: &DeploymentRequest,
        local: &LocalRepositoryState,
        remote: &RemoteRepositoryHandle,
        progress: &Progress,
    ) -> Result<()> {
        match self.publisher.bind(local, remote).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::RemoteAlreadyBound => {
                warn!(error = %e.message(), "Remote already bound, rebinding");
                self.publisher.rebind(local, remote).await?;
            }
            Err(e) => return Err(e),
        }

        self.run_with_retry(Stage::Publishing, progress, || {
            self.publisher
                .push(local, remote, &self.settings.branch, &request.credential)
        })
        .await
    }

    /// Run `op`, re-running it with backoff while it fails with a
    /// retry-eligible error.
    async fn run_with_retry<T, F, Fut>(&self, stage: Stage, progress: &Progress, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if self.retry.should_retry(attempt, &e) => {
                    let delay = self.retry.delay_for(attempt);
                    warn!(%stage, attempt, ?delay, error = %e.message(), "Transient failure, retrying");
                    progress
                        .emit(DeploymentEvent::StageRetrying {
                            stage,
                            attempt,
                            delay,
                            message: e.message().to_string(),
                        })
                        .await;
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
