//! Deployment endpoint.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use shipyard_core::{DeploymentOutcome, DeploymentRequest};
use tracing::{info, warn};

use crate::AppState;
use crate::error::ApiError;

pub fn router() -> Router<AppState> {
    Router::new().route("/deploy", post(deploy))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResponse {
    pub success: bool,
    pub repo_url: String,
}

async fn deploy(
    State(state): State<AppState>,
    payload: Result<Json<DeploymentRequest>, JsonRejection>,
) -> Result<Json<DeployResponse>, ApiError> {
    let Json(request) = payload?;

    if let Err(e) = request.validate() {
        warn!(error = %e, "Rejected deployment request");
        return Err(e.into());
    }

    info!(
        project = %request.project_name,
        owner = %request.owner_account,
        files = request.workspace.len(),
        "Deployment requested"
    );

    match state.orchestrator.deploy(request).await {
        DeploymentOutcome::Success { repo_url } => Ok(Json(DeployResponse {
            success: true,
            repo_url,
        })),
        DeploymentOutcome::Failure {
            stage,
            error_kind,
            message,
        } => Err(ApiError::Deployment {
            stage,
            error_kind,
            message,
        }),
    }
}
