//! Health check endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use std::path::Path;
use tracing::warn;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready when git runs and the output directory accepts writes.
async fn ready(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let git = match state.git.check_available().await {
        Ok(version) => json!({ "ok": true, "version": version }),
        Err(e) => {
            warn!(error = %e, "git unavailable");
            json!({ "ok": false, "error": e.message() })
        }
    };

    let output_dir = match probe_writable(&state.output_dir).await {
        Ok(()) => json!({ "ok": true }),
        Err(e) => {
            warn!(error = %e, dir = %state.output_dir.display(), "Output directory not writable");
            json!({ "ok": false, "error": e.to_string() })
        }
    };

    let ready = git["ok"] == true && output_dir["ok"] == true;
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if ready { "ready" } else { "unavailable" },
            "checks": { "git": git, "outputDir": output_dir },
        })),
    )
}

async fn probe_writable(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let probe = dir.join(".shipyard-ready");
    tokio::fs::write(&probe, b"ok").await?;
    tokio::fs::remove_file(&probe).await
}
