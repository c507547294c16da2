//! API routes.

pub mod deploy;
pub mod health;

use crate::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;

/// Build the main API router.
pub fn router(state: AppState) -> Router {
    let body_limit = state.max_body_bytes;
    Router::new()
        .merge(deploy::router())
        .merge(health::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
