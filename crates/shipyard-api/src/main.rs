//! Shipyard API Server

use clap::Parser;
use shipyard_api::{AppState, routes};
use shipyard_config::ShipyardConfig;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shipyard-server")]
#[command(about = "Publish generated projects as GitHub repositories", version)]
struct Args {
    /// Path to the KDL configuration file
    #[arg(short, long, env = "SHIPYARD_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = ShipyardConfig::load(args.config.as_deref())?;
    info!(
        api_url = %config.github.api_url,
        output_dir = %config.workspace.output_dir.display(),
        "Configuration loaded"
    );

    let state = AppState::from_config(&config)?;

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    let addr = config.server.bind;
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
