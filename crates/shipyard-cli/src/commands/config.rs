//! Configuration validation command.

use anyhow::{Context, Result};
use shipyard_config::{ShipyardConfig, parse_config};
use std::path::Path;

const DEFAULT_PATH: &str = "shipyard.kdl";

pub fn validate(path: Option<&Path>) -> Result<()> {
    let path = path.unwrap_or(Path::new(DEFAULT_PATH));
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    match parse_config(&content) {
        Ok(config) => {
            println!("Configuration is valid");
            print_summary(&config);
            Ok(())
        }
        Err(e) => {
            println!("Configuration error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_summary(config: &ShipyardConfig) {
    println!("  server:     {}", config.server.bind);
    println!("  github:     {}", config.github.api_url);
    println!("  output dir: {}", config.workspace.output_dir.display());
    println!(
        "  git:        {} (branch {}, remote {})",
        config.git.binary, config.git.branch, config.git.remote
    );
    println!("  visibility: {:?}", config.deploy.visibility);
    println!(
        "  retry:      {} attempts, {:?} initial backoff",
        config.retry.max_attempts, config.retry.initial_backoff
    );
}
