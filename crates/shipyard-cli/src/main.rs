//! Shipyard CLI tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Publish project directories as GitHub repositories", long_about = None)]
struct Cli {
    /// Path to the KDL configuration file
    #[arg(long, global = true, env = "SHIPYARD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a directory as a new repository
    Deploy {
        /// Directory holding the project files
        dir: PathBuf,
        /// Repository name
        #[arg(long)]
        project: String,
        /// User or organization that will own the repository
        #[arg(long)]
        owner: String,
        /// GitHub token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: String,
        /// Create a public repository
        #[arg(long)]
        public: bool,
        /// Send the deployment to a running server instead of running it here
        #[arg(long)]
        api_url: Option<String>,
    },
    /// Validate a configuration file
    ValidateConfig {
        /// Path to the configuration file
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            dir,
            project,
            owner,
            token,
            public,
            api_url,
        } => {
            let args = commands::deploy::DeployArgs {
                dir,
                project,
                owner,
                token,
                public,
            };
            match api_url {
                Some(api_url) => commands::deploy::remote(&api_url, args).await?,
                None => commands::deploy::local(cli.config.as_deref(), args).await?,
            }
        }
        Commands::ValidateConfig { path } => {
            commands::config::validate(path.or(cli.config).as_deref())?;
        }
    }

    Ok(())
}
