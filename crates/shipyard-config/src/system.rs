//! Service configuration parsing.

use crate::{ConfigError, ConfigResult};
use kdl::{KdlDocument, KdlNode};
use shipyard_core::{CommitIdentity, Visibility};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Service-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct ShipyardConfig {
    pub server: ServerSettings,
    pub github: GitHubSettings,
    pub workspace: WorkspaceSettings,
    pub git: GitSettings,
    pub deploy: DeploySettings,
    pub retry: RetrySettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: SocketAddr,
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub api_url: String,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.github.com".to_string(),
            user_agent: "shipyard".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WorkspaceSettings {
    /// Parent directory of every materialized project.
    pub output_dir: PathBuf,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir().join("shipyard-projects"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GitSettings {
    pub binary: String,
    pub branch: String,
    pub remote: String,
    pub timeout: Duration,
    pub author_name: String,
    pub author_email: String,
    pub commit_message: String,
}

impl GitSettings {
    pub fn identity(&self) -> CommitIdentity {
        CommitIdentity {
            name: self.author_name.clone(),
            email: self.author_email.clone(),
        }
    }
}

impl Default for GitSettings {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            branch: "main".to_string(),
            remote: "origin".to_string(),
            timeout: Duration::from_secs(120),
            author_name: "Shipyard".to_string(),
            author_email: "shipyard@users.noreply.github.com".to_string(),
            commit_message: "Initial commit of ${project.name}".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeploySettings {
    pub visibility: Visibility,
}

#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl ShipyardConfig {
    /// Load configuration from `path`, falling back to `SHIPYARD_CONFIG` and
    /// then to built-in defaults. Environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("SHIPYARD_CONFIG").ok().map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(&path)?;
                parse_config(&content)?
            }
            None => Self::default(),
        };

        config.apply_env();
        Ok(config)
    }

    /// Apply `SHIPYARD_OUTPUT_DIR` and `GITHUB_API_URL` overrides.
    pub fn apply_env(&mut self) {
        if let Ok(dir) = std::env::var("SHIPYARD_OUTPUT_DIR") {
            self.workspace.output_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("GITHUB_API_URL") {
            self.github.api_url = url;
        }
    }
}

/// Parse service configuration from KDL text.
pub fn parse_config(kdl: &str) -> ConfigResult<ShipyardConfig> {
    let doc: KdlDocument = kdl.parse()?;
    let mut config = ShipyardConfig::default();

    for node in doc.nodes() {
        match node.name().value() {
            "server" => parse_server(node, &mut config.server)?,
            "github" => parse_github(node, &mut config.github)?,
            "workspace" => {
                for child in children(node) {
                    if child.name().value() == "output-dir" {
                        config.workspace.output_dir = PathBuf::from(required_string(child)?);
                    }
                }
            }
            "git" => parse_git(node, &mut config.git)?,
            "deploy" => {
                for child in children(node) {
                    if child.name().value() == "visibility" {
                        let value = required_string(child)?;
                        config.deploy.visibility =
                            value.parse().map_err(|message| ConfigError::InvalidValue {
                                field: "deploy.visibility".to_string(),
                                message,
                            })?;
                    }
                }
            }
            "retry" => parse_retry(node, &mut config.retry)?,
            _ => {} // Ignore unknown nodes
        }
    }

    Ok(config)
}

fn parse_server(node: &KdlNode, server: &mut ServerSettings) -> ConfigResult<()> {
    for child in children(node) {
        match child.name().value() {
            "bind" => {
                let value = required_string(child)?;
                server.bind = value.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "server.bind".to_string(),
                    message: format!("not a socket address: {}", value),
                })?;
            }
            "max-body-bytes" => {
                server.max_body_bytes = positive_int(child, "server.max-body-bytes")? as usize;
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_github(node: &KdlNode, github: &mut GitHubSettings) -> ConfigResult<()> {
    for child in children(node) {
        match child.name().value() {
            "api-url" => github.api_url = required_string(child)?,
            "user-agent" => github.user_agent = required_string(child)?,
            "timeout-secs" => {
                github.timeout = Duration::from_secs(positive_int(child, "github.timeout-secs")?)
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_git(node: &KdlNode, git: &mut GitSettings) -> ConfigResult<()> {
    for child in children(node) {
        match child.name().value() {
            "binary" => git.binary = required_string(child)?,
            "branch" => git.branch = required_string(child)?,
            "remote" => git.remote = required_string(child)?,
            "timeout-secs" => {
                git.timeout = Duration::from_secs(positive_int(child, "git.timeout-secs")?)
            }
            "author-name" => git.author_name = required_string(child)?,
            "author-email" => git.author_email = required_string(child)?,
            "commit-message" => git.commit_message = required_string(child)?,
            _ => {}
        }
    }

    if git.branch.is_empty() || git.branch.contains(char::is_whitespace) {
        return Err(ConfigError::InvalidValue {
            field: "git.branch".to_string(),
            message: format!("not a branch name: '{}'", git.branch),
        });
    }
    if git.author_name.is_empty() || git.author_email.is_empty() {
        return Err(ConfigError::MissingField("git author identity".to_string()));
    }
    Ok(())
}

fn parse_retry(node: &KdlNode, retry: &mut RetrySettings) -> ConfigResult<()> {
    for child in children(node) {
        match child.name().value() {
            "max-attempts" => {
                retry.max_attempts = positive_int(child, "retry.max-attempts")? as u32
            }
            "initial-backoff-ms" => {
                retry.initial_backoff =
                    Duration::from_millis(positive_int(child, "retry.initial-backoff-ms")?)
            }
            "max-backoff-ms" => {
                retry.max_backoff =
                    Duration::from_millis(positive_int(child, "retry.max-backoff-ms")?)
            }
            _ => {}
        }
    }

    if retry.max_backoff < retry.initial_backoff {
        return Err(ConfigError::InvalidValue {
            field: "retry.max-backoff-ms".to_string(),
            message: "must not be smaller than initial-backoff-ms".to_string(),
        });
    }
    Ok(())
}

// Helper functions for extracting values from KDL nodes

fn children(node: &KdlNode) -> impl Iterator<Item = &KdlNode> {
    node.children().into_iter().flat_map(|doc| doc.nodes())
}

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_first_int_arg(node: &KdlNode) -> Option<i128> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_integer())
}

fn required_string(node: &KdlNode) -> ConfigResult<String> {
    get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField(format!("value for '{}'", node.name().value())))
}

fn positive_int(node: &KdlNode, field: &str) -> ConfigResult<u64> {
    let value = get_first_int_arg(node)
        .ok_or_else(|| ConfigError::MissingField(format!("integer value for '{}'", field)))?;
    if value <= 0 || value > u32::MAX as i128 {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("must be a positive integer, got {}", value),
        });
    }
    Ok(value as u64)
}
