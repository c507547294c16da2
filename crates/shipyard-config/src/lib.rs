//! KDL configuration parsing for Shipyard.
//!
//! This crate handles parsing of:
//! - Service configuration (shipyard.kdl)
//! - Commit message templates

pub mod error;
pub mod system;
pub mod template;

pub use error::{ConfigError, ConfigResult};
pub use system::{
    DeploySettings, GitHubSettings, GitSettings, RetrySettings, ServerSettings, ShipyardConfig,
    WorkspaceSettings, parse_config,
};
pub use template::TemplateContext;
