//! Deployment sequencing for Shipyard.
//!
//! Runs provisioning, local initialization and publishing in strict order
//! and reduces them to a single outcome.

pub mod orchestrator;
pub mod retry;

pub use orchestrator::{DeploymentEvent, DeploymentOrchestrator, DeploymentSettings};
pub use retry::RetryPolicy;
