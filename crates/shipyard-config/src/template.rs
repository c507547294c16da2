//! Variable interpolation for commit messages.
//!
//! Supports variables like:
//! - `${project.name}` - Repository name
//! - `${project.owner}` - Owning account
//! - `${date}` - ISO date (YYYY-MM-DD)
//! - `${datetime}` - ISO datetime

use regex::Regex;
use std::sync::LazyLock;

// Regex for matching ${...} variables
static VAR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z_][a-zA-Z0-9_]*)?)\}").unwrap()
});

/// Values available to a template.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    pub project_name: String,
    pub project_owner: String,
}

impl TemplateContext {
    pub fn new(project_name: impl Into<String>, project_owner: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            project_owner: project_owner.into(),
        }
    }

    /// Resolve a variable name to its value.
    pub fn resolve(&self, var_name: &str) -> Option<String> {
        let parts: Vec<&str> = var_name.split('.').collect();

        match parts.as_slice() {
            ["project", "name"] => Some(self.project_name.clone()),
            ["project", "owner"] => Some(self.project_owner.clone()),
            ["date"] => Some(chrono::Utc::now().format("%Y-%m-%d").to_string()),
            ["datetime"] => Some(chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()),
            _ => None,
        }
    }

    /// Interpolate all variables in a string. Unknown variables are left as-is.
    pub fn render(&self, input: &str) -> String {
        VAR_REGEX
            .replace_all(input, |caps: &regex::Captures| {
                let var_name = &caps[1];
                self.resolve(var_name)
                    .unwrap_or_else(|| format!("${{{}}}", var_name))
            })
            .to_string()
    }
}
