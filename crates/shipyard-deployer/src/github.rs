//! GitHub API client for repository provisioning.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use shipyard_core::{
    Credential, Error, ErrorKind, RemoteRepositoryHandle, RepositoryProvisioner, Result,
    Visibility,
};
use std::time::Duration;
use tracing::{debug, info, warn};

const API_VERSION: &str = "2022-11-28";

/// Creates repositories through the GitHub REST API.
pub struct GitHubProvisioner {
    client: reqwest::Client,
    api_url: String,
}

impl GitHubProvisioner {
    pub fn new(api_url: impl Into<String>, user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::RemoteUnavailable(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, credential: &Credential) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.api_url, path))
            .header("Authorization", format!("Bearer {}", credential.expose()))
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION)
    }

    /// Resolve the login the credential belongs to.
    async fn authenticated_login(&self, credential: &Credential) -> Result<String> {
        let response = self
            .request(Method::GET, "/user", credential)
            .send()
            .await
            .map_err(classify_transport)?;

        if !response.status().is_success() {
            return Err(error_from_response(response, "resolve authenticated user").await);
        }

        let user: GitHubUser = response
            .json()
            .await
            .map_err(|e| Error::RemoteUnavailable(format!("invalid user response: {}", e)))?;
        Ok(user.login)
    }

    /// Fail with `Conflict` if `owner/name` already exists.
    async fn ensure_absent(&self, owner: &str, name: &str, credential: &Credential) -> Result<()> {
        let path = format!(
            "/repos/{}/{}",
            urlencoding::encode(owner),
            urlencoding::encode(name)
        );
        let response = self
            .request(Method::GET, &path, credential)
            .send()
            .await
            .map_err(classify_transport)?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(()),
            status if status.is_success() => Err(Error::Conflict(format!(
                "repository {}/{} already exists",
                owner, name
            ))),
            _ => Err(error_from_response(response, "check for existing repository").await),
        }
    }
}

#[async_trait]
impl RepositoryProvisioner for GitHubProvisioner {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn create_repository(
        &self,
        owner: &str,
        name: &str,
        visibility: Visibility,
        credential: &Credential,
    ) -> Result<RemoteRepositoryHandle> {
        let login = self.authenticated_login(credential).await?;
        self.ensure_absent(owner, name, credential).await?;

        let endpoint = if login.eq_ignore_ascii_case(owner) {
            "/user/repos".to_string()
        } else {
            format!("/orgs/{}/repos", urlencoding::encode(owner))
        };

        info!(%owner, %name, ?visibility, %endpoint, "Creating repository");

        let payload = serde_json::json!({
            "name": name,
            "private": visibility.is_private(),
            "auto_init": false,
        });

        let response = self
            .request(Method::POST, &endpoint, credential)
            .json(&payload)
            .send()
            .await
            .map_err(classify_transport)?;

        if response.status() == StatusCode::NOT_FOUND && endpoint.starts_with("/orgs/") {
            return Err(Error::NotFound(format!(
                "organization '{}' does not exist or is not accessible",
                owner
            )));
        }
        if !response.status().is_success() {
            return Err(error_from_response(response, "create repository").await);
        }

        let repo: GitHubRepo = response
            .json()
            .await
            .map_err(|e| Error::RemoteUnavailable(format!("invalid repository response: {}", e)))?;

        info!(full_name = %repo.full_name, html_url = %repo.html_url, "Repository created");

        Ok(RemoteRepositoryHandle {
            owner: repo.owner.login,
            name: repo.name,
            clone_url: repo.clone_url,
            html_url: repo.html_url,
            created_at: repo.created_at,
        })
    }
}

/// Classify a failure to get any response at all.
fn classify_transport(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::RemoteUnavailable(format!("request timed out: {}", err))
    } else {
        Error::RemoteUnavailable(format!("request failed: {}", err))
    }
}

/// Classify a non-success HTTP status into the failure taxonomy.
pub fn classify_status(status: StatusCode, headers: &HeaderMap) -> ErrorKind {
    let rate_limited = headers
        .get("X-RateLimit-Remaining")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        == Some(0);

    match status {
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RemoteUnavailable,
        StatusCode::FORBIDDEN if rate_limited => ErrorKind::RemoteUnavailable,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorKind::AuthFailure,
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => ErrorKind::Conflict,
        StatusCode::NOT_FOUND | StatusCode::GONE => ErrorKind::NotFound,
        s if s.is_server_error() => ErrorKind::RemoteUnavailable,
        // Any other rejection will not succeed on a retry.
        _ => ErrorKind::Conflict,
    }
}

async fn error_from_response(response: Response, action: &str) -> Error {
    let status = response.status();
    let kind = classify_status(status, response.headers());
    let text = response.text().await.unwrap_or_default();

    // GitHub error bodies carry a human-readable `message`.
    let detail = serde_json::from_str::<GitHubErrorBody>(&text)
        .map(|body| body.message)
        .unwrap_or(text);

    if kind == ErrorKind::RemoteUnavailable {
        warn!(%status, "GitHub API unavailable");
    } else {
        debug!(%status, %kind, "GitHub API rejected request");
    }

    Error::new(kind, format!("failed to {} ({}): {}", action, status, detail))
}

/// GitHub user information.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    login: String,
}

/// GitHub repository information.
#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
    full_name: String,
    owner: RepoOwner,
    html_url: String,
    clone_url: String,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RepoOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct GitHubErrorBody {
    message: String,
}
