pub mod types;

#[cfg(test)]
pub mod testing;

pub use types::{PullRequest, Repository, RepositoryRef, Review};

use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, instrument};

/// Page size requested from every list endpoint. GitHub caps it at 100.
pub const PER_PAGE: usize = 100;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("GitHub API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("GitHub API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("GitHub API returned invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Unexpected response shape from {path}: {source}")]
    MalformedResponse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Query parameters of a single GET request.
pub type Params = Vec<(&'static str, String)>;

/// Issues one authenticated GET and returns the parsed JSON body.
///
/// Implementations do not retry and do not handle rate limiting; a non-success
/// status is surfaced as `FetchError::Status` and aborts the caller's task.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn fetch(&self, path: &str, params: &Params) -> Result<Value, FetchError>;
}

/// `Gateway` backed by a shared `reqwest::Client`.
///
/// One instance is built per CLI invocation and borrowed by every concurrent
/// aggregation task; the connection pool is released when it is dropped.
pub struct HttpGateway {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpGateway {
    pub fn new(base_url: &str, token: String) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("contrib-metrics/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    #[instrument(skip(self))]
    async fn fetch(&self, path: &str, params: &Params) -> Result<Value, FetchError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/vnd.github+json")
            .header(AUTHORIZATION, format!("token {}", self.token))
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "received response");
        serde_json::from_str(&body).map_err(FetchError::InvalidJson)
    }
}

/// Decode a JSON value into an endpoint's typed shape.
pub fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, FetchError> {
    serde_json::from_value(value).map_err(|source| FetchError::MalformedResponse {
        path: path.to_string(),
        source,
    })
}

pub fn org_repos_path(owner: &str) -> String {
    format!("/orgs/{}/repos", owner)
}

pub fn pulls_path(repo: &RepositoryRef) -> String {
    format!("/repos/{}/{}/pulls", repo.owner, repo.name)
}

pub fn reviews_path(repo: &RepositoryRef, number: u64) -> String {
    format!("/repos/{}/{}/pulls/{}/reviews", repo.owner, repo.name, number)
}

/// First page (up to `PER_PAGE` entries) of an owner's repositories, most
/// recently pushed first.
#[instrument(skip(gateway))]
pub async fn fetch_org_repos(gateway: &dyn Gateway, owner: &str) -> Result<Vec<Repository>, FetchError> {
    let path = org_repos_path(owner);
    let params: Params = vec![
        ("type", "all".to_string()),
        ("sort", "pushed".to_string()),
        ("direction", "desc".to_string()),
        ("per_page", PER_PAGE.to_string()),
        ("page", "1".to_string()),
    ];
    let value = gateway.fetch(&path, &params).await?;
    decode(&path, value)
}

/// First page (up to `PER_PAGE` entries) of a pull request's reviews.
#[instrument(skip(gateway, repo), fields(repo = %repo))]
pub async fn fetch_reviews(
    gateway: &dyn Gateway,
    repo: &RepositoryRef,
    number: u64,
) -> Result<Vec<Review>, FetchError> {
    let path = reviews_path(repo, number);
    let params: Params = vec![
        ("per_page", PER_PAGE.to_string()),
        ("page", "1".to_string()),
    ];
    let value = gateway.fetch(&path, &params).await?;
    decode(&path, value)
}
