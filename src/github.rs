use crate::error::{FeedError, Result};
use crate::types::GitHubRepo;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const API_BASE_URL: &str = "https://api.github.com";
/// Upstream maximum page size. Only the first page is ever requested.
pub const PER_PAGE: u32 = 100;
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github.mercy-preview+json";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Status and body of one upstream reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The single outbound call the provider makes
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, headers: &[(&'static str, String)]) -> Result<UpstreamResponse>;
}

/// `Transport` over a shared reqwest client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("portfolio-repo-feed/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(HttpTransport { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url, headers: &[(&'static str, String)]) -> Result<UpstreamResponse> {
        let mut request = self.client.get(url.as_str());
        for (name, value) in headers {
            request = request.header(*name, value);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(UpstreamResponse { status, body })
    }
}

pub struct GitHubClient<T: Transport = HttpTransport> {
    transport: T,
    api_base: Url,
}

impl GitHubClient<HttpTransport> {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self> {
        GitHubClient::with_transport(HttpTransport::new(timeout)?, api_base)
    }
}

impl<T: Transport> GitHubClient<T> {
    pub fn with_transport(transport: T, api_base: &str) -> Result<Self> {
        let api_base = Url::parse(api_base).map_err(|e| {
            FeedError::Configuration(format!("Invalid API base URL '{}': {}", api_base, e))
        })?;
        if api_base.cannot_be_a_base() {
            return Err(FeedError::Configuration(format!(
                "API base URL '{}' cannot carry a path",
                api_base
            )));
        }

        Ok(GitHubClient { transport, api_base })
    }

    /// `{api_base}/users/{owner}/repos?per_page=100`
    pub fn repos_url(&self, owner: &str) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| FeedError::Configuration(format!("Invalid API base URL '{}'", self.api_base)))?
            .pop_if_empty()
            .extend(["users", owner, "repos"]);
        url.query_pairs_mut()
            .append_pair("per_page", &PER_PAGE.to_string());
        Ok(url)
    }

    /// Fetch the first page of an account's repositories in upstream shape.
    pub async fn list_raw(&self, owner: &str, credential: Option<&str>) -> Result<Vec<GitHubRepo>> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(FeedError::Configuration("Account handle is empty".to_string()));
        }

        let url = self.repos_url(owner)?;
        let mut headers = vec![("Accept", ACCEPT_MEDIA_TYPE.to_string())];
        if let Some(token) = credential.map(str::trim).filter(|t| !t.is_empty()) {
            headers.push(("Authorization", format!("token {}", token)));
        }

        let response = self.transport.get(&url, &headers).await?;
        debug!(owner, status = response.status, "GitHub repository listing responded");

        if !response.is_success() {
            warn!(owner, status = response.status, "GitHub repository listing failed");
            return Err(FeedError::Upstream {
                status: response.status,
                body: response.body,
            });
        }

        parse_repo_list(&response.body)
    }
}

/// Parse a listing body, rejecting anything that is not an array of repositories.
pub fn parse_repo_list(body: &str) -> Result<Vec<GitHubRepo>> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| FeedError::MalformedResponse(format!("Response is not JSON: {}", e)))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            warn!(payload = %other, "Expected repository list to be an array");
            return Err(FeedError::MalformedResponse(format!(
                "Expected an array, got {}",
                json_kind(&other)
            )));
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item).map_err(|e| {
                FeedError::MalformedResponse(format!("Item {} is not a repository: {}", index, e))
            })
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
