use crate::error::{FeedError, Result};
use crate::feed::FeedProvider;
use crate::github::{parse_repo_list, Transport, DEFAULT_TIMEOUT};
use crate::models::RepositoryRecord;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Where the project section gets its feed from
#[async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch_feed(&self) -> Result<Vec<RepositoryRecord>>;
}

/// Reads the first-party `/api/github-repos` endpoint.
///
/// Holds no GitHub credential; the endpoint keeps it server-side.
#[derive(Debug, Clone)]
pub struct EndpointSource {
    client: Client,
    endpoint: Url,
}

impl EndpointSource {
    pub fn new(endpoint: &str) -> Result<Self> {
        EndpointSource::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            FeedError::Configuration(format!("Invalid feed endpoint '{}': {}", endpoint, e))
        })?;
        let client = Client::builder()
            .user_agent(concat!("portfolio-repo-feed/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(EndpointSource { client, endpoint })
    }
}

#[async_trait]
impl FeedSource for EndpointSource {
    async fn fetch_feed(&self) -> Result<Vec<RepositoryRecord>> {
        let response = self
            .client
            .get(self.endpoint.as_str())
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        debug!(endpoint = %self.endpoint, status = status.as_u16(), "Feed endpoint responded");

        if !status.is_success() {
            warn!(endpoint = %self.endpoint, status = status.as_u16(), "Feed endpoint failed");
            return Err(FeedError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        // The endpoint already filtered and ordered the list
        let repos = parse_repo_list(&body)?;
        Ok(repos.into_iter().map(RepositoryRecord::from).collect())
    }
}

/// Calls a `FeedProvider` in-process.
pub struct ProviderSource<T: Transport> {
    provider: FeedProvider<T>,
    owner: String,
    credential: Option<String>,
}

impl<T: Transport> ProviderSource<T> {
    pub fn new(provider: FeedProvider<T>, owner: impl Into<String>, credential: Option<String>) -> Self {
        ProviderSource {
            provider,
            owner: owner.into(),
            credential,
        }
    }
}

#[async_trait]
impl<T: Transport> FeedSource for ProviderSource<T> {
    async fn fetch_feed(&self) -> Result<Vec<RepositoryRecord>> {
        self.provider
            .list_repositories(&self.owner, self.credential.as_deref())
            .await
    }
}
