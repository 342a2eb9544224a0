use crate::error::{FeedError, Result};
use crate::github::{GitHubClient, HttpTransport, Transport};
use crate::models::{FeedPolicy, ForkPolicy, RepositoryRecord, SortOrder};
use crate::types::GitHubRepo;
use std::cmp::Ordering;
use tracing::{debug, info};

/// Lists an account's repositories and shapes them into a feed.
pub struct FeedProvider<T: Transport = HttpTransport> {
    client: GitHubClient<T>,
    policy: FeedPolicy,
    require_credential: bool,
}

impl<T: Transport> FeedProvider<T> {
    pub fn new(client: GitHubClient<T>, policy: FeedPolicy) -> Self {
        FeedProvider {
            client,
            policy,
            require_credential: false,
        }
    }

    /// Reject calls that arrive without a credential.
    pub fn require_credential(mut self, required: bool) -> Self {
        self.require_credential = required;
        self
    }

    /// Normalized feed: archived records removed, fork policy applied, total order.
    pub async fn list_repositories(
        &self,
        owner: &str,
        credential: Option<&str>,
    ) -> Result<Vec<RepositoryRecord>> {
        let repos = self.list_raw_sorted(owner, credential).await?;
        Ok(repos.into_iter().map(RepositoryRecord::from).collect())
    }

    /// Same filtering and order as `list_repositories`, kept in upstream shape.
    pub async fn list_raw_sorted(
        &self,
        owner: &str,
        credential: Option<&str>,
    ) -> Result<Vec<GitHubRepo>> {
        self.check_config(owner, credential)?;

        let repos = self.client.list_raw(owner, credential).await?;
        let fetched = repos.len();
        let repos = prepare_raw(repos, self.policy);

        info!(
            owner,
            fetched,
            kept = repos.len(),
            sort = %self.policy.sort,
            "Repository feed prepared"
        );
        Ok(repos)
    }

    fn check_config(&self, owner: &str, credential: Option<&str>) -> Result<()> {
        if owner.trim().is_empty() {
            return Err(FeedError::Configuration(
                "GitHub account handle is not configured".to_string(),
            ));
        }

        let has_credential = credential.map_or(false, |c| !c.trim().is_empty());
        if self.require_credential && !has_credential {
            return Err(FeedError::Configuration(
                "GitHub token is required but not configured".to_string(),
            ));
        }

        Ok(())
    }
}

fn keep(archived: bool, fork: bool, policy: FeedPolicy) -> bool {
    if archived {
        return false;
    }
    !(fork && policy.forks == ForkPolicy::Exclude)
}

/// Filter and order normalized records.
pub fn prepare(records: Vec<RepositoryRecord>, policy: FeedPolicy) -> Vec<RepositoryRecord> {
    let mut records: Vec<_> = records
        .into_iter()
        .filter(|r| keep(r.is_archived, r.is_fork, policy))
        .collect();
    sort_records(&mut records, policy.sort);
    records
}

/// Filter and order upstream objects.
pub fn prepare_raw(repos: Vec<GitHubRepo>, policy: FeedPolicy) -> Vec<GitHubRepo> {
    let before = repos.len();
    let mut repos: Vec<_> = repos
        .into_iter()
        .filter(|r| keep(r.archived, r.fork, policy))
        .collect();
    debug!(dropped = before - repos.len(), "Filtered archived/forked repositories");

    repos.sort_by(|a, b| {
        compare(
            policy.sort,
            (a.stargazers_count, a.forks_count, a.updated_at, a.id),
            (b.stargazers_count, b.forks_count, b.updated_at, b.id),
        )
    });
    repos
}

pub fn sort_records(records: &mut [RepositoryRecord], order: SortOrder) {
    records.sort_by(|a, b| {
        compare(
            order,
            (a.star_count, a.fork_count, a.updated_at, a.id),
            (b.star_count, b.fork_count, b.updated_at, b.id),
        )
    });
}

type SortKey = (u64, u64, chrono::DateTime<chrono::Utc>, u64);

// Ties fall back to updated_at desc, then id asc, so the order is total.
fn compare(order: SortOrder, a: SortKey, b: SortKey) -> Ordering {
    let (a_stars, a_forks, a_updated, a_id) = a;
    let (b_stars, b_forks, b_updated, b_id) = b;

    let primary = match order {
        SortOrder::Updated => Ordering::Equal,
        SortOrder::Popularity => {
            let a_score = a_stars.saturating_add(a_forks);
            let b_score = b_stars.saturating_add(b_forks);
            b_score.cmp(&a_score)
        }
    };

    primary
        .then_with(|| b_updated.cmp(&a_updated))
        .then_with(|| a_id.cmp(&b_id))
}
