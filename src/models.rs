use crate::types::GitHubRepo;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Repository metadata as consumed by the view layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRecord {
    pub id: u64,
    pub name: String,
    pub description: Option<String>,
    pub primary_language: Option<String>,
    pub topics: BTreeSet<String>,
    pub star_count: u64,
    pub fork_count: u64,
    pub updated_at: DateTime<Utc>,
    pub is_fork: bool,
    pub is_archived: bool,
    pub web_url: String,
    pub homepage_url: Option<String>,
}

impl From<GitHubRepo> for RepositoryRecord {
    fn from(repo: GitHubRepo) -> Self {
        RepositoryRecord {
            id: repo.id,
            name: repo.name,
            description: repo.description.filter(|d| !d.trim().is_empty()),
            primary_language: repo.language.filter(|l| !l.trim().is_empty()),
            topics: repo.topics.into_iter().collect(),
            star_count: repo.stargazers_count,
            fork_count: repo.forks_count,
            updated_at: repo.updated_at,
            is_fork: repo.fork,
            is_archived: repo.archived,
            web_url: repo.html_url,
            // GitHub reports an unset homepage as "" as often as null
            homepage_url: repo.homepage.filter(|h| !h.trim().is_empty()),
        }
    }
}

impl From<&GitHubRepo> for RepositoryRecord {
    fn from(repo: &GitHubRepo) -> Self {
        RepositoryRecord::from(repo.clone())
    }
}

/// Ordering applied to a feed before it is returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Most recently updated first
    #[default]
    Updated,
    /// Highest `stars + forks` first
    Popularity,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Updated => write!(f, "updated"),
            SortOrder::Popularity => write!(f, "popularity"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "updated" | "updated_at" => Ok(SortOrder::Updated),
            "popularity" | "popular" | "stars" => Ok(SortOrder::Popularity),
            other => Err(format!("unknown sort order '{}'", other)),
        }
    }
}

/// Whether forked repositories stay in the feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForkPolicy {
    #[default]
    Include,
    Exclude,
}

impl ForkPolicy {
    pub fn from_exclude_flag(exclude: bool) -> Self {
        if exclude {
            ForkPolicy::Exclude
        } else {
            ForkPolicy::Include
        }
    }
}

/// Filtering and ordering rules for one deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedPolicy {
    pub sort: SortOrder,
    pub forks: ForkPolicy,
}
