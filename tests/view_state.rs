mod common;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use common::{repo_json, MockTransport};
use portfolio_repo_feed::error::{FeedError, Result, USER_FAILURE_MESSAGE};
use portfolio_repo_feed::feed::FeedProvider;
use portfolio_repo_feed::github::{GitHubClient, API_BASE_URL};
use portfolio_repo_feed::models::{FeedPolicy, RepositoryRecord};
use portfolio_repo_feed::source::{FeedSource, ProviderSource};
use portfolio_repo_feed::view::{
    self, derive_categories, filter_records, FeedState, FeedView, ViewConfig, ALL_CATEGORY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

fn record(id: u64, topics: &[&str]) -> RepositoryRecord {
    RepositoryRecord {
        id,
        name: format!("repo-{}", id),
        description: None,
        primary_language: None,
        topics: topics.iter().map(|t| t.to_string()).collect(),
        star_count: 0,
        fork_count: 0,
        updated_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(id as i64),
        is_fork: false,
        is_archived: false,
        web_url: format!("https://github.com/octo/repo-{}", id),
        homepage_url: None,
    }
}

fn mixed_feed() -> Vec<RepositoryRecord> {
    (0..14)
        .map(|i| match i % 3 {
            0 => record(i, &["web", "react"]),
            1 => record(i, &["rust"]),
            _ => record(i, &[]),
        })
        .collect()
}

fn loaded(records: Vec<RepositoryRecord>) -> FeedView {
    let mut view = FeedView::new(ViewConfig::default());
    let ticket = view.begin_load();
    assert!(view.finish_load(ticket, Ok(records)));
    view
}

fn provider_source(transport: MockTransport) -> ProviderSource<MockTransport> {
    let client = GitHubClient::with_transport(transport, API_BASE_URL).unwrap();
    ProviderSource::new(FeedProvider::new(client, FeedPolicy::default()), "octo", None)
}

/// Source that counts calls and fails until told otherwise
struct FlakySource {
    calls: AtomicUsize,
    failures: usize,
}

#[async_trait]
impl FeedSource for FlakySource {
    async fn fetch_feed(&self) -> Result<Vec<RepositoryRecord>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            Err(FeedError::Upstream {
                status: 502,
                body: "Bad Gateway".to_string(),
            })
        } else {
            Ok(vec![record(1, &["web"])])
        }
    }
}

/// Source that never answers
struct PendingSource;

#[async_trait]
impl FeedSource for PendingSource {
    async fn fetch_feed(&self) -> Result<Vec<RepositoryRecord>> {
        futures::future::pending().await
    }
}

/// Source that answers after a delay
struct SlowSource(Duration);

#[async_trait]
impl FeedSource for SlowSource {
    async fn fetch_feed(&self) -> Result<Vec<RepositoryRecord>> {
        tokio::time::sleep(self.0).await;
        Ok(vec![record(1, &[])])
    }
}

#[test]
fn test_categories_cover_every_topic() {
    let records = mixed_feed();
    let categories = derive_categories(&records);

    assert_eq!(categories[0], ALL_CATEGORY);
    for record in &records {
        for topic in &record.topics {
            assert!(categories.contains(topic), "missing {}", topic);
        }
    }
    assert_eq!(categories, vec!["All", "react", "rust", "web"]);
}

#[test]
fn test_filter_matches_topic_membership_exactly() {
    let records = mixed_feed();

    let web = filter_records(&records, "web");
    let expected: Vec<_> = records.iter().filter(|r| r.topics.contains("web")).collect();
    assert_eq!(web, expected);
    assert_eq!(web.len(), 5);

    assert_eq!(filter_records(&records, ALL_CATEGORY).len(), records.len());
    assert!(filter_records(&records, "Web").is_empty());
}

#[test]
fn test_show_more_toggle() {
    let mut view = loaded(mixed_feed());

    assert_eq!(view.visible_count(), Some(6));
    assert_eq!(view.visible().len(), 6);
    assert!(view.has_more());

    view.toggle_show_more();
    assert_eq!(view.visible_count(), Some(14));
    assert_eq!(view.visible().len(), 14);

    view.toggle_show_more();
    assert_eq!(view.visible_count(), Some(6));
    assert_eq!(view.visible().len(), 6);

    assert!(view.select_category("rust"));
    assert_eq!(view.filtered().len(), 5);
    assert_eq!(view.visible().len(), 5);
    assert!(!view.has_more());

    view.toggle_show_more();
    assert_eq!(view.visible_count(), Some(5));
    assert_eq!(view.visible().len(), 5);
    view.toggle_show_more();
    assert_eq!(view.visible_count(), Some(6));
}

#[test]
fn test_cards_follow_visible_records() {
    let mut view = loaded(mixed_feed());
    assert!(view.select_category("web"));

    let cards = view.cards();
    assert_eq!(cards.len(), 5);
    assert!(cards.iter().all(|c| c.topics.contains(&"web".to_string())));
    assert!(cards.iter().all(|c| c.description == "No description provided"));
}

#[test]
fn test_interactions_ignored_before_load() {
    let mut view = FeedView::new(ViewConfig::default());

    assert!(!view.select_category(ALL_CATEGORY));
    view.toggle_show_more();
    assert_eq!(view.state(), &FeedState::Idle);
    assert!(view.cards().is_empty());
    assert!(view.categories().is_empty());
}

#[tokio::test]
async fn test_empty_account_reaches_loaded() {
    let view = Mutex::new(FeedView::new(ViewConfig::default()));
    let source = provider_source(MockTransport::with_repos(vec![]));

    assert!(view::load(&view, &source).await);

    let view = view.into_inner();
    assert!(matches!(view.state(), FeedState::Loaded(_)));
    assert_eq!(view.categories(), &["All".to_string()]);
    assert!(view.visible().is_empty());
}

#[tokio::test]
async fn test_upstream_forbidden_fails_with_generic_message() {
    let view = Mutex::new(FeedView::new(ViewConfig::default()));
    let source = provider_source(MockTransport::new(403, r#"{"message":"Forbidden"}"#));

    view::load(&view, &source).await;
    assert_eq!(
        view.lock().await.state(),
        &FeedState::Failed(USER_FAILURE_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn test_non_array_body_fails_with_generic_message() {
    let view = Mutex::new(FeedView::new(ViewConfig::default()));
    let source = provider_source(MockTransport::new(200, r#"{"message":"Not Found"}"#));

    view::load(&view, &source).await;
    assert_eq!(
        view.lock().await.state(),
        &FeedState::Failed(USER_FAILURE_MESSAGE.to_string())
    );
}

#[tokio::test]
async fn test_load_from_provider_source() {
    let repos = vec![
        repo_json(1, "older", "2023-01-01T00:00:00Z", &["rust"]),
        repo_json(2, "newer", "2024-01-01T00:00:00Z", &["web", "rust"]),
    ];
    let transport = MockTransport::with_repos(repos);
    let view = Mutex::new(FeedView::new(ViewConfig::default()));
    let source = provider_source(transport.clone());

    view::load(&view, &source).await;

    let mut view = view.into_inner();
    assert_eq!(view.categories(), &["All", "rust", "web"].map(String::from));
    let names: Vec<_> = view.visible().iter().map(|r| r.name.clone()).collect();
    assert_eq!(names, vec!["newer", "older"]);

    // Selecting and expanding stays local
    view.select_category("web");
    view.toggle_show_more();
    assert_eq!(view.visible().len(), 1);
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn test_retry_only_from_failed() {
    let source = FlakySource {
        calls: AtomicUsize::new(0),
        failures: 1,
    };
    let view = Mutex::new(FeedView::new(ViewConfig::default()));

    assert!(!view::retry(&view, &source).await);
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    view::load(&view, &source).await;
    assert!(matches!(view.lock().await.state(), FeedState::Failed(_)));

    assert!(view::retry(&view, &source).await);
    assert!(matches!(view.lock().await.state(), FeedState::Loaded(_)));
    assert_eq!(source.calls.load(Ordering::SeqCst), 2);

    assert!(!view::retry(&view, &source).await);
}

#[tokio::test]
async fn test_cancel_before_start_leaves_view_idle() {
    let view = Arc::new(Mutex::new(FeedView::new(ViewConfig::default())));
    let handle = view::spawn_load(view.clone(), Arc::new(PendingSource));
    handle.cancel();

    assert_eq!(handle.wait().await, None);
    assert_eq!(view.lock().await.state(), &FeedState::Idle);

    // The view can still be loaded afterwards
    let handle = view::spawn_load(view.clone(), Arc::new(SlowSource(Duration::from_millis(1))));
    assert_eq!(handle.wait().await, Some(true));
    assert!(matches!(view.lock().await.state(), FeedState::Loaded(_)));
}

#[tokio::test]
async fn test_cancel_in_flight_returns_view_to_idle() {
    let view = Arc::new(Mutex::new(FeedView::new(ViewConfig::default())));
    let handle = view::spawn_load(view.clone(), Arc::new(PendingSource));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(view.lock().await.state(), &FeedState::Loading);
    handle.cancel();

    assert_eq!(handle.wait().await, None);
    assert_eq!(view.lock().await.state(), &FeedState::Idle);
}

#[tokio::test]
async fn test_disposed_view_ignores_late_result() {
    let view = Arc::new(Mutex::new(FeedView::new(ViewConfig::default())));
    let handle = view::spawn_load(view.clone(), Arc::new(SlowSource(Duration::from_millis(50))));

    tokio::time::sleep(Duration::from_millis(10)).await;
    view.lock().await.dispose();

    assert_eq!(handle.wait().await, Some(false));
    assert_eq!(view.lock().await.state(), &FeedState::Loading);
}

#[tokio::test]
async fn test_spawned_load_applies_result() {
    let view = Arc::new(Mutex::new(FeedView::new(ViewConfig::default())));
    let handle = view::spawn_load(view.clone(), Arc::new(SlowSource(Duration::from_millis(5))));

    assert_eq!(handle.wait().await, Some(true));
    assert_eq!(view.lock().await.filtered().len(), 1);
}
