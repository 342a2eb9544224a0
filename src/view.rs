use crate::card::RepoCard;
use crate::error::Result;
use crate::models::RepositoryRecord;
use crate::source::FeedSource;
use crate::theme::DisplayPreference;
use futures::future::{AbortHandle, Abortable};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

pub const ALL_CATEGORY: &str = "All";
pub const DEFAULT_PAGE_SIZE: usize = 6;

#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub page_size: usize,
    pub preference: DisplayPreference,
    pub preview_template: Option<String>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        ViewConfig {
            page_size: DEFAULT_PAGE_SIZE,
            preference: DisplayPreference::default(),
            preview_template: None,
        }
    }
}

/// A feed that arrived, plus the client-local selection over it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFeed {
    pub records: Vec<RepositoryRecord>,
    pub categories: Vec<String>,
    pub active_category: String,
    pub visible_count: usize,
    pub page_size: usize,
}

impl LoadedFeed {
    fn new(records: Vec<RepositoryRecord>, page_size: usize) -> Self {
        LoadedFeed {
            categories: derive_categories(&records),
            records,
            active_category: ALL_CATEGORY.to_string(),
            visible_count: page_size,
            page_size,
        }
    }

    pub fn filtered(&self) -> Vec<&RepositoryRecord> {
        filter_records(&self.records, &self.active_category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedState {
    Idle,
    Loading,
    Loaded(LoadedFeed),
    Failed(String),
}

/// Identifies one load attempt; results for an older attempt are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// `["All"]` followed by every topic in the feed, sorted and deduplicated.
pub fn derive_categories(records: &[RepositoryRecord]) -> Vec<String> {
    let topics: BTreeSet<&String> = records.iter().flat_map(|r| r.topics.iter()).collect();

    std::iter::once(ALL_CATEGORY.to_string())
        .chain(topics.into_iter().filter(|t| t.as_str() != ALL_CATEGORY).cloned())
        .collect()
}

pub fn filter_records<'a>(records: &'a [RepositoryRecord], category: &str) -> Vec<&'a RepositoryRecord> {
    if category == ALL_CATEGORY {
        return records.iter().collect();
    }
    records.iter().filter(|r| r.topics.contains(category)).collect()
}

/// The project section: load state, category tabs and "show more".
#[derive(Debug)]
pub struct FeedView {
    config: ViewConfig,
    state: FeedState,
    generation: u64,
    disposed: bool,
}

impl FeedView {
    pub fn new(config: ViewConfig) -> Self {
        FeedView {
            config,
            state: FeedState::Idle,
            generation: 0,
            disposed: false,
        }
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.state = FeedState::Loading;
        debug!(generation = self.generation, "Repository feed loading");
        LoadTicket(self.generation)
    }

    /// Apply a load result. Returns false when the result was stale and ignored.
    pub fn finish_load(&mut self, ticket: LoadTicket, result: Result<Vec<RepositoryRecord>>) -> bool {
        if self.disposed || ticket.0 != self.generation || self.state != FeedState::Loading {
            debug!(ticket = ticket.0, generation = self.generation, "Ignoring stale feed result");
            return false;
        }

        self.state = match result {
            Ok(records) => {
                info!(count = records.len(), "Repository feed loaded");
                FeedState::Loaded(LoadedFeed::new(records, self.config.page_size))
            }
            Err(e) => {
                error!(kind = e.kind(), error = %e, "Error fetching repositories");
                FeedState::Failed(e.user_message().to_string())
            }
        };
        true
    }

    /// Drop an in-flight load that will never finish. Only the current load counts.
    pub fn abandon_load(&mut self, ticket: LoadTicket) -> bool {
        if ticket.0 != self.generation || self.state != FeedState::Loading {
            return false;
        }
        self.state = FeedState::Idle;
        true
    }

    /// Re-enter loading after a failure.
    pub fn retry(&mut self) -> Option<LoadTicket> {
        match self.state {
            FeedState::Failed(_) if !self.disposed => Some(self.begin_load()),
            _ => None,
        }
    }

    /// Switch tabs. Unknown categories are ignored; expansion resets to one page.
    pub fn select_category(&mut self, category: &str) -> bool {
        let FeedState::Loaded(feed) = &mut self.state else {
            return false;
        };
        if !feed.categories.iter().any(|c| c == category) {
            warn!(category, "Unknown category selected");
            return false;
        }

        feed.active_category = category.to_string();
        feed.visible_count = feed.page_size;
        true
    }

    pub fn toggle_show_more(&mut self) {
        if let FeedState::Loaded(feed) = &mut self.state {
            let total = feed.filtered().len();
            feed.visible_count = if feed.visible_count == feed.page_size {
                total
            } else {
                feed.page_size
            };
        }
    }

    pub fn categories(&self) -> &[String] {
        match &self.state {
            FeedState::Loaded(feed) => &feed.categories,
            _ => &[],
        }
    }

    pub fn active_category(&self) -> Option<&str> {
        match &self.state {
            FeedState::Loaded(feed) => Some(feed.active_category.as_str()),
            _ => None,
        }
    }

    pub fn visible_count(&self) -> Option<usize> {
        match &self.state {
            FeedState::Loaded(feed) => Some(feed.visible_count),
            _ => None,
        }
    }

    pub fn filtered(&self) -> Vec<&RepositoryRecord> {
        match &self.state {
            FeedState::Loaded(feed) => feed.filtered(),
            _ => Vec::new(),
        }
    }

    pub fn visible(&self) -> Vec<&RepositoryRecord> {
        match &self.state {
            FeedState::Loaded(feed) => feed
                .filtered()
                .into_iter()
                .take(feed.visible_count)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Whether the "show more" toggle is worth offering
    pub fn has_more(&self) -> bool {
        match &self.state {
            FeedState::Loaded(feed) => feed.filtered().len() > feed.page_size,
            _ => false,
        }
    }

    pub fn cards(&self) -> Vec<RepoCard> {
        let template = self.config.preview_template.as_deref();
        self.visible()
            .into_iter()
            .map(|r| RepoCard::from_record(r, self.config.preference).with_preview_template(template))
            .collect()
    }

    /// Tear the view down; any load still in flight is ignored on arrival.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}

/// Run one load to completion against `source`.
pub async fn load<S: FeedSource + ?Sized>(view: &Mutex<FeedView>, source: &S) -> bool {
    let ticket = view.lock().await.begin_load();
    let result = source.fetch_feed().await;
    view.lock().await.finish_load(ticket, result)
}

/// Same as `load` for a retry from the failed state. Returns false when not failed.
pub async fn retry<S: FeedSource + ?Sized>(view: &Mutex<FeedView>, source: &S) -> bool {
    let Some(ticket) = view.lock().await.retry() else {
        return false;
    };
    let result = source.fetch_feed().await;
    view.lock().await.finish_load(ticket, result)
}

/// Handle to a load running in the background
pub struct FeedLoadHandle {
    abort: AbortHandle,
    task: JoinHandle<Option<bool>>,
}

impl FeedLoadHandle {
    /// Stop the request. A load that already started is rolled back to `Idle`.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// `Some(applied)` when the load finished, `None` when it was cancelled.
    pub async fn wait(self) -> Option<bool> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Feed load task failed");
                None
            }
        }
    }
}

/// Start a load without waiting for it.
pub fn spawn_load(view: Arc<Mutex<FeedView>>, source: Arc<dyn FeedSource>) -> FeedLoadHandle {
    let (abort, registration) = AbortHandle::new_pair();
    // Generation taken by the attempt, 0 until it starts
    let started = Arc::new(AtomicU64::new(0));

    let attempt = {
        let view = Arc::clone(&view);
        let started = Arc::clone(&started);
        async move {
            let ticket = view.lock().await.begin_load();
            started.store(ticket.0, Ordering::SeqCst);
            let result = source.fetch_feed().await;
            view.lock().await.finish_load(ticket, result)
        }
    };

    let task = tokio::spawn(async move {
        match Abortable::new(attempt, registration).await {
            Ok(applied) => Some(applied),
            Err(_) => {
                let generation = started.load(Ordering::SeqCst);
                if generation != 0 {
                    view.lock().await.abandon_load(LoadTicket(generation));
                }
                debug!(generation, "Feed load cancelled");
                None
            }
        }
    });

    FeedLoadHandle { abort, task }
}

/// Message a failed view shows, if any
pub fn failure_message(state: &FeedState) -> Option<&str> {
    match state {
        FeedState::Failed(message) => Some(message),
        _ => None,
    }
}
