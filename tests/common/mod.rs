#![allow(dead_code)]

use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Router};
use portfolio_repo_feed::error::Result;
use portfolio_repo_feed::github::{Transport, UpstreamResponse};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// Transport that replays one canned reply and records every call
#[derive(Clone)]
pub struct MockTransport {
    status: u16,
    body: String,
    calls: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
}

impl MockTransport {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        MockTransport {
            status,
            body: body.into(),
            calls: Arc::new(AtomicUsize::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_repos(repos: Vec<Value>) -> Self {
        MockTransport::new(200, Value::Array(repos).to_string())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &Url, headers: &[(&'static str, String)]) -> Result<UpstreamResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            url.to_string(),
            headers.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        ));

        Ok(UpstreamResponse {
            status: self.status,
            body: self.body.clone(),
        })
    }
}

/// Upstream repository object with the fields the feed reads
pub fn repo_json(id: u64, name: &str, updated_at: &str, topics: &[&str]) -> Value {
    json!({
        "id": id,
        "name": name,
        "full_name": format!("octo/{}", name),
        "description": format!("{} description", name),
        "language": "Rust",
        "topics": topics,
        "stargazers_count": 0,
        "forks_count": 0,
        "updated_at": updated_at,
        "fork": false,
        "archived": false,
        "html_url": format!("https://github.com/octo/{}", name),
        "homepage": null
    })
}

/// Serve a fixed reply on `path` from a local port. Returns the base URL.
pub async fn spawn_stub(path: &str, status: StatusCode, body: String) -> String {
    let app = Router::new().route(
        path,
        get(move || {
            let body = body.clone();
            async move { (status, [("content-type", "application/json")], body) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Serve a router from a local port. Returns the base URL.
pub async fn spawn_router(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}
