use crate::error::USER_FAILURE_MESSAGE;
use crate::feed::FeedProvider;
use crate::github::{HttpTransport, Transport};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const REPOS_ROUTE: &str = "/api/github-repos";

/// Health check status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub owner_configured: bool,
    pub credential_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Liveness probe response (minimal, just indicates the process is running)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

/// Readiness probe response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of every failed feed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Shared endpoint state. Owner and credential are read once at startup.
pub struct AppState<T: Transport = HttpTransport> {
    pub provider: Arc<FeedProvider<T>>,
    pub owner: String,
    pub credential: Option<String>,
    pub require_credential: bool,
    pub start_time: Instant,
}

impl<T: Transport> Clone for AppState<T> {
    fn clone(&self) -> Self {
        AppState {
            provider: Arc::clone(&self.provider),
            owner: self.owner.clone(),
            credential: self.credential.clone(),
            require_credential: self.require_credential,
            start_time: self.start_time,
        }
    }
}

impl<T: Transport> AppState<T> {
    pub fn new(provider: FeedProvider<T>, owner: String, credential: Option<String>) -> Self {
        AppState {
            provider: Arc::new(provider),
            owner,
            credential: credential.filter(|c| !c.trim().is_empty()),
            require_credential: false,
            start_time: Instant::now(),
        }
    }

    pub fn require_credential(mut self, required: bool) -> Self {
        self.require_credential = required;
        self
    }

    fn owner_configured(&self) -> bool {
        !self.owner.trim().is_empty()
    }

    fn missing_config(&self) -> Option<String> {
        if !self.owner_configured() {
            Some("GITHUB_USERNAME is not set".to_string())
        } else if self.require_credential && self.credential.is_none() {
            Some("GITHUB_TOKEN is required but not set".to_string())
        } else {
            None
        }
    }
}

pub fn create_router<T: Transport + 'static>(state: AppState<T>) -> Router {
    Router::new()
        .route(REPOS_ROUTE, get(list_repos::<T>))
        .route("/health", get(health_check::<T>))
        .route("/healthz", get(health_check::<T>))
        .route("/livez", get(liveness_check))
        .route("/readyz", get(readiness_check::<T>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until ctrl-c
pub async fn start_server<T: Transport + 'static>(
    state: AppState<T>,
    addr: SocketAddr,
) -> std::io::Result<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Repository feed listening on http://{}{}", listener.local_addr()?, REPOS_ROUTE);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Shutting down repository feed server");
        })
        .await?;

    Ok(())
}

/// Upstream listing after filter and sort, passed through in upstream shape.
async fn list_repos<T: Transport + 'static>(State(state): State<AppState<T>>) -> Response {
    match state
        .provider
        .list_raw_sorted(&state.owner, state.credential.as_deref())
        .await
    {
        Ok(repos) => (StatusCode::OK, Json(repos)).into_response(),
        Err(e) => {
            error!(kind = e.kind(), error = %e, "Error in API endpoint fetching GitHub repos");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: USER_FAILURE_MESSAGE.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn health_check<T: Transport + 'static>(State(state): State<AppState<T>>) -> impl IntoResponse {
    let message = state.missing_config();
    let status = if message.is_none() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    // Degraded still answers 200; the feed route reports the failure itself
    (
        StatusCode::OK,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
            owner_configured: state.owner_configured(),
            credential_configured: state.credential.is_some(),
            message,
        }),
    )
}

/// Kubernetes liveness probe - just checks if the process is alive
async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LivenessResponse {
            status: "alive".to_string(),
        }),
    )
}

async fn readiness_check<T: Transport + 'static>(State(state): State<AppState<T>>) -> impl IntoResponse {
    let message = state.missing_config().map(|m| format!("Not ready - {}", m));
    let ready = message.is_none();

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(ReadinessResponse { ready, message }))
}
