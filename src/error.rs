use thiserror::Error;

/// Message shown to end users for every feed failure.
pub const USER_FAILURE_MESSAGE: &str = "Failed to fetch repositories";

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Upstream responded with status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl FeedError {
    /// Every error kind collapses to the same user-facing text; the detail is for logs.
    pub fn user_message(&self) -> &'static str {
        USER_FAILURE_MESSAGE
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FeedError::Configuration(_) => "configuration",
            FeedError::Transport(_) => "transport",
            FeedError::Upstream { .. } => "upstream",
            FeedError::MalformedResponse(_) => "malformed_response",
        }
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
