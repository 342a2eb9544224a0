use crate::models::SortOrder;
use crate::theme::Theme;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "portfolio-repo-feed")]
#[command(about = "Portfolio repository feed - Serves and renders a GitHub account's project list")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the /api/github-repos endpoint
    Serve(ServeArgs),
    /// Fetch the feed from the endpoint and print the project cards
    Show(ShowArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// GitHub account whose repositories are listed
    #[arg(long, env = "GITHUB_USERNAME", default_value = "")]
    pub github_username: String,

    /// GitHub token, kept server-side
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    /// Refuse to call GitHub without a token
    #[arg(long, env = "REQUIRE_GITHUB_TOKEN", default_value_t = false)]
    pub require_github_token: bool,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api_url: String,

    /// Feed order: updated or popularity
    #[arg(long, env = "FEED_SORT", default_value = "updated")]
    pub sort: SortOrder,

    /// Drop forked repositories instead of flagging them
    #[arg(long, env = "EXCLUDE_FORKS", default_value_t = false)]
    pub exclude_forks: bool,

    /// Upstream request timeout in seconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
    pub upstream_timeout_secs: u64,

    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
}

#[derive(Args)]
pub struct ShowArgs {
    /// First-party feed endpoint
    #[arg(long, env = "FEED_ENDPOINT", default_value = "http://localhost:3000/api/github-repos")]
    pub endpoint: String,

    /// Only show repositories tagged with this topic
    #[arg(long)]
    pub category: Option<String>,

    /// Expand past the first page
    #[arg(long)]
    pub all: bool,

    /// Cards per page
    #[arg(long, default_value_t = 6)]
    pub page_size: usize,

    /// light, dark or system
    #[arg(long, env = "THEME", default_value = "system")]
    pub theme: Theme,

    /// Screenshot service URL with a {url} placeholder for the demo link
    #[arg(long, env = "SCREENSHOT_TEMPLATE")]
    pub screenshot_template: Option<String>,

    /// Resolve the system theme to dark
    #[arg(long, env = "SYSTEM_PREFERS_DARK", default_value_t = false)]
    pub system_dark: bool,

    /// Retry once after a failed load
    #[arg(long)]
    pub retry: bool,
}
