use clap::Parser;
use colored::*;
use portfolio_repo_feed::cli::{Cli, Command, ServeArgs, ShowArgs};
use portfolio_repo_feed::feed::FeedProvider;
use portfolio_repo_feed::github::GitHubClient;
use portfolio_repo_feed::models::{FeedPolicy, ForkPolicy};
use portfolio_repo_feed::server::{start_server, AppState};
use portfolio_repo_feed::source::EndpointSource;
use portfolio_repo_feed::theme::DisplayPreference;
use portfolio_repo_feed::view::{self, FeedState, FeedView, ViewConfig};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Show(args) => show(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    println!("{}", "Portfolio Repository Feed".bold().green());
    println!("{}\n", "=".repeat(50).dimmed());

    let policy = FeedPolicy {
        sort: args.sort,
        forks: ForkPolicy::from_exclude_flag(args.exclude_forks),
    };
    let client = GitHubClient::new(
        &args.github_api_url,
        Duration::from_secs(args.upstream_timeout_secs),
    )?;
    let provider = FeedProvider::new(client, policy).require_credential(args.require_github_token);

    if args.github_username.trim().is_empty() {
        println!("{}", "GITHUB_USERNAME is not set; the feed will answer with an error".yellow());
    }
    if args.github_token.is_none() {
        println!("{}", "No GITHUB_TOKEN configured, calling GitHub unauthenticated".yellow());
    }

    info!(
        owner = %args.github_username,
        sort = %policy.sort,
        exclude_forks = args.exclude_forks,
        "Starting repository feed server"
    );

    let state = AppState::new(provider, args.github_username, args.github_token)
        .require_credential(args.require_github_token);
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;

    println!("Press Ctrl+C to stop the server\n");
    start_server(state, addr).await?;

    println!("✅ Server stopped");
    Ok(())
}

async fn show(args: ShowArgs) -> anyhow::Result<()> {
    let source = EndpointSource::new(&args.endpoint)?;
    let config = ViewConfig {
        page_size: args.page_size.max(1),
        preference: DisplayPreference::new(args.theme),
        preview_template: args.screenshot_template,
    };
    let feed_view = Mutex::new(FeedView::new(config));

    println!("{}", "Loading repositories...".dimmed());
    view::load(&feed_view, &source).await;

    if args.retry && matches!(feed_view.lock().await.state(), FeedState::Failed(_)) {
        println!("{}", "Trying again...".yellow());
        view::retry(&feed_view, &source).await;
    }

    let mut feed_view = feed_view.into_inner();
    if let Some(message) = view::failure_message(feed_view.state()) {
        println!("{}", message.red());
        anyhow::bail!(message.to_string());
    }

    if let Some(category) = &args.category {
        if !feed_view.select_category(category) {
            println!("{}", format!("No repositories tagged '{}'", category).yellow());
        }
    }
    if args.all && feed_view.has_more() {
        feed_view.toggle_show_more();
    }

    let tabs: Vec<String> = feed_view
        .categories()
        .iter()
        .map(|c| {
            if Some(c.as_str()) == feed_view.active_category() {
                format!("[{}]", c).bold().to_string()
            } else {
                c.clone()
            }
        })
        .collect();
    println!("{}\n", tabs.join("  "));

    let cards = feed_view.cards();
    if cards.is_empty() {
        println!("{}", "No repositories to show".dimmed());
    }
    for card in &cards {
        println!("{}\n", card.render_text(args.system_dark));
    }

    let total = feed_view.filtered().len();
    if feed_view.has_more() {
        let hint = if cards.len() < total { "--all to show more" } else { "showing all" };
        println!("{}", format!("{} of {} repositories ({})", cards.len(), total, hint).dimmed());
    }

    Ok(())
}
