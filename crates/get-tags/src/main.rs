//! get-tags
//!
//! Prints one `YYYY/MM/DD<sep>tag` row per tag of a GitHub repository,
//! newest first, stopping at the first tag last modified before 2024.

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use snapshot_core::tags::{
    collect_tag_rows, format_rows, GitHubClient, TagSource, CUTOFF_YEAR, DEFAULT_PROJECT,
    GITHUB_API_URL,
};
use snapshot_core::telemetry::{init_tracing, level_for};

#[derive(Parser)]
#[command(name = "get-tags")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "List the tags of a GitHub repository with their commit dates", long_about = None)]
struct Cli {
    /// GitHub token (unauthenticated requests are heavily rate limited)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Repository as <owner>/<repo>
    #[arg(long, default_value = DEFAULT_PROJECT)]
    project: String,

    /// GitHub REST API root (for GitHub Enterprise)
    #[arg(long, env = "GITHUB_API_URL", default_value = GITHUB_API_URL)]
    api_url: String,

    /// Column separator
    #[arg(long, default_value = ",")]
    separator: String,

    /// Print a "date<sep>tag" header line first
    #[arg(long)]
    show_header: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(false, level_for(cli.verbose));

    let client = GitHubClient::new(&cli.project, cli.token)
        .with_context(|| format!("Failed to create GitHub client for {}", cli.project))?
        .with_api_url(&cli.api_url);
    info!(project = %client.project(), api_url = %cli.api_url, "listing tags");

    for line in list_tags(&client, &cli.separator, cli.show_header).await? {
        println!("{}", line);
    }
    Ok(())
}

async fn list_tags<S: TagSource>(source: &S, separator: &str, show_header: bool) -> Result<Vec<String>> {
    let rows = collect_tag_rows(source, CUTOFF_YEAR)
        .await
        .context("Failed to list tags")?;
    info!(count = rows.len(), "collected tags");
    Ok(format_rows(&rows, separator, show_header))
}
