//! CurioCrawl CLI
//!
//! Runs one exploration against a start URL and renders the report,
//! recovering partial progress from the checkpoint store if the run aborts.

use anyhow::Context;
use clap::Parser;
use curiocrawl::browser::{BrowserConfig, CdpSession};
use curiocrawl::explorer::{DEFAULT_MAX_STEPS, DEFAULT_MAX_VISITED_URLS};
use curiocrawl::session::BrowseSession;
use curiocrawl::{CheckpointStore, Explorer, ExplorerConfig, Reporter};
use std::path::PathBuf;
use std::sync::Arc;

/// Autonomous exploratory QA crawler
#[derive(Parser, Debug)]
#[command(name = "curiocrawl")]
#[command(author = "CurioCrawl Team <team@curiocrawl.dev>")]
#[command(version)]
#[command(about = "Autonomous exploratory QA crawler")]
struct Args {
    /// URL to start exploring from
    start_url: String,

    /// Stop once more than this many distinct URLs have been visited
    #[arg(long, default_value_t = DEFAULT_MAX_VISITED_URLS)]
    max_visited_urls: usize,

    /// Hard cap on loop steps, a safety net against oscillation
    #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Checkpoint slot for this run (default: a fresh UUID)
    #[arg(long)]
    run_id: Option<String>,

    /// Directory reports are written into
    #[arg(long, default_value = "./reports")]
    report_dir: PathBuf,

    /// Run the browser with a visible window
    #[arg(long)]
    headed: bool,

    /// Path to Chrome/Chromium executable
    #[arg(long)]
    chrome_path: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let run_id = args
        .run_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!(start_url = %args.start_url, run_id = %run_id, "starting exploration");

    let mut builder = BrowserConfig::builder().headless(!args.headed);
    if let Some(path) = args.chrome_path.clone() {
        builder = builder.chrome_path(path);
    }

    let mut session = CdpSession::initialize(&args.start_url, builder.build())
        .await
        .context("failed to initialize browse session")?;

    // Redirects may land elsewhere; the run starts wherever the browser did
    let start_url = session.current_url().await;

    let mut config = ExplorerConfig::new(start_url, run_id.clone());
    config.max_visited_urls = args.max_visited_urls;
    config.max_steps = args.max_steps;

    let checkpoints = Arc::new(CheckpointStore::new());
    let mut explorer = Explorer::new(session, config, checkpoints.clone());

    let final_state = match explorer.run().await {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(error = %e, "run aborted, recovering last checkpoint");
            checkpoints
                .latest_snapshot(&run_id)
                .unwrap_or_else(|| explorer.state().clone())
        }
    };

    // The session is released on every exit path, report errors included
    if let Err(e) = explorer.shutdown().await {
        tracing::warn!(error = %e, "browser shutdown failed");
    }

    let reporter = Reporter::new(&args.report_dir)?;
    let paths = reporter.generate(&final_state)?;

    tracing::info!(
        visited = final_state.visited_urls.len(),
        actions = final_state.total_actions(),
        errors = final_state.errors.len(),
        json = %paths.json.display(),
        html = %paths.html.display(),
        "exploration complete"
    );

    Ok(())
}
