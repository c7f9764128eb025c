// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Set up logging (tracing, filtered by RUST_LOG, written to stderr)
// 2. Parse command-line arguments using clap
// 3. Build a fetcher (real HTTP, or the built-in demo graph)
// 4. Run the crawl, printing pages as they are found
// 5. Exit with proper code (0 = all pages fetched, 1 = some failed, 2 = error)
//
// Rust concepts used:
// - async/await: The crawl runs many fetches concurrently
// - Arc<dyn Trait>: One fetcher/sink shared by every crawl task
// - Result<T, E>: For error handling
// =============================================================================

mod cli; // src/cli.rs - command-line parsing
mod crawl; // src/crawl/ - the concurrent crawler
mod fetcher; // src/fetcher/ - getting pages (HTTP or in-memory)
mod report; // src/report.rs - printing results

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

use cli::{Cli, Commands, RunArgs};
use crawl::{CollectingSink, CrawlEvent, CrawlOptions, Crawler};
use fetcher::{FakeFetcher, Fetcher, HttpFetcher};

// Where the `demo` subcommand starts
const DEMO_START_URL: &str = "http://golang.org/";

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    init_tracing()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Crawl {
            start_url,
            timeout_secs,
            same_domain,
            run,
        } => handle_crawl(&start_url, timeout_secs, same_domain, &run).await,
        Commands::Demo { run } => handle_demo(&run).await,
    }
}

// Logs go to stderr so stdout only carries results (important for --json)
fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("link_crawler=info,warn"))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

// Handles the 'crawl' subcommand
async fn handle_crawl(
    start_url: &str,
    timeout_secs: u64,
    same_domain: bool,
    run: &RunArgs,
) -> Result<i32> {
    // Reject garbage up front instead of reporting it as one failed fetch
    let start = Url::parse(start_url).with_context(|| format!("Invalid URL '{}'", start_url))?;

    let mut fetcher = HttpFetcher::new(Duration::from_secs(timeout_secs))
        .context("Failed to create HTTP client")?;

    if same_domain {
        let domain = start
            .domain()
            .ok_or_else(|| anyhow!("URL has no domain: {}", start_url))?;
        fetcher = fetcher.same_domain_as(domain);
    }

    if !run.json {
        println!("🔍 Crawling website: {}", start_url);
        println!("📊 Max crawl depth: {}", run.max_depth);
    }

    execute(Arc::new(fetcher), start_url, run).await
}

// Handles the 'demo' subcommand
async fn handle_demo(run: &RunArgs) -> Result<i32> {
    if !run.json {
        println!("🔍 Crawling built-in demo site: {}", DEMO_START_URL);
        println!("📊 Max crawl depth: {}", run.max_depth);
    }

    execute(Arc::new(FakeFetcher::golang_demo()), DEMO_START_URL, run).await
}

// Runs one crawl and prints the results
//
// Text mode streams events through a channel so pages show up while the
// crawl is still running. JSON mode collects everything and prints once.
async fn execute(fetcher: Arc<dyn Fetcher>, start: &str, run: &RunArgs) -> Result<i32> {
    let crawler = Crawler::new(
        fetcher,
        CrawlOptions {
            concurrency: run.concurrency_limit(),
        },
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let (events, summary) = if run.json {
        let sink = Arc::new(CollectingSink::new());
        let summary = crawler
            .crawl_until_cancelled(start, run.max_depth, sink.clone(), cancel)
            .await;
        (sink.events(), summary)
    } else {
        let (tx, mut rx) = mpsc::unbounded_channel::<CrawlEvent>();

        // The printer stops once the crawl drops its last sender
        let printer = tokio::spawn(async move {
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                report::print_event(&event);
                events.push(event);
            }
            events
        });

        let summary = crawler
            .crawl_until_cancelled(start, run.max_depth, Arc::new(tx), cancel)
            .await;
        (printer.await?, summary)
    };

    report::print_results(&events, &summary, run.json)?;

    let failed_count = events.iter().filter(|e| e.is_failure()).count();
    if failed_count > 0 {
        Ok(1) // Exit code 1 = some pages could not be fetched
    } else {
        Ok(0) // Exit code 0 = all good
    }
}

// First Ctrl-C stops the crawl gracefully: running tasks wind down and we
// still print whatever was found
fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, stopping crawl");
            cancel.cancel();
        }
    });
}
