// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Every tuning flag can also come from the environment, e.g.
//   LINK_CRAWLER_MAX_DEPTH=3 link-crawler crawl https://example.com
// An explicit flag always wins over the environment variable.
// =============================================================================

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "link-crawler",
    version,
    about = "Crawl a website concurrently, fetching every reachable page exactly once",
    long_about = "link-crawler starts from one URL and follows links up to a maximum depth. \
                  Pages are fetched in parallel, no page is fetched twice, and the crawl \
                  finishes once every reachable page within the depth limit is done."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Crawl a real website over HTTP
    ///
    /// Example: link-crawler crawl https://example.com --max-depth 3
    Crawl {
        /// URL to start crawling from
        start_url: String,

        /// Per-request timeout in seconds
        #[arg(long, env = "LINK_CRAWLER_TIMEOUT_SECS", default_value_t = 10)]
        timeout_secs: u64,

        /// Only follow links on the start URL's domain
        #[arg(long, env = "LINK_CRAWLER_SAME_DOMAIN")]
        same_domain: bool,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Crawl a small built-in copy of golang.org (no network needed)
    ///
    /// Example: link-crawler demo --max-depth 4
    Demo {
        #[command(flatten)]
        run: RunArgs,
    },
}

// Flags shared by both subcommands
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Maximum crawl depth
    ///
    /// Depth 0 (or less) = fetch nothing
    /// Depth 1 = just the starting page
    /// Depth 2 = starting page + all pages it links to
    /// etc.
    #[arg(
        long,
        env = "LINK_CRAWLER_MAX_DEPTH",
        default_value_t = 2,
        allow_negative_numbers = true
    )]
    pub max_depth: i64,

    /// Maximum number of pages fetched at the same time (0 = no limit)
    #[arg(long, env = "LINK_CRAWLER_CONCURRENCY", default_value_t = 0)]
    pub concurrency: usize,

    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    // 0 on the command line means "no limit"
    pub fn concurrency_limit(&self) -> Option<usize> {
        match self.concurrency {
            0 => None,
            n => Some(n),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_crawl_flags() {
        let cli = Cli::try_parse_from([
            "link-crawler",
            "crawl",
            "https://example.com",
            "--max-depth",
            "3",
            "--concurrency",
            "8",
            "--same-domain",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Crawl {
                start_url,
                same_domain,
                run,
                ..
            } => {
                assert_eq!(start_url, "https://example.com");
                assert!(same_domain);
                assert_eq!(run.max_depth, 3);
                assert_eq!(run.concurrency_limit(), Some(8));
                assert!(run.json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_same_domain_from_environment() {
        std::env::set_var("LINK_CRAWLER_SAME_DOMAIN", "true");
        let parsed = Cli::try_parse_from(["link-crawler", "crawl", "https://example.com"]);
        std::env::remove_var("LINK_CRAWLER_SAME_DOMAIN");

        match parsed.unwrap().command {
            Commands::Crawl { same_domain, .. } => assert!(same_domain),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_negative_depth_is_accepted() {
        let cli = Cli::try_parse_from(["link-crawler", "demo", "--max-depth", "-1"]).unwrap();
        match cli.command {
            Commands::Demo { run } => {
                assert_eq!(run.max_depth, -1);
                assert_eq!(run.concurrency_limit(), None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
