// src/crawl/mod.rs
// =============================================================================
// This module handles crawling: walking a link graph from a start address.
//
// Features:
// - Parallel fetching, one tokio task per discovered address
// - Every address fetched at most once, even when many pages link to it
// - Configurable depth limit (and optional concurrency limit)
// - Returns only when every task it started has finished
//
// Submodules:
// - visited: The shared "already seen" set with its atomic claim
// - tracker: Counts live tasks so we know when the crawl is done
// - sink: Where fetched pages and failures are reported
// - scheduler: The Crawler that ties it all together
// =============================================================================

mod scheduler;
mod sink;
mod tracker;
mod visited;

// Re-export the public crawling API
pub use scheduler::{CrawlOptions, CrawlSummary, Crawler};
pub use sink::{CollectingSink, CrawlEvent, ResultSink};
