// src/fetcher/mod.rs
// =============================================================================
// This module defines how the crawler gets pages.
//
// The crawler core never talks to the network directly. It only knows about
// the `Fetcher` trait: "give me an address, I give you back the page content
// and the links found on it (or an error)".
//
// Submodules:
// - http: The real thing, fetches pages over HTTP with reqwest
// - links: Extracts <a href> links from HTML
// - fake: An in-memory link graph, used by the `demo` command and tests
//
// Rust concepts:
// - Traits: Shared behaviour that different types can implement
// - async-trait: Async methods on traits that can be used as `dyn Fetcher`
// - thiserror: Derive std::error::Error for our own error enum
// =============================================================================

mod fake;
mod http;
mod links;

use async_trait::async_trait;
use thiserror::Error;

pub use fake::FakeFetcher;
pub use http::HttpFetcher;

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// The body of the page
    pub content: String,
    /// Outbound links, in the order they appear on the page
    pub links: Vec<String>,
}

/// Why a fetch did not produce a page.
///
/// The crawler treats every variant the same way: the address is reported
/// as failed and its subtree is not explored.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} for {address}")]
    Status {
        status: reqwest::StatusCode,
        address: String,
    },

    #[error("timed out fetching {0}")]
    Timeout(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

// Anything that can turn an address into a page
//
// Send + Sync because a single fetcher is shared (through an Arc) by every
// crawl task, and those tasks run on many threads at once.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, address: &str) -> Result<Page, FetchError>;
}
