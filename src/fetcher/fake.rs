// src/fetcher/fake.rs
// =============================================================================
// An in-memory Fetcher that serves a fixed link graph.
//
// Used for:
// - The `demo` subcommand (crawls a small copy of golang.org)
// - Tests: every page and every link is known in advance, and the fetcher
//   counts how many times each address was requested
//
// Unknown addresses fail with FetchError::NotFound, exactly like a dead link.
// =============================================================================

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{FetchError, Fetcher, Page};

#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, Page>,
    // Simulated network latency, so tasks really overlap in tests
    latency: Option<Duration>,
    calls: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    // Adds a page with its body and outbound links
    pub fn page(mut self, address: &str, content: &str, links: &[&str]) -> Self {
        self.pages.insert(
            address.to_string(),
            Page {
                content: content.to_string(),
                links: links.iter().map(|l| l.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    // A tiny snapshot of golang.org: four pages that link back and forth,
    // plus a link to /cmd/ that has no page behind it
    pub fn golang_demo() -> Self {
        Self::new()
            .page(
                "http://golang.org/",
                "The Go Programming Language",
                &["http://golang.org/pkg/", "http://golang.org/cmd/"],
            )
            .page(
                "http://golang.org/pkg/",
                "Packages",
                &[
                    "http://golang.org/",
                    "http://golang.org/cmd/",
                    "http://golang.org/pkg/fmt/",
                    "http://golang.org/pkg/os/",
                ],
            )
            .page(
                "http://golang.org/pkg/fmt/",
                "Package fmt",
                &["http://golang.org/", "http://golang.org/pkg/"],
            )
            .page(
                "http://golang.org/pkg/os/",
                "Package os",
                &["http://golang.org/", "http://golang.org/pkg/"],
            )
    }

    /// How many times `address` has been fetched so far
    pub fn calls_for(&self, address: &str) -> usize {
        self.calls_snapshot().get(address).copied().unwrap_or(0)
    }

    /// Total number of fetch calls across all addresses
    pub fn total_calls(&self) -> usize {
        self.calls_snapshot().values().sum()
    }

    pub fn calls_snapshot(&self) -> HashMap<String, usize> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, address: &str) -> Result<Page, FetchError> {
        // Count first, so failed fetches are counted too
        *self
            .calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entry(address.to_string())
            .or_insert(0) += 1;

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.pages
            .get(address)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(address.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_known_page_is_served() {
        let fetcher = FakeFetcher::golang_demo();
        let page = fetcher.fetch("http://golang.org/pkg/fmt/").await.unwrap();
        assert_eq!(page.content, "Package fmt");
        assert_eq!(page.links, vec!["http://golang.org/", "http://golang.org/pkg/"]);
    }

    #[tokio::test]
    async fn test_unknown_page_is_not_found() {
        let fetcher = FakeFetcher::golang_demo();
        let err = fetcher.fetch("http://golang.org/cmd/").await.unwrap_err();
        assert!(matches!(err, FetchError::NotFound(ref a) if a == "http://golang.org/cmd/"));
        assert_eq!(err.to_string(), "not found: http://golang.org/cmd/");
    }

    #[tokio::test]
    async fn test_calls_are_counted() {
        let fetcher = FakeFetcher::new().page("a", "A", &[]);
        let _ = fetcher.fetch("a").await;
        let _ = fetcher.fetch("a").await;
        let _ = fetcher.fetch("missing").await;
        assert_eq!(fetcher.calls_for("a"), 2);
        assert_eq!(fetcher.calls_for("missing"), 1);
        assert_eq!(fetcher.total_calls(), 3);
    }
}
