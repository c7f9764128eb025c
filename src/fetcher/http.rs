// src/fetcher/http.rs
// =============================================================================
// This module fetches real pages over HTTP.
//
// Key functionality:
// - One shared reqwest Client (connection pooling across all crawl tasks)
// - Per-request timeout so a slow server can't stall a task forever
// - Non-2xx responses count as failed fetches
// - Links are pulled out of the HTML body (see links.rs)
//
// Rust concepts:
// - async/await: For concurrent network I/O
// - Result<T, E> and ?: Errors flow up as FetchError
// - Builder pattern: Client::builder()...build()
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::links::extract_links;
use super::{FetchError, Fetcher, Page};

/// User agent sent with every request, e.g. "link-crawler/0.1.0"
pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: Client,
    // When set, links to other domains are dropped before they reach the crawler
    only_domain: Option<String>,
}

impl HttpFetcher {
    // Creates a fetcher with the given per-request timeout
    //
    // Building the client can fail (e.g. the TLS backend can't initialise),
    // so this returns a Result instead of panicking.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5)) // Follow up to 5 redirects
            .user_agent(APP_USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            only_domain: None,
        })
    }

    // Restricts discovered links to a single domain
    pub fn same_domain_as(mut self, domain: impl Into<String>) -> Self {
        self.only_domain = Some(domain.into());
        self
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[tracing::instrument(level = "debug", skip(self))]
    async fn fetch(&self, address: &str) -> Result<Page, FetchError> {
        let response = self
            .client
            .get(address)
            .send()
            .await
            .map_err(|e| categorize_error(address, e))?;

        let status = response.status();
        tracing::trace!(%status, "response received");

        if status == reqwest::StatusCode::NOT_FOUND || status == reqwest::StatusCode::GONE {
            return Err(FetchError::NotFound(address.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status,
                address: address.to_string(),
            });
        }

        // Relative links resolve against where we actually ended up,
        // which differs from `address` after a redirect
        let final_url = response.url().to_string();

        let content = response
            .text()
            .await
            .map_err(|e| categorize_error(address, e))?;

        let links = extract_links(&content, &final_url, self.only_domain.as_deref());
        tracing::debug!(links = links.len(), "extracted links");

        Ok(Page { content, links })
    }
}

// Timeouts get their own variant so they read clearly in reports;
// everything else is passed through as a request error
fn categorize_error(address: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout(address.to_string())
    } else {
        FetchError::Request(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_names_the_crate() {
        assert!(APP_USER_AGENT.starts_with("link-crawler/"));
    }

    #[test]
    fn test_same_domain_builder() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1))
            .unwrap()
            .same_domain_as("example.com");
        assert_eq!(fetcher.only_domain.as_deref(), Some("example.com"));
    }

    #[tokio::test]
    async fn test_missing_and_gone_pages_are_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _missing = server
            .mock("GET", "/missing")
            .with_status(404)
            .create_async()
            .await;
        let _gone = server.mock("GET", "/gone").with_status(410).create_async().await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        for path in ["/missing", "/gone"] {
            let address = format!("{}{}", server.url(), path);
            let err = fetcher.fetch(&address).await.unwrap_err();
            assert!(
                matches!(err, FetchError::NotFound(ref a) if a == &address),
                "unexpected error for {}: {:?}",
                path,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_server_error_keeps_its_status() {
        let mut server = mockito::Server::new_async().await;
        let _broken = server
            .mock("GET", "/broken")
            .with_status(500)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let err = fetcher
            .fetch(&format!("{}/broken", server.url()))
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, .. } => {
                assert_eq!(status, reqwest::StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("expected a status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_links_resolve_against_redirect_target_in_document_order() {
        let mut server = mockito::Server::new_async().await;
        let _old = server
            .mock("GET", "/old")
            .with_status(301)
            .with_header("location", "/sub/")
            .create_async()
            .await;
        let _sub = server
            .mock("GET", "/sub/")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body(r#"<a href="x">X</a> <a href="/top">Top</a> <a href="y">Y</a>"#)
            .create_async()
            .await;

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let page = fetcher
            .fetch(&format!("{}/old", server.url()))
            .await
            .unwrap();

        let base = server.url();
        assert_eq!(
            page.links,
            vec![
                format!("{}/sub/x", base),
                format!("{}/top", base),
                format!("{}/sub/y", base),
            ]
        );
        assert!(page.content.contains("href=\"x\""));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_a_fetch_error() {
        // Port 9 on localhost: nothing listens there, so the connection is refused
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:9/").await;
        assert!(result.is_err());
    }
}
