// src/fetcher/links.rs
// =============================================================================
// This module extracts links from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
//
// We also use the `url` crate to:
// - Resolve relative links ("/docs", "../about") against the page URL
// - Read the domain of a link for the optional same-domain restriction
//
// Links come back in document order. Duplicates are NOT removed here: the
// crawler's visited set already guarantees each address is fetched once.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// Extracts all crawlable links from HTML content
//
// Parameters:
//   html: the HTML content to parse
//   page_url: the URL of the page (for resolving relative links)
//   only_domain: if set, links on any other domain are dropped
//
// Returns: absolute http(s) URLs, in the order they appear
//
// Example:
//   html = "<a href='/docs'>Docs</a>"
//   page_url = "https://example.com"
//   result = ["https://example.com/docs"]
pub fn extract_links(html: &str, page_url: &str, only_domain: Option<&str>) -> Vec<String> {
    let mut links = Vec::new();

    let base = match Url::parse(page_url) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!(page_url, error = %e, "cannot resolve links against invalid page URL");
            return links;
        }
    };

    let document = Html::parse_document(html);

    // Constant selector, known to be valid
    let selector = Selector::parse("a[href]").unwrap();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(absolute) = resolve_link(&base, href) else {
            continue;
        };

        if !matches!(absolute.scheme(), "http" | "https") {
            continue;
        }

        if let Some(domain) = only_domain {
            if absolute.domain() != Some(domain) {
                continue;
            }
        }

        links.push(absolute.to_string());
    }

    links
}

// Resolves a link (possibly relative) to an absolute URL
//
// Anchors on the same page and non-navigational schemes are skipped.
// Url::join handles both cases: an absolute href replaces the base entirely.
fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("javascript:")
    {
        return None;
    }

    base.join(href).ok()
}
