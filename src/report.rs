// src/report.rs
// =============================================================================
// Turns crawl results into something a human (or a script) can read.
//
// Two formats:
// - Text: one line per event while crawling, then a table and a summary
// - JSON: a single document with every event and the summary, for CI/scripts
//
// Everything goes to stdout. Logs go to stderr, so `--json | jq` just works.
// =============================================================================

use anyhow::Result;
use serde::Serialize;

use crate::crawl::{CrawlEvent, CrawlSummary};

// How many characters of page content to show in text output
const PREVIEW_CHARS: usize = 60;

#[derive(Serialize)]
struct JsonReport<'a> {
    events: &'a [CrawlEvent],
    summary: &'a CrawlSummary,
}

// Prints a single event as soon as it arrives (text mode)
//
// Mirrors the classic crawler output:
//   found: http://golang.org/ "The Go Programming Language"
//   failed: http://golang.org/cmd/: not found: http://golang.org/cmd/
pub fn print_event(event: &CrawlEvent) {
    match event {
        CrawlEvent::Fetched { url, content, .. } => {
            println!("found: {} {:?}", url, preview(content, PREVIEW_CHARS));
        }
        CrawlEvent::Failed { url, reason, .. } => {
            println!("failed: {}: {}", url, reason);
        }
    }
}

// Prints the final report, either as a table or JSON
pub fn print_results(events: &[CrawlEvent], summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        let json_output = serde_json::to_string_pretty(&JsonReport { events, summary })?;
        println!("{}", json_output);
    } else {
        print_table(events, summary);
    }
    Ok(())
}

fn print_table(events: &[CrawlEvent], summary: &CrawlSummary) {
    println!();
    println!("{:<60} {:<10} {:<30}", "URL", "STATUS", "DETAIL");
    println!("{}", "=".repeat(100));

    for event in events {
        let (status, detail) = match event {
            CrawlEvent::Fetched { content, .. } => ("✅ OK", format!("{} bytes", content.len())),
            CrawlEvent::Failed { reason, .. } => ("❌ FAILED", reason.clone()),
        };
        println!("{:<60} {:<10} {:<30}", preview(event.url(), 57), status, detail);
    }

    println!();
    println!("📊 Summary:");
    println!("   ✅ Fetched: {}", summary.fetched);
    println!("   ❌ Failed: {}", summary.failed);
    println!("   🔁 Already visited: {}", summary.already_claimed);
    println!("   📏 Beyond max depth: {}", summary.depth_exhausted);
    if summary.cancelled > 0 {
        println!("   🛑 Cancelled: {}", summary.cancelled);
    }
    println!("   📋 Total tasks: {}", summary.tasks);
}

// Shortens text for display, appending "..." when it was cut.
// Counts chars, not bytes, so multi-byte characters are never split.
fn preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.chars().count() > max_chars || first_line.len() < text.trim_end().len() {
        let short: String = first_line.chars().take(max_chars).collect();
        format!("{}...", short)
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_is_unchanged() {
        assert_eq!(preview("Package fmt", 60), "Package fmt");
    }

    #[test]
    fn test_preview_truncates_long_text() {
        assert_eq!(preview("abcdefghij", 4), "abcd...");
    }

    #[test]
    fn test_preview_uses_first_line_only() {
        assert_eq!(preview("<html>\n<body>", 60), "<html>...");
    }

    #[test]
    fn test_preview_does_not_split_multibyte_chars() {
        assert_eq!(preview("ééééé", 2), "éé...");
    }

    #[test]
    fn test_json_report_shape() {
        let events = vec![CrawlEvent::Fetched {
            url: "http://golang.org/".to_string(),
            depth: 4,
            content: "The Go Programming Language".to_string(),
        }];
        let summary = CrawlSummary {
            tasks: 1,
            fetched: 1,
            ..Default::default()
        };

        let value = serde_json::to_value(JsonReport {
            events: &events,
            summary: &summary,
        })
        .unwrap();

        assert_eq!(value["events"][0]["event"], "fetched");
        assert_eq!(value["summary"]["fetched"], 1);
    }
}
