// src/crawl/sink.rs
// =============================================================================
// Where crawl results go.
//
// Every claimed address ends in exactly one event:
// - Fetched: the page came back, here is its content
// - Failed: the fetcher gave up on it, here is why
//
// The crawler doesn't care what happens to events next. Callers pick a sink:
// - CollectingSink: keep everything in memory (tests, JSON output)
// - an mpsc::UnboundedSender: stream events to another task as they happen
//
// Events from different tasks arrive in no particular order.
// =============================================================================

use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CrawlEvent {
    Fetched {
        url: String,
        /// Remaining depth budget when this page was fetched
        depth: i64,
        content: String,
    },
    Failed {
        url: String,
        depth: i64,
        reason: String,
    },
}

impl CrawlEvent {
    pub fn url(&self) -> &str {
        match self {
            CrawlEvent::Fetched { url, .. } | CrawlEvent::Failed { url, .. } => url,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CrawlEvent::Failed { .. })
    }
}

/// Receives crawl events. Called concurrently from many tasks.
pub trait ResultSink: Send + Sync {
    fn emit(&self, event: CrawlEvent);
}

// Streams events to whoever holds the receiver.
// If the receiver is gone nobody is listening, so the event is dropped.
impl ResultSink for mpsc::UnboundedSender<CrawlEvent> {
    fn emit(&self, event: CrawlEvent) {
        if self.send(event).is_err() {
            tracing::debug!("result receiver dropped, discarding event");
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingSink {
    events: Mutex<Vec<CrawlEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CrawlEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn into_events(self) -> Vec<CrawlEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ResultSink for CollectingSink {
    fn emit(&self, event: CrawlEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
