// src/crawl/scheduler.rs
// =============================================================================
// This module drives the crawl itself.
//
// How it works:
// 1. The start address becomes the first crawl task, with the full depth budget
// 2. Each task:
//    - stops if its depth budget is used up
//    - stops if another task already claimed its address
//    - otherwise fetches the page, reports it, and spawns one child task per
//      link with one less unit of depth
// 3. crawl() returns once every task, transitively, has finished
//
// Every task runs on its own tokio task, so fetches happen in parallel. The
// visited set makes sure no address is fetched twice, and the completion
// tracker tells us when the last task is done.
//
// Optional extras:
// - A concurrency limit (a Semaphore held only while fetching)
// - A CancellationToken, checked before claiming, before fetching, and while
//   a fetch is in flight
//
// Rust concepts:
// - Arc: Shared ownership of the traversal state across many tasks
// - tokio::spawn: Run a future on the runtime's thread pool
// - BoxFuture: A task that spawns copies of itself needs a concrete future type
// - tokio::select!: Race a fetch against cancellation
// - catch_unwind: A fetcher panic becomes a failure event, not a lost page
// =============================================================================

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::sink::{CrawlEvent, ResultSink};
use super::tracker::{CompletionTracker, TaskGuard};
use super::visited::VisitedSet;
use crate::fetcher::Fetcher;

#[derive(Debug, Clone, Default)]
pub struct CrawlOptions {
    /// Maximum number of fetches in flight at once. None = no limit.
    pub concurrency: Option<usize>,
}

/// How a single crawl task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// No depth budget left, nothing fetched
    DepthExhausted,
    /// Another task claimed this address first
    AlreadyClaimed,
    /// The traversal was cancelled before this task could finish its fetch
    Cancelled,
    /// Page fetched, one child task spawned per link
    Fetched { links: usize },
    /// The fetcher returned an error; not retried
    FetchFailed,
}

/// Per-outcome task counts for one traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub tasks: usize,
    pub fetched: usize,
    pub failed: usize,
    pub already_claimed: usize,
    pub depth_exhausted: usize,
    pub cancelled: usize,
}

impl CrawlSummary {
    fn record(&mut self, outcome: TaskOutcome) {
        self.tasks += 1;
        match outcome {
            TaskOutcome::DepthExhausted => self.depth_exhausted += 1,
            TaskOutcome::AlreadyClaimed => self.already_claimed += 1,
            TaskOutcome::Cancelled => self.cancelled += 1,
            TaskOutcome::Fetched { .. } => self.fetched += 1,
            TaskOutcome::FetchFailed => self.failed += 1,
        }
    }
}

// One unit of work: an address plus how many more hops we may take
#[derive(Debug)]
struct CrawlTask {
    address: String,
    depth: i64,
}

// Everything the tasks of ONE traversal share.
// A fresh Traversal is built for every crawl() call.
struct Traversal {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ResultSink>,
    visited: VisitedSet,
    tracker: CompletionTracker,
    limiter: Option<Semaphore>,
    cancel: CancellationToken,
    summary: Mutex<CrawlSummary>,
}

impl Traversal {
    fn record(&self, outcome: TaskOutcome) {
        self.summary
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record(outcome);
    }

    fn summary(&self) -> CrawlSummary {
        self.summary
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    options: CrawlOptions,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, options: CrawlOptions) -> Self {
        Self { fetcher, options }
    }

    // Crawls everything reachable from `start` within `max_depth` hops
    //
    // Parameters:
    //   start: the first address to fetch
    //   max_depth: 0 (or less) fetches nothing, 1 fetches only `start`,
    //              2 also fetches the pages `start` links to, etc.
    //   sink: receives one event per fetched or failed address
    //
    // Returns once the whole traversal has settled.
    pub async fn crawl(
        &self,
        start: &str,
        max_depth: i64,
        sink: Arc<dyn ResultSink>,
    ) -> CrawlSummary {
        self.crawl_until_cancelled(start, max_depth, sink, CancellationToken::new())
            .await
    }

    // Same as crawl(), but stops early once `cancel` fires
    //
    // Tasks that are already running notice the cancellation and finish
    // without fetching; this still waits for all of them before returning.
    #[tracing::instrument(skip(self, sink, cancel))]
    pub async fn crawl_until_cancelled(
        &self,
        start: &str,
        max_depth: i64,
        sink: Arc<dyn ResultSink>,
        cancel: CancellationToken,
    ) -> CrawlSummary {
        let traversal = Arc::new(Traversal {
            fetcher: Arc::clone(&self.fetcher),
            sink,
            visited: VisitedSet::new(),
            tracker: CompletionTracker::new(),
            limiter: self.options.concurrency.map(|n| Semaphore::new(n.max(1))),
            cancel,
            summary: Mutex::new(CrawlSummary::default()),
        });

        tracing::info!(concurrency = ?self.options.concurrency, "crawl started");

        let root = traversal.tracker.register();
        spawn_task(
            Arc::clone(&traversal),
            CrawlTask {
                address: start.to_string(),
                depth: max_depth,
            },
            root,
        );

        traversal.tracker.wait().await;

        let summary = traversal.summary();
        tracing::info!(
            tasks = summary.tasks,
            fetched = summary.fetched,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "crawl finished"
        );
        summary
    }
}

// Starts a task on the runtime. The caller registers the guard first, so the
// tracker already counts this task before it exists.
fn spawn_task(traversal: Arc<Traversal>, task: CrawlTask, guard: TaskGuard) {
    let span = tracing::debug_span!("task", url = %task.address, depth = task.depth);

    tokio::spawn(
        async move {
            // Released when this block ends, however it ends
            let _guard = guard;
            let outcome = run_task(Arc::clone(&traversal), task).await;
            tracing::debug!(?outcome, "task finished");
            traversal.record(outcome);
        }
        .instrument(span),
    );
}

fn run_task(traversal: Arc<Traversal>, task: CrawlTask) -> BoxFuture<'static, TaskOutcome> {
    async move {
        let CrawlTask { address, depth } = task;

        if depth <= 0 {
            return TaskOutcome::DepthExhausted;
        }

        if traversal.cancel.is_cancelled() {
            return TaskOutcome::Cancelled;
        }

        if !traversal.visited.claim(&address) {
            tracing::debug!("already claimed, skipping");
            return TaskOutcome::AlreadyClaimed;
        }

        // Wait for a fetch slot, if there is a limit
        let permit = match &traversal.limiter {
            Some(limiter) => tokio::select! {
                biased;
                _ = traversal.cancel.cancelled() => return TaskOutcome::Cancelled,
                permit = limiter.acquire() => permit.ok(),
            },
            None => None,
        };

        if traversal.cancel.is_cancelled() {
            return TaskOutcome::Cancelled;
        }

        // A panicking fetcher counts as a failed fetch for this address
        let result = tokio::select! {
            biased;
            _ = traversal.cancel.cancelled() => return TaskOutcome::Cancelled,
            result = AssertUnwindSafe(traversal.fetcher.fetch(&address)).catch_unwind() => result,
        };

        // The slot only covers the fetch; children wait for their own
        drop(permit);

        let result = match result {
            Ok(fetched) => fetched.map_err(|e| e.to_string()),
            Err(panic) => Err(format!("fetcher panicked: {}", panic_message(panic.as_ref()))),
        };

        match result {
            Err(reason) => {
                tracing::warn!(error = %reason, "fetch failed");
                traversal.sink.emit(CrawlEvent::Failed {
                    url: address,
                    depth,
                    reason,
                });
                TaskOutcome::FetchFailed
            }
            Ok(page) => {
                let links = page.links.len();
                tracing::debug!(links, "found: {}", address);

                traversal.sink.emit(CrawlEvent::Fetched {
                    url: address,
                    depth,
                    content: page.content,
                });

                for link in page.links {
                    let guard = traversal.tracker.register();
                    spawn_task(
                        Arc::clone(&traversal),
                        CrawlTask {
                            address: link,
                            depth: depth - 1,
                        },
                        guard,
                    );
                }

                TaskOutcome::Fetched { links }
            }
        }
    }
    .boxed()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}
