// src/crawl/tracker.rs
// =============================================================================
// Knows when a traversal is finished.
//
// Crawl tasks spawn more crawl tasks, and a parent usually finishes long
// before its children do. So "the root task returned" does NOT mean the crawl
// is done. Instead we count live tasks:
//
//   register()  -> +1, hands back a TaskGuard
//   drop(guard) -> -1, wakes the waiter when the count hits zero
//   wait()      -> resolves once the count is zero
//
// Because the decrement lives in Drop, every way a task can end (early
// return, fetch error, cancellation, even a panic) releases its slot exactly
// once.
//
// Invariant: a child is registered while its parent's guard is still alive,
// so the count never touches zero while work remains.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Debug, Clone, Default)]
pub struct CompletionTracker {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    pending: AtomicUsize,
    drained: Notify,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one more unit of work. The work is done when the guard drops.
    pub fn register(&self) -> TaskGuard {
        let pending = self.inner.pending.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::trace!(pending, "task registered");
        TaskGuard {
            tracker: self.clone(),
        }
    }

    /// Number of registered tasks that haven't finished yet
    pub fn pending(&self) -> usize {
        self.inner.pending.load(Ordering::SeqCst)
    }

    /// Waits until every registered task has finished.
    ///
    /// Returns immediately if nothing is pending.
    pub async fn wait(&self) {
        loop {
            // Create the Notified future before checking the count:
            // notify_waiters() reaches it from this point on, so a task that
            // finishes between the check and the await can't be missed
            let drained = self.inner.drained.notified();
            if self.pending() == 0 {
                return;
            }
            drained.await;
        }
    }

    fn done(&self) {
        let remaining = self.inner.pending.fetch_sub(1, Ordering::SeqCst) - 1;
        tracing::trace!(pending = remaining, "task finished");
        if remaining == 0 {
            self.inner.drained.notify_waiters();
        }
    }
}

/// Proof that a task is registered. Dropping it marks the task done.
#[derive(Debug)]
pub struct TaskGuard {
    tracker: CompletionTracker,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.tracker.done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_wait_returns_when_nothing_registered() {
        let tracker = CompletionTracker::new();
        tracker.wait().await;
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test]
    async fn test_guard_drop_decrements() {
        let tracker = CompletionTracker::new();
        let a = tracker.register();
        let b = tracker.register();
        assert_eq!(tracker.pending(), 2);
        drop(a);
        assert_eq!(tracker.pending(), 1);
        drop(b);
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wait_drains_nested_spawns() {
        let tracker = CompletionTracker::new();

        // Each task registers its children before letting go of its own guard
        fn spawn_tree(tracker: CompletionTracker, guard: TaskGuard, level: u32) {
            tokio::spawn(async move {
                let _guard = guard;
                tokio::time::sleep(Duration::from_millis(2)).await;
                if level > 0 {
                    for _ in 0..3 {
                        let child = tracker.register();
                        spawn_tree(tracker.clone(), child, level - 1);
                    }
                }
            });
        }

        let root = tracker.register();
        spawn_tree(tracker.clone(), root, 3);

        tokio::time::timeout(Duration::from_secs(5), tracker.wait())
            .await
            .expect("tracker never drained");
        assert_eq!(tracker.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_panicking_task_still_releases_its_guard() {
        let tracker = CompletionTracker::new();
        let guard = tracker.register();

        let handle = tokio::spawn(async move {
            let _guard = guard;
            panic!("fetcher blew up");
        });
        assert!(handle.await.is_err());

        tokio::time::timeout(Duration::from_secs(1), tracker.wait())
            .await
            .expect("guard was not released on panic");
    }
}
