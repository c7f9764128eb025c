// src/crawl/visited.rs
// =============================================================================
// The set of addresses a traversal has already taken responsibility for.
//
// There is exactly one operation: `claim`. It checks and marks an address in
// a single step under the lock, so when many crawl tasks discover the same
// page at the same time, only one of them wins and fetches it.
//
// Rust concepts:
// - Mutex: Only one thread at a time can look inside the HashSet
// - Interior mutability: `claim` takes &self, yet it changes the set
// - HashSet::insert returns false if the value was already there
// =============================================================================

use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct VisitedSet {
    addresses: Mutex<HashSet<String>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `address` as visited.
    ///
    /// Returns `true` for the first caller only; every later (or concurrent)
    /// call for the same address returns `false`. Addresses are compared as
    /// exact strings and are never removed.
    pub fn claim(&self, address: &str) -> bool {
        // A panic while holding the lock can't leave the set half-updated,
        // so a poisoned lock is still safe to use
        let mut addresses = self
            .addresses
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        addresses.insert(address.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_first_claim_wins() {
        let visited = VisitedSet::new();
        assert!(visited.claim("http://golang.org/"));
        assert!(!visited.claim("http://golang.org/"));
        assert!(!visited.claim("http://golang.org/"));
    }

    #[test]
    fn test_exact_string_equality() {
        // No normalisation: a trailing slash makes it a different address
        let visited = VisitedSet::new();
        assert!(visited.claim("http://golang.org"));
        assert!(visited.claim("http://golang.org/"));
        assert!(visited.claim("HTTP://golang.org/"));
    }

    #[test]
    fn test_concurrent_claims_have_one_winner() {
        let visited = Arc::new(VisitedSet::new());
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let visited = Arc::clone(&visited);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        if visited.claim(&format!("page-{}", i)) {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // 100 distinct addresses, each won exactly once across 16 threads
        assert_eq!(winners.load(Ordering::SeqCst), 100);
    }
}
