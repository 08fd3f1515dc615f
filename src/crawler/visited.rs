//! Visited-set guard
//!
//! The only deduplication primitive of a run. A URL moves from absent to
//! claimed exactly once and is never released.

use parking_lot::Mutex;
use std::collections::HashSet;

/// Set of claimed URLs, shared by all workers of one run
#[derive(Debug, Default)]
pub struct VisitedSet {
    claimed: Mutex<HashSet<String>>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for the caller
    ///
    /// Returns `true` for exactly one caller per URL, no matter how many
    /// workers race on it. The membership test and the insert happen under
    /// one lock acquisition.
    pub fn try_claim(&self, url: &str) -> bool {
        self.claimed.lock().insert(url.to_string())
    }

    /// Number of URLs claimed so far
    pub fn len(&self) -> usize {
        self.claimed.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
