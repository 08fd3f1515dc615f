//! Run statistics
//!
//! Workers record outcomes into [`RunStats`] as they go; at the end of a run
//! it is frozen into a [`CrawlSummary`].

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Final counts of one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub pages_saved: usize,
    pub documents_saved: usize,
    pub page_failures: usize,
    pub document_failures: usize,
    /// Pages whose content region fell back to the whole body
    pub degraded_pages: usize,
    /// Saved pages per crawl depth
    pub pages_per_depth: BTreeMap<u32, usize>,
    pub elapsed: Duration,
}

impl CrawlSummary {
    /// Pages that reached a terminal state, saved or failed
    pub fn pages_processed(&self) -> usize {
        self.pages_saved + self.page_failures
    }
}

/// Live counters shared by all workers
#[derive(Debug, Default)]
pub struct RunStats {
    pages_saved: AtomicUsize,
    documents_saved: AtomicUsize,
    page_failures: AtomicUsize,
    document_failures: AtomicUsize,
    degraded_pages: AtomicUsize,
    pages_per_depth: Mutex<BTreeMap<u32, usize>>,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a saved page; returns the number of pages processed so far
    pub fn record_page_saved(&self, depth: u32, degraded: bool) -> usize {
        if degraded {
            self.degraded_pages.fetch_add(1, Ordering::Relaxed);
        }
        *self.pages_per_depth.lock().entry(depth).or_insert(0) += 1;
        self.pages_saved.fetch_add(1, Ordering::Relaxed) + 1 + self.page_failures()
    }

    /// Records a failed page; returns the number of pages processed so far
    pub fn record_page_failed(&self) -> usize {
        self.page_failures.fetch_add(1, Ordering::Relaxed) + 1 + self.pages_saved()
    }

    pub fn record_document_saved(&self) {
        self.documents_saved.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_document_failed(&self) {
        self.document_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages_saved(&self) -> usize {
        self.pages_saved.load(Ordering::Relaxed)
    }

    pub fn page_failures(&self) -> usize {
        self.page_failures.load(Ordering::Relaxed)
    }

    /// Freezes the counters into a summary
    pub fn snapshot(&self, elapsed: Duration) -> CrawlSummary {
        CrawlSummary {
            pages_saved: self.pages_saved(),
            documents_saved: self.documents_saved.load(Ordering::Relaxed),
            page_failures: self.page_failures(),
            document_failures: self.document_failures.load(Ordering::Relaxed),
            degraded_pages: self.degraded_pages.load(Ordering::Relaxed),
            pages_per_depth: self.pages_per_depth.lock().clone(),
            elapsed,
        }
    }
}

/// Prints a run summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Pages:");
    println!("  Saved: {}", summary.pages_saved);
    println!("  Failed: {}", summary.page_failures);
    println!("  Whole-body fallback: {}", summary.degraded_pages);
    if !summary.pages_per_depth.is_empty() {
        println!("  By depth:");
        for (depth, count) in &summary.pages_per_depth {
            println!("    {}: {}", depth, count);
        }
    }
    println!();

    println!("Documents:");
    println!("  Saved: {}", summary.documents_saved);
    println!("  Failed: {}", summary.document_failures);
    println!();

    let secs = summary.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        summary.pages_processed() as f64 / secs
    } else {
        0.0
    };
    println!("Elapsed: {:.1}s ({:.2} pages/sec)", secs, rate);
}
