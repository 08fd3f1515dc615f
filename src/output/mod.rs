//! Output module for rendering pages and reporting results
//!
//! This module handles:
//! - Rendering extracted pages as Markdown
//! - Collecting per-run statistics
//! - Printing the end-of-run summary

mod markdown;
pub mod stats;

pub use markdown::render_page;
pub use stats::{print_summary, CrawlSummary, RunStats};
