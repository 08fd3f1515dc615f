//! State module for tracking task progress
//!
//! Every crawl task moves through a small state machine:
//!
//! ```text
//! Scheduled → Fetching → Extracting → Saving → Done
//!     │           │                      │
//!     └───────────┴──────────────────────┴──→ Failed
//! ```
//!
//! `Done` and `Failed` are terminal; a task never moves backwards.

mod task_state;

pub use task_state::TaskState;
