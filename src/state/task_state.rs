use crate::HarvestError;
use std::fmt;

/// Represents the current state of a crawl task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    // ===== Active States =====
    /// Claimed and queued, waiting for a worker
    Scheduled,

    /// Page request in flight
    Fetching,

    /// Locating the content region, metadata and links
    Extracting,

    /// Writing the page and handing off children and documents
    Saving,

    // ===== Terminal States =====
    /// Page processed (children may have been scheduled)
    Done,

    /// Fetch or write failed; no output was produced
    Failed,
}

impl TaskState {
    /// Returns true if this is a terminal state (no further processing)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: TaskState) -> bool {
        use TaskState::*;

        matches!(
            (self, next),
            (Scheduled, Fetching)
                | (Scheduled, Failed)
                | (Fetching, Extracting)
                | (Fetching, Failed)
                | (Extracting, Saving)
                | (Saving, Done)
                | (Saving, Failed)
        )
    }

    /// Moves to `next`, rejecting transitions the state machine does not allow
    pub fn transition(&mut self, next: TaskState) -> Result<(), HarvestError> {
        if !self.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    /// Short lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Saving => "saving",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
