use serde::{Deserialize, Serialize};

/// Snapshot of an in-memory queue, by delivery state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueCounts {
    /// Due and waiting for a poll.
    pub ready: usize,
    /// Pushed with a delay that has not elapsed.
    pub scheduled: usize,
    /// Handed out and not yet acked.
    pub leased: usize,
}

impl QueueCounts {
    pub fn total(&self) -> usize {
        self.ready + self.scheduled + self.leased
    }
}
