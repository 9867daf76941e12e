//! Decision model: what the worker does with a task's reported status.
//!
//! Pure function: given the status and the task's backoff, return the next
//! action. Applying it (re-push / emit TaskComplete) is the worker's job.

use std::time::Duration;

use super::status::ExecutionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDecision {
    /// Still running: re-push the same RunTask after `delay`.
    Reschedule { delay: Duration },

    /// Finished: emit TaskComplete with this status.
    Complete { status: ExecutionStatus },
}

/// The task reported a status the worker has no policy for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("no policy for task result status {0}")]
pub struct UnhandledStatus(pub ExecutionStatus);

/// RUNNING reschedules; SUCCEEDED / TERMINAL complete; anything else is a defect.
pub fn decide(status: ExecutionStatus, backoff: Duration) -> Result<TaskDecision, UnhandledStatus> {
    match status {
        ExecutionStatus::Running => Ok(TaskDecision::Reschedule { delay: backoff }),
        ExecutionStatus::Succeeded | ExecutionStatus::Terminal => {
            Ok(TaskDecision::Complete { status })
        }
        other => Err(UnhandledStatus(other)),
    }
}
