//! Execution / Stage / Task status and its state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status shared by executions, stages and tasks.
///
/// State transitions:
/// - NotStarted -> Running
/// - Running -> Running (re-entrant: a task polled and rescheduled)
/// - Running -> Succeeded | Terminal | Canceled
///
/// Succeeded / Terminal / Canceled have no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    NotStarted,
    Running,
    Succeeded,
    Terminal,
    Canceled,
}

impl ExecutionStatus {
    /// Is this a terminal status (no further transitions)?
    pub fn is_complete(self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded | ExecutionStatus::Terminal | ExecutionStatus::Canceled
        )
    }

    /// Normal transition table.
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        match (self, next) {
            (NotStarted, Running) => true,
            (Running, Running | Succeeded | Terminal | Canceled) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionStatus::NotStarted => "NOT_STARTED",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Succeeded => "SUCCEEDED",
            ExecutionStatus::Terminal => "TERMINAL",
            ExecutionStatus::Canceled => "CANCELED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionStatus::*;
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::start(NotStarted, Running)]
    #[case::reschedule(Running, Running)]
    #[case::succeed(Running, Succeeded)]
    #[case::fail(Running, Terminal)]
    #[case::cancel(Running, Canceled)]
    fn allowed_transitions(#[case] from: ExecutionStatus, #[case] to: ExecutionStatus) {
        assert!(from.can_transition_to(to));
    }

    #[rstest]
    #[case::skip_running(NotStarted, Succeeded)]
    #[case::back_to_start(Running, NotStarted)]
    #[case::out_of_succeeded(Succeeded, Running)]
    #[case::out_of_terminal(Terminal, Succeeded)]
    #[case::out_of_canceled(Canceled, Running)]
    #[case::terminal_again(Terminal, Terminal)]
    fn rejected_transitions(#[case] from: ExecutionStatus, #[case] to: ExecutionStatus) {
        assert!(!from.can_transition_to(to));
    }

    #[rstest]
    #[case(NotStarted, false)]
    #[case(Running, false)]
    #[case(Succeeded, true)]
    #[case(Terminal, true)]
    #[case(Canceled, true)]
    fn complete_statuses(#[case] status: ExecutionStatus, #[case] complete: bool) {
        assert_eq!(status.is_complete(), complete);
    }

    #[test]
    fn serializes_as_screaming_snake_case() {
        let s = serde_json::to_string(&NotStarted).unwrap();
        assert_eq!(s, "\"NOT_STARTED\"");
        assert_eq!(NotStarted.to_string(), "NOT_STARTED");
    }
}
