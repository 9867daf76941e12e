//! Lifecycle notifications for external observers (UI, event log).
//!
//! These never flow back into the engine; see `ports::EventSink`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::execution::ExecutionType;
use super::ids::ExecutionId;
use super::status::ExecutionStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
    ExecutionStarted {
        execution_type: ExecutionType,
        execution_id: ExecutionId,
        at: DateTime<Utc>,
    },
    ExecutionComplete {
        execution_type: ExecutionType,
        execution_id: ExecutionId,
        status: ExecutionStatus,
        at: DateTime<Utc>,
    },
}

impl ExecutionEvent {
    pub fn execution_id(&self) -> ExecutionId {
        match self {
            ExecutionEvent::ExecutionStarted { execution_id, .. }
            | ExecutionEvent::ExecutionComplete { execution_id, .. } => *execution_id,
        }
    }

    pub fn execution_type(&self) -> ExecutionType {
        match self {
            ExecutionEvent::ExecutionStarted { execution_type, .. }
            | ExecutionEvent::ExecutionComplete { execution_type, .. } => *execution_type,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ExecutionEvent::ExecutionStarted { .. } => "execution_started",
            ExecutionEvent::ExecutionComplete { .. } => "execution_complete",
        }
    }
}
