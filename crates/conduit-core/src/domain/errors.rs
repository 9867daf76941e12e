//! Errors - エラー型と分類
//!
//! Taxonomy:
//! - Business failures (task errors, stale work, configuration errors) become
//!   queue messages and never surface here as `Err`.
//! - Infrastructure failures (`RepositoryError`, `QueueError`) are retried by
//!   leaving the message un-acked.
//! - Programming defects (`NoHandler`, `UnhandledTaskStatus`) are fatal.

use thiserror::Error;

use super::decision::UnhandledStatus;
use super::ids::{ExecutionId, MessageId, StageId};
use super::message::MessageType;
use super::status::ExecutionStatus;
use super::task_type::TaskType;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("execution not found: {0}")]
    ExecutionNotFound(ExecutionId),

    #[error("stage {stage_id} not found in execution {execution_id}")]
    StageNotFound {
        execution_id: ExecutionId,
        stage_id: StageId,
    },

    #[error("repository backend: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("message not owned by this queue (already acked or unknown): {0}")]
    UnknownMessage(MessageId),

    #[error("queue backend: {0}")]
    Backend(String),
}

/// Failure reported by task logic.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("{0}")]
    Failed(String),

    #[error("task panicked: {0}")]
    Panicked(String),
}

impl TaskError {
    pub fn failed(message: impl Into<String>) -> Self {
        TaskError::Failed(message.into())
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("event sink closed")]
    Closed,

    #[error("event sink: {0}")]
    Other(String),
}

/// Error raised while processing one queue message.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("no handler registered for message type {0}")]
    NoHandler(MessageType),

    #[error("handler for {expected} received a {actual} message")]
    MismatchedMessage {
        expected: MessageType,
        actual: MessageType,
    },

    #[error("task {task_type} returned unhandled status {status}")]
    UnhandledTaskStatus {
        task_type: TaskType,
        status: ExecutionStatus,
    },
}

impl EngineError {
    pub fn unhandled_status(task_type: TaskType, err: UnhandledStatus) -> Self {
        EngineError::UnhandledTaskStatus {
            task_type,
            status: err.0,
        }
    }

    /// Fatal errors are wiring or logic defects; retrying cannot fix them.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::NoHandler(_)
                | EngineError::MismatchedMessage { .. }
                | EngineError::UnhandledTaskStatus { .. }
        )
    }
}
