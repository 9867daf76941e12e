//! Queue messages: commands (imperative) and events (descriptive).
//!
//! Every message carries enough identity to be processed with nothing but a
//! repository lookup. Identity is layered: `ExecutionRef` ⊂ `StageRef` ⊂
//! `TaskRef`, flattened on the wire so each message is one flat record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::execution::{Execution, ExecutionType};
use super::ids::{ExecutionId, StageId, TaskId};
use super::status::ExecutionStatus;
use super::task_type::TaskType;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExecutionRef {
    pub execution_type: ExecutionType,
    pub execution_id: ExecutionId,
    pub correlation_id: String,
}

impl ExecutionRef {
    pub fn new(
        execution_type: ExecutionType,
        execution_id: ExecutionId,
        correlation_id: impl Into<String>,
    ) -> Self {
        Self {
            execution_type,
            execution_id,
            correlation_id: correlation_id.into(),
        }
    }

    /// Reference to `execution`, correlated by its application name.
    pub fn of(execution: &Execution) -> Self {
        Self::new(execution.execution_type, execution.id, &execution.application)
    }

    pub fn stage(&self, stage_id: StageId) -> StageRef {
        StageRef {
            execution: self.clone(),
            stage_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StageRef {
    #[serde(flatten)]
    pub execution: ExecutionRef,
    pub stage_id: StageId,
}

impl StageRef {
    pub fn task(&self, task_id: TaskId) -> TaskRef {
        TaskRef {
            stage: self.clone(),
            task_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRef {
    #[serde(flatten)]
    pub stage: StageRef,
    pub task_id: TaskId,
}

impl TaskRef {
    pub fn execution(&self) -> &ExecutionRef {
        &self.stage.execution
    }
}

// ========================================
// Commands
// ========================================

/// Begin an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartExecution {
    #[serde(flatten)]
    pub execution: ExecutionRef,
}

/// Begin one stage of an execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartStage {
    #[serde(flatten)]
    pub stage: StageRef,
}

/// Execute (or re-poll) one task. Consumed by the task worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTask {
    #[serde(flatten)]
    pub task: TaskRef,
    pub task_type: TaskType,
}

// ========================================
// Events
// ========================================

/// A task should begin; marks it RUNNING before any worker sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStarting {
    #[serde(flatten)]
    pub task: TaskRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskComplete {
    #[serde(flatten)]
    pub task: TaskRef,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageComplete {
    #[serde(flatten)]
    pub stage: StageRef,
    pub status: ExecutionStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionComplete {
    #[serde(flatten)]
    pub execution: ExecutionRef,
    pub status: ExecutionStatus,
}

/// Unrecoverable setup error; always terminates the execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationError {
    #[serde(flatten)]
    pub execution: ExecutionRef,
    pub error: ConfigurationErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigurationErrorKind {
    /// No registered task implementation matches the task type.
    InvalidTaskType {
        stage_id: StageId,
        task_id: TaskId,
        task_type_name: String,
    },
    /// The execution has no stage with this id.
    InvalidStageId { stage_id: StageId },
    /// The stage has no task with this id.
    InvalidTaskId { stage_id: StageId, task_id: TaskId },
}

impl ConfigurationError {
    pub fn invalid_task_type(command: &RunTask) -> Self {
        Self {
            execution: command.task.execution().clone(),
            error: ConfigurationErrorKind::InvalidTaskType {
                stage_id: command.task.stage.stage_id,
                task_id: command.task.task_id,
                task_type_name: command.task_type.to_string(),
            },
        }
    }

    pub fn invalid_stage_id(stage: &StageRef) -> Self {
        Self {
            execution: stage.execution.clone(),
            error: ConfigurationErrorKind::InvalidStageId {
                stage_id: stage.stage_id,
            },
        }
    }

    pub fn invalid_task_id(task: &TaskRef) -> Self {
        Self {
            execution: task.execution().clone(),
            error: ConfigurationErrorKind::InvalidTaskId {
                stage_id: task.stage.stage_id,
                task_id: task.task_id,
            },
        }
    }
}

// ========================================
// Message
// ========================================

/// Whether a message instructs an action or reports an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Command,
    Event,
}

/// Runtime type of a message; the dispatch key for handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    StartExecution,
    StartStage,
    RunTask,
    TaskStarting,
    TaskComplete,
    StageComplete,
    ExecutionComplete,
    ConfigurationError,
}

impl MessageType {
    pub const ALL: [MessageType; 8] = [
        MessageType::StartExecution,
        MessageType::StartStage,
        MessageType::RunTask,
        MessageType::TaskStarting,
        MessageType::TaskComplete,
        MessageType::StageComplete,
        MessageType::ExecutionComplete,
        MessageType::ConfigurationError,
    ];

    pub fn kind(self) -> MessageKind {
        match self {
            MessageType::StartExecution | MessageType::StartStage | MessageType::RunTask => {
                MessageKind::Command
            }
            _ => MessageKind::Event,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The unit carried by the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    StartExecution(StartExecution),
    StartStage(StartStage),
    RunTask(RunTask),
    TaskStarting(TaskStarting),
    TaskComplete(TaskComplete),
    StageComplete(StageComplete),
    ExecutionComplete(ExecutionComplete),
    ConfigurationError(ConfigurationError),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::StartExecution(_) => MessageType::StartExecution,
            Message::StartStage(_) => MessageType::StartStage,
            Message::RunTask(_) => MessageType::RunTask,
            Message::TaskStarting(_) => MessageType::TaskStarting,
            Message::TaskComplete(_) => MessageType::TaskComplete,
            Message::StageComplete(_) => MessageType::StageComplete,
            Message::ExecutionComplete(_) => MessageType::ExecutionComplete,
            Message::ConfigurationError(_) => MessageType::ConfigurationError,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.message_type().kind()
    }

    pub fn execution(&self) -> &ExecutionRef {
        match self {
            Message::StartExecution(m) => &m.execution,
            Message::StartStage(m) => &m.stage.execution,
            Message::RunTask(m) => m.task.execution(),
            Message::TaskStarting(m) => m.task.execution(),
            Message::TaskComplete(m) => m.task.execution(),
            Message::StageComplete(m) => &m.stage.execution,
            Message::ExecutionComplete(m) => &m.execution,
            Message::ConfigurationError(m) => &m.execution,
        }
    }
}

/// A concrete message struct that can be wrapped into / unwrapped from [`Message`].
///
/// `TYPE` ties each payload struct to its dispatch key at compile time.
pub trait MessagePayload: Into<Message> + Send + Sync + 'static {
    const TYPE: MessageType;

    fn from_message(message: Message) -> Option<Self>;
}

macro_rules! message_payload {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Message {
                fn from(m: $variant) -> Self {
                    Message::$variant(m)
                }
            }

            impl MessagePayload for $variant {
                const TYPE: MessageType = MessageType::$variant;

                fn from_message(message: Message) -> Option<Self> {
                    match message {
                        Message::$variant(m) => Some(m),
                        _ => None,
                    }
                }
            }
        )*
    };
}

message_payload!(
    StartExecution,
    StartStage,
    RunTask,
    TaskStarting,
    TaskComplete,
    StageComplete,
    ExecutionComplete,
    ConfigurationError,
);
