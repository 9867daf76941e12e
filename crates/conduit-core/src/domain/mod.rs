//! Domain model (ids, status, execution state, messages, results, errors).
//!
//! Architecture-agnostic: nothing here assumes a particular queue or store.

pub mod decision;
pub mod errors;
pub mod events;
pub mod execution;
pub mod graph;
pub mod ids;
pub mod message;
pub mod result;
pub mod status;
pub mod task_type;

pub use self::decision::{TaskDecision, UnhandledStatus, decide};
pub use self::errors::{EngineError, QueueError, RepositoryError, SinkError, TaskError};
pub use self::events::ExecutionEvent;
pub use self::execution::{Context, Execution, ExecutionType, Stage, TaskModel};
pub use self::graph::StageGraph;
pub use self::ids::{ExecutionId, MessageId, StageId, TaskId};
pub use self::message::{
    ConfigurationError, ConfigurationErrorKind, ExecutionComplete, ExecutionRef, Message,
    MessageKind, MessagePayload, MessageType, RunTask, StageComplete, StageRef, StartExecution,
    StartStage, TaskComplete, TaskRef, TaskStarting,
};
pub use self::result::TaskResult;
pub use self::status::ExecutionStatus;
pub use self::task_type::TaskType;
