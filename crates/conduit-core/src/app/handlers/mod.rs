//! Handlers - メッセージ型ごとの状態遷移
//!
//! Every handler follows the same shape: load from the repository, apply one
//! transition, persist, then push the follow-on message(s). A handler that
//! finds its transition already applied does nothing, so redelivery is safe.

use std::sync::Arc;

use tracing::warn;

use crate::domain::{
    ConfigurationError, EngineError, Execution, ExecutionRef, RepositoryError, Stage, StageRef,
};
use crate::ports::{Clock, EventSink, ExecutionRepository, Queue};

pub mod configuration_error;
pub mod execution_complete;
pub mod stage_complete;
pub mod start_execution;
pub mod start_stage;
pub mod task_complete;
pub mod task_starting;

pub use self::configuration_error::ConfigurationErrorHandler;
pub use self::execution_complete::ExecutionCompleteHandler;
pub use self::stage_complete::StageCompleteHandler;
pub use self::start_execution::StartExecutionHandler;
pub use self::start_stage::StartStageHandler;
pub use self::task_complete::TaskCompleteHandler;
pub use self::task_starting::TaskStartingHandler;

/// Collaborators shared by every handler.
#[derive(Clone)]
pub struct HandlerDeps {
    pub queue: Arc<dyn Queue>,
    pub repository: Arc<dyn ExecutionRepository>,
    pub clock: Arc<dyn Clock>,
    pub events: Arc<dyn EventSink>,
}

impl HandlerDeps {
    /// `Ok(None)` when the execution no longer exists; the message is dropped.
    pub(crate) async fn load_execution(
        &self,
        execution: &ExecutionRef,
    ) -> Result<Option<Execution>, EngineError> {
        match self.repository.retrieve(execution.execution_id).await {
            Ok(found) => Ok(Some(found)),
            Err(RepositoryError::ExecutionNotFound(_)) => {
                warn!(
                    execution_id = %execution.execution_id,
                    execution_type = %execution.execution_type,
                    "execution not found, dropping message"
                );
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Loads the execution and a copy of one of its stages.
    ///
    /// An unknown stage id is reported as `ConfigurationError::InvalidStageId`
    /// and yields `Ok(None)`.
    pub(crate) async fn load_stage(
        &self,
        stage: &StageRef,
    ) -> Result<Option<(Execution, Stage)>, EngineError> {
        let Some(execution) = self.load_execution(&stage.execution).await? else {
            return Ok(None);
        };
        match execution.stage(stage.stage_id).cloned() {
            Some(found) => Ok(Some((execution, found))),
            None => {
                warn!(
                    execution_id = %stage.execution.execution_id,
                    stage_id = %stage.stage_id,
                    "stage not found in execution"
                );
                self.queue
                    .push_now(ConfigurationError::invalid_stage_id(stage).into())
                    .await?;
                Ok(None)
            }
        }
    }
}
