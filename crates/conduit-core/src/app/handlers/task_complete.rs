use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::HandlerDeps;
use crate::domain::{
    ConfigurationError, EngineError, ExecutionStatus, Message, StageComplete, TaskComplete,
    TaskStarting,
};
use crate::typed::MessageHandler;

/// Records a task's final status and advances its stage.
pub struct TaskCompleteHandler {
    deps: HandlerDeps,
}

impl TaskCompleteHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl MessageHandler<TaskComplete> for TaskCompleteHandler {
    async fn handle(&self, message: TaskComplete) -> Result<(), EngineError> {
        let Some((_, mut stage)) = self.deps.load_stage(&message.task.stage).await? else {
            return Ok(());
        };
        let now = self.deps.clock.now();
        let task_id = message.task.task_id;
        let Some(task) = stage.task_mut(task_id) else {
            warn!(%task_id, "task not found in stage");
            self.deps
                .queue
                .push_now(ConfigurationError::invalid_task_id(&message.task).into())
                .await?;
            return Ok(());
        };
        if !task.mark_complete(message.status, now) {
            debug!(%task_id, status = %task.status, "task already complete");
            return Ok(());
        }
        info!(
            execution_id = %stage.execution_id,
            stage_id = %stage.id,
            %task_id,
            status = %message.status,
            "task complete"
        );
        self.deps.repository.store_stage(&stage).await?;

        let stage_ref = &message.task.stage;
        let next: Message = match message.status {
            ExecutionStatus::Succeeded => match stage.next_task(task_id) {
                Some(next) => TaskStarting {
                    task: stage_ref.task(next.id),
                }
                .into(),
                None => StageComplete {
                    stage: stage_ref.clone(),
                    status: ExecutionStatus::Succeeded,
                }
                .into(),
            },
            status => StageComplete {
                stage: stage_ref.clone(),
                status,
            }
            .into(),
        };
        self.deps.queue.push_now(next).await?;
        Ok(())
    }
}
