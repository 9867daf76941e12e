use async_trait::async_trait;
use tracing::{debug, info};

use super::HandlerDeps;
use crate::domain::{
    EngineError, ExecutionStatus, Message, StageComplete, StartStage, TaskStarting,
};
use crate::typed::MessageHandler;

/// NOT_STARTED stage -> RUNNING, then hand off to its first task.
pub struct StartStageHandler {
    deps: HandlerDeps,
}

impl StartStageHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl MessageHandler<StartStage> for StartStageHandler {
    async fn handle(&self, message: StartStage) -> Result<(), EngineError> {
        let Some((execution, mut stage)) = self.deps.load_stage(&message.stage).await? else {
            return Ok(());
        };
        if execution.status.is_complete() {
            debug!(
                execution_id = %execution.id,
                stage_id = %stage.id,
                "execution already complete, not starting stage"
            );
            return Ok(());
        }
        if !stage.mark_running(self.deps.clock.now()) {
            debug!(stage_id = %stage.id, status = %stage.status, "stage already started");
            return Ok(());
        }
        self.deps.repository.store_stage(&stage).await?;

        let next: Message = match stage.first_task() {
            Some(task) => TaskStarting {
                task: message.stage.task(task.id),
            }
            .into(),
            None => StageComplete {
                stage: message.stage.clone(),
                status: ExecutionStatus::Succeeded,
            }
            .into(),
        };
        info!(
            execution_id = %execution.id,
            stage_id = %stage.id,
            stage_type = %stage.stage_type,
            "stage started"
        );
        self.deps.queue.push_now(next).await?;
        Ok(())
    }
}
