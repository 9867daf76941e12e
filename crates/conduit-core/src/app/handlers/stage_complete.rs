use async_trait::async_trait;
use tracing::{debug, info};

use super::HandlerDeps;
use crate::domain::{
    EngineError, ExecutionComplete, ExecutionStatus, StageComplete, StageGraph, StartStage,
};
use crate::typed::MessageHandler;

/// Records a stage's final status, then starts ready downstream stages or
/// completes the execution.
pub struct StageCompleteHandler {
    deps: HandlerDeps,
}

impl StageCompleteHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl MessageHandler<StageComplete> for StageCompleteHandler {
    async fn handle(&self, message: StageComplete) -> Result<(), EngineError> {
        let Some((_, mut stage)) = self.deps.load_stage(&message.stage).await? else {
            return Ok(());
        };
        if !stage.mark_complete(message.status, self.deps.clock.now()) {
            debug!(stage_id = %stage.id, status = %stage.status, "stage already complete");
            return Ok(());
        }
        self.deps.repository.store_stage(&stage).await?;
        info!(
            execution_id = %stage.execution_id,
            stage_id = %stage.id,
            status = %message.status,
            "stage complete"
        );

        // Re-read so that sibling stages completed concurrently are visible;
        // at least one of them then observes the full picture.
        let Some(execution) = self.deps.load_execution(&message.stage.execution).await? else {
            return Ok(());
        };
        if execution.status.is_complete() {
            debug!(execution_id = %execution.id, "execution already complete");
            return Ok(());
        }

        let execution_ref = &message.stage.execution;
        if message.status != ExecutionStatus::Succeeded {
            let complete = ExecutionComplete {
                execution: execution_ref.clone(),
                status: message.status,
            };
            self.deps.queue.push_now(complete.into()).await?;
            return Ok(());
        }

        if execution.all_stages_succeeded() {
            let complete = ExecutionComplete {
                execution: execution_ref.clone(),
                status: ExecutionStatus::Succeeded,
            };
            self.deps.queue.push_now(complete.into()).await?;
            return Ok(());
        }

        for stage_id in StageGraph::from_execution(&execution).ready_after(stage.id, &execution) {
            let start = StartStage {
                stage: execution_ref.stage(stage_id),
            };
            self.deps.queue.push_now(start.into()).await?;
        }
        Ok(())
    }
}
