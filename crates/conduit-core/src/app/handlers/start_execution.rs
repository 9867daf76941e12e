use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::HandlerDeps;
use crate::domain::{
    EngineError, ExecutionEvent, ExecutionStatus, StageGraph, StartExecution, StartStage,
};
use crate::typed::MessageHandler;

/// Marks an execution RUNNING and fans out one `StartStage` per initial stage.
pub struct StartExecutionHandler {
    deps: HandlerDeps,
}

impl StartExecutionHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl MessageHandler<StartExecution> for StartExecutionHandler {
    async fn handle(&self, message: StartExecution) -> Result<(), EngineError> {
        let Some(execution) = self.deps.load_execution(&message.execution).await? else {
            return Ok(());
        };
        if execution.status.is_complete() {
            debug!(
                execution_id = %execution.id,
                status = %execution.status,
                "execution already complete, not starting"
            );
            return Ok(());
        }

        let applied = self
            .deps
            .repository
            .update_status(execution.id, ExecutionStatus::Running)
            .await?;
        if !applied {
            debug!(execution_id = %execution.id, "execution completed concurrently, not starting");
            return Ok(());
        }

        let initial = StageGraph::from_execution(&execution).initial_stages();
        for stage_id in &initial {
            let start = StartStage {
                stage: message.execution.stage(*stage_id),
            };
            self.deps.queue.push_now(start.into()).await?;
        }
        info!(
            execution_id = %execution.id,
            execution_type = %execution.execution_type,
            initial_stages = initial.len(),
            "execution started"
        );

        let event = ExecutionEvent::ExecutionStarted {
            execution_type: execution.execution_type,
            execution_id: execution.id,
            at: self.deps.clock.now(),
        };
        if let Err(err) = self.deps.events.publish(event) {
            warn!(execution_id = %execution.id, error = %err, "failed to publish execution started");
        }
        Ok(())
    }
}
