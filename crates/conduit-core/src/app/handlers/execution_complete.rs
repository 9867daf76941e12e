use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::HandlerDeps;
use crate::domain::{EngineError, ExecutionComplete, ExecutionEvent};
use crate::typed::MessageHandler;

/// Writes the execution's final status once and notifies observers.
pub struct ExecutionCompleteHandler {
    deps: HandlerDeps,
}

impl ExecutionCompleteHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl MessageHandler<ExecutionComplete> for ExecutionCompleteHandler {
    async fn handle(&self, message: ExecutionComplete) -> Result<(), EngineError> {
        let Some(execution) = self.deps.load_execution(&message.execution).await? else {
            return Ok(());
        };
        if execution.status.is_complete() {
            debug!(
                execution_id = %execution.id,
                status = %execution.status,
                "execution already complete"
            );
            return Ok(());
        }

        let applied = self
            .deps
            .repository
            .update_status(execution.id, message.status)
            .await?;
        if !applied {
            debug!(
                execution_id = %execution.id,
                status = %message.status,
                "execution completed concurrently"
            );
            return Ok(());
        }
        info!(
            execution_id = %execution.id,
            execution_type = %execution.execution_type,
            status = %message.status,
            "execution complete"
        );

        let event = ExecutionEvent::ExecutionComplete {
            execution_type: execution.execution_type,
            execution_id: execution.id,
            status: message.status,
            at: self.deps.clock.now(),
        };
        if let Err(err) = self.deps.events.publish(event) {
            warn!(execution_id = %execution.id, error = %err, "failed to publish execution complete");
        }
        Ok(())
    }
}
