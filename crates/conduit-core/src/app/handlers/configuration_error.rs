use async_trait::async_trait;
use tracing::error;

use super::HandlerDeps;
use crate::domain::{ConfigurationError, EngineError, ExecutionComplete, ExecutionStatus};
use crate::typed::MessageHandler;

/// Terminates the execution. Configuration errors are never retried.
pub struct ConfigurationErrorHandler {
    deps: HandlerDeps,
}

impl ConfigurationErrorHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl MessageHandler<ConfigurationError> for ConfigurationErrorHandler {
    async fn handle(&self, message: ConfigurationError) -> Result<(), EngineError> {
        error!(
            execution_id = %message.execution.execution_id,
            execution_type = %message.execution.execution_type,
            error = ?message.error,
            "configuration error, terminating execution"
        );
        let complete = ExecutionComplete {
            execution: message.execution,
            status: ExecutionStatus::Terminal,
        };
        self.deps.queue.push_now(complete.into()).await?;
        Ok(())
    }
}
