use async_trait::async_trait;
use tracing::{debug, warn};

use super::HandlerDeps;
use crate::domain::{ConfigurationError, EngineError, RunTask, TaskStarting};
use crate::typed::MessageHandler;

/// Marks a task RUNNING and issues the `RunTask` command for it.
///
/// The status change is persisted before `RunTask` is pushed, so a worker
/// never sees a task that is still NOT_STARTED.
pub struct TaskStartingHandler {
    deps: HandlerDeps,
}

impl TaskStartingHandler {
    pub fn new(deps: HandlerDeps) -> Self {
        Self { deps }
    }
}

#[async_trait]
impl MessageHandler<TaskStarting> for TaskStartingHandler {
    async fn handle(&self, message: TaskStarting) -> Result<(), EngineError> {
        let Some((_, mut stage)) = self.deps.load_stage(&message.task.stage).await? else {
            return Ok(());
        };
        let now = self.deps.clock.now();
        let stage_id = stage.id;
        let Some(task) = stage.task_mut(message.task.task_id) else {
            warn!(
                %stage_id,
                task_id = %message.task.task_id,
                "task not found in stage"
            );
            self.deps
                .queue
                .push_now(ConfigurationError::invalid_task_id(&message.task).into())
                .await?;
            return Ok(());
        };
        if !task.mark_running(now) {
            debug!(task_id = %task.id, status = %task.status, "task already complete");
            return Ok(());
        }
        let task_type = task.implementing_type.clone();

        self.deps.repository.store_stage(&stage).await?;
        self.deps
            .queue
            .push_now(
                RunTask {
                    task: message.task,
                    task_type,
                }
                .into(),
            )
            .await?;
        Ok(())
    }
}
