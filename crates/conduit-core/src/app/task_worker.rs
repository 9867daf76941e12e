//! TaskWorker - RunTask コマンドの実行
//!
//! # フロー
//! 1. `task_type` を TaskRegistry で解決（無ければ ConfigurationError）
//! 2. stage を取得; execution が既に完了していれば TaskComplete(CANCELED)
//! 3. task を別 tokio task 上で実行（panic / Err → TaskComplete(TERMINAL)）
//! 4. stage / global outputs をそれぞれ永続化
//! 5. `decide()`: RUNNING なら同じ RunTask を backoff 後に再投入、
//!    SUCCEEDED / TERMINAL なら TaskComplete

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::handlers::HandlerDeps;
use crate::domain::{
    ConfigurationError, EngineError, Execution, ExecutionStatus, RunTask, Stage, TaskComplete,
    TaskDecision, TaskError, TaskResult, decide,
};
use crate::typed::{MessageHandler, Task, TaskRegistry};

pub struct TaskWorker {
    deps: HandlerDeps,
    tasks: Arc<TaskRegistry>,
    default_backoff: Duration,
}

impl TaskWorker {
    pub fn new(deps: HandlerDeps, tasks: Arc<TaskRegistry>, default_backoff: Duration) -> Self {
        Self {
            deps,
            tasks,
            default_backoff,
        }
    }

    fn backoff_for(&self, task: &dyn Task) -> Duration {
        task.backoff_period().unwrap_or(self.default_backoff)
    }

    /// Runs the task on its own tokio task so a panic surfaces as a `JoinError`.
    async fn invoke(task: Arc<dyn Task>, stage: Stage) -> Result<TaskResult, TaskError> {
        let handle = tokio::spawn(async move { task.execute(&stage).await });
        match handle.await {
            Ok(result) => result,
            Err(join_err) => Err(TaskError::Panicked(join_err.to_string())),
        }
    }

    async fn complete(&self, command: RunTask, status: ExecutionStatus) -> Result<(), EngineError> {
        let complete = TaskComplete {
            task: command.task,
            status,
        };
        self.deps.queue.push_now(complete.into()).await?;
        Ok(())
    }

    /// Stage outputs go to the stage, global outputs to the execution; one
    /// write each, and only when there is something to write.
    async fn store_outputs(
        &self,
        execution: &Execution,
        mut stage: Stage,
        result: &TaskResult,
    ) -> Result<(), EngineError> {
        if !result.stage_outputs.is_empty() {
            stage.merge_outputs(&result.stage_outputs);
            self.deps.repository.store_stage(&stage).await?;
        }
        if !result.global_outputs.is_empty() {
            self.deps
                .repository
                .merge_execution_context(execution.id, &result.global_outputs)
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl MessageHandler<RunTask> for TaskWorker {
    async fn handle(&self, command: RunTask) -> Result<(), EngineError> {
        let execution_ref = command.task.execution();
        let Some(task) = self.tasks.resolve(&command.task_type) else {
            warn!(
                task_type = %command.task_type,
                execution_id = %execution_ref.execution_id,
                "no task implementation registered"
            );
            let message = ConfigurationError::invalid_task_type(&command);
            self.deps.queue.push_now(message.into()).await?;
            return Ok(());
        };

        let Some((execution, stage)) = self.deps.load_stage(&command.task.stage).await? else {
            return Ok(());
        };
        if execution.status.is_complete() {
            info!(
                task_type = %command.task_type,
                execution_id = %execution.id,
                status = %execution.status,
                "execution already complete, canceling task"
            );
            return self.complete(command, ExecutionStatus::Canceled).await;
        }

        let result = match Self::invoke(task.clone(), stage.clone()).await {
            Ok(result) => result,
            Err(err) => {
                error!(
                    task_type = %command.task_type,
                    execution_type = %execution.execution_type,
                    execution_id = %execution.id,
                    error = %err,
                    "error running task"
                );
                return self.complete(command, ExecutionStatus::Terminal).await;
            }
        };

        self.store_outputs(&execution, stage, &result).await?;

        match decide(result.status, self.backoff_for(task.as_ref())) {
            Ok(TaskDecision::Reschedule { delay }) => {
                debug!(task_type = %command.task_type, ?delay, "task still running");
                self.deps.queue.push(command.into(), delay).await?;
                Ok(())
            }
            Ok(TaskDecision::Complete { status }) => self.complete(command, status).await,
            Err(unhandled) => Err(EngineError::unhandled_status(
                command.task_type.clone(),
                unhandled,
            )),
        }
    }
}
