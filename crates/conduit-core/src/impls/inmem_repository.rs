//! InMemoryExecutionRepository - 開発・テスト用の実行状態ストア
//!
//! A single `RwLock` serializes writes, which gives the per-execution
//! read-after-write consistency the engine assumes.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{Context, Execution, ExecutionId, ExecutionStatus, RepositoryError, Stage};
use crate::ports::ExecutionRepository;

#[derive(Default)]
pub struct InMemoryExecutionRepository {
    executions: RwLock<HashMap<ExecutionId, Execution>>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionRepository for InMemoryExecutionRepository {
    async fn store(&self, execution: &Execution) -> Result<(), RepositoryError> {
        self.executions
            .write()
            .await
            .insert(execution.id, execution.clone());
        Ok(())
    }

    async fn retrieve(&self, id: ExecutionId) -> Result<Execution, RepositoryError> {
        self.executions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(RepositoryError::ExecutionNotFound(id))
    }

    async fn store_stage(&self, stage: &Stage) -> Result<(), RepositoryError> {
        let mut executions = self.executions.write().await;
        let execution = executions
            .get_mut(&stage.execution_id)
            .ok_or(RepositoryError::ExecutionNotFound(stage.execution_id))?;
        let slot = execution
            .stage_mut(stage.id)
            .ok_or(RepositoryError::StageNotFound {
                execution_id: stage.execution_id,
                stage_id: stage.id,
            })?;
        *slot = stage.clone();
        Ok(())
    }

    async fn update_status(
        &self,
        id: ExecutionId,
        status: ExecutionStatus,
    ) -> Result<bool, RepositoryError> {
        let mut executions = self.executions.write().await;
        let execution = executions
            .get_mut(&id)
            .ok_or(RepositoryError::ExecutionNotFound(id))?;
        if execution.status.is_complete() {
            return Ok(false);
        }
        execution.status = status;
        Ok(true)
    }

    async fn merge_execution_context(
        &self,
        id: ExecutionId,
        outputs: &Context,
    ) -> Result<(), RepositoryError> {
        let mut executions = self.executions.write().await;
        let execution = executions
            .get_mut(&id)
            .ok_or(RepositoryError::ExecutionNotFound(id))?;
        execution.merge_outputs(outputs);
        Ok(())
    }
}
