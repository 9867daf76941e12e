//! ExecutionRepository port - 実行状態の正本（source of truth）
//!
//! # 設計原則
//! - Durable, and a write is visible to the next read from any instance.
//! - Writes are serialized per execution id by the backend; the engine does
//!   no in-process locking.
//! - Handlers persist before they push follow-on messages.

use async_trait::async_trait;

use crate::domain::{Context, Execution, ExecutionId, ExecutionStatus, RepositoryError, Stage};

#[async_trait]
pub trait ExecutionRepository: Send + Sync {
    /// Insert or replace a whole execution (used by whoever authors it).
    async fn store(&self, execution: &Execution) -> Result<(), RepositoryError>;

    async fn retrieve(&self, id: ExecutionId) -> Result<Execution, RepositoryError>;

    /// Replace one stage (status, tasks, context) inside its execution.
    async fn store_stage(&self, stage: &Stage) -> Result<(), RepositoryError>;

    /// Set the execution's status unless the stored one is already final.
    ///
    /// The check and the write are one atomic step. Returns `false` when the
    /// stored status was final and nothing was written.
    async fn update_status(
        &self,
        id: ExecutionId,
        status: ExecutionStatus,
    ) -> Result<bool, RepositoryError>;

    /// Merge outputs into the execution's global context.
    async fn merge_execution_context(
        &self,
        id: ExecutionId,
        outputs: &Context,
    ) -> Result<(), RepositoryError>;
}
