//! Task trait - プラガブルなタスク実装と、その登録簿
//!
//! # 学習ポイント
//! - Object-safe な async trait (`Arc<dyn Task>` で保持)
//! - Optional capability をデフォルトメソッドで表現 (`backoff_period`)
//! - 型キーの完全一致で解決し、曖昧な二重登録は起動時に拒否

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::registry::RegistryError;
use crate::domain::{Stage, TaskError, TaskResult, TaskType};

/// A unit of business logic invoked with a stage.
///
/// # 使用例
/// ```ignore
/// struct WaitForInstances;
///
/// #[async_trait]
/// impl Task for WaitForInstances {
///     fn task_type(&self) -> TaskType {
///         TaskType::new("deploy.wait_for_up_instances")
///     }
///
///     async fn execute(&self, stage: &Stage) -> Result<TaskResult, TaskError> {
///         Ok(TaskResult::running())
///     }
///
///     fn backoff_period(&self) -> Option<Duration> {
///         Some(Duration::from_secs(10))
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync {
    /// The key `TaskModel::implementing_type` refers to.
    fn task_type(&self) -> TaskType;

    async fn execute(&self, stage: &Stage) -> Result<TaskResult, TaskError>;

    /// Retryable tasks declare how long to wait before the next poll.
    /// `None` means the engine default applies.
    fn backoff_period(&self) -> Option<Duration> {
        None
    }
}

/// Registered task implementations, keyed by task type.
///
/// Built during initialization (mutable), shared read-only afterwards.
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<TaskType, Arc<dyn Task>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Arc<dyn Task>) -> Result<(), RegistryError> {
        let task_type = task.task_type();
        if self.tasks.contains_key(&task_type) {
            return Err(RegistryError::TaskAlreadyRegistered(task_type));
        }
        self.tasks.insert(task_type, task);
        Ok(())
    }

    /// Exact-match lookup.
    pub fn resolve(&self, task_type: &TaskType) -> Option<Arc<dyn Task>> {
        self.tasks.get(task_type).cloned()
    }

    pub fn registered_types(&self) -> Vec<TaskType> {
        let mut types: Vec<TaskType> = self.tasks.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
