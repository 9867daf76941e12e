//! TaskResult: what one invocation of task logic reports back.

use serde::{Deserialize, Serialize};

use super::execution::Context;
use super::status::ExecutionStatus;

/// Status plus the two output maps.
///
/// - `stage_outputs` merge into the stage's local context.
/// - `global_outputs` merge into the execution's context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub status: ExecutionStatus,

    #[serde(default, skip_serializing_if = "Context::is_empty")]
    pub stage_outputs: Context,

    #[serde(default, skip_serializing_if = "Context::is_empty")]
    pub global_outputs: Context,
}

impl TaskResult {
    pub fn new(status: ExecutionStatus) -> Self {
        Self {
            status,
            stage_outputs: Context::new(),
            global_outputs: Context::new(),
        }
    }

    pub fn running() -> Self {
        Self::new(ExecutionStatus::Running)
    }

    pub fn succeeded() -> Self {
        Self::new(ExecutionStatus::Succeeded)
    }

    pub fn terminal() -> Self {
        Self::new(ExecutionStatus::Terminal)
    }

    pub fn with_stage_output(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.stage_outputs.insert(key.into(), value);
        self
    }

    pub fn with_global_output(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.global_outputs.insert(key.into(), value);
        self
    }
}
