//! Execution / Stage / TaskModel: the persisted state the engine advances.
//!
//! Design:
//! - An `Execution` owns its stages; a `Stage` owns its tasks.
//! - A stage points back at its execution by id only (lookup, not ownership).
//! - State transitions happen through methods that respect the status table;
//!   a redelivered message that would break monotonicity becomes a no-op.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ExecutionId, StageId, TaskId};
use super::status::ExecutionStatus;
use super::task_type::TaskType;

/// Outputs visible to a stage (local) or to every stage (global).
pub type Context = HashMap<String, serde_json::Value>;

/// Kind of top-level run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionType {
    Pipeline,
    Orchestration,
}

impl std::fmt::Display for ExecutionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionType::Pipeline => f.write_str("pipeline"),
            ExecutionType::Orchestration => f.write_str("orchestration"),
        }
    }
}

/// One executable step inside a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskModel {
    pub id: TaskId,
    pub name: String,

    /// Which pluggable task logic executes this step.
    pub implementing_type: TaskType,

    pub status: ExecutionStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl TaskModel {
    pub fn new(name: impl Into<String>, implementing_type: impl Into<TaskType>) -> Self {
        Self {
            id: TaskId::generate(),
            name: name.into(),
            implementing_type: implementing_type.into(),
            status: ExecutionStatus::NotStarted,
            start_time: None,
            end_time: None,
        }
    }

    /// NotStarted -> Running, or a re-delivered Running -> Running.
    ///
    /// Returns `false` (and changes nothing) if the task already finished.
    pub fn mark_running(&mut self, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(ExecutionStatus::Running) {
            return false;
        }
        self.status = ExecutionStatus::Running;
        self.start_time = Some(now);
        true
    }

    /// Running -> Succeeded | Terminal | Canceled.
    ///
    /// A task that never started cannot finish.
    pub fn mark_complete(&mut self, status: ExecutionStatus, now: DateTime<Utc>) -> bool {
        if !status.is_complete() || !self.status.can_transition_to(status) {
            return false;
        }
        self.status = status;
        self.end_time = Some(now);
        true
    }
}

/// One node of an execution's DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub id: StageId,

    /// Owning execution (lookup only).
    pub execution_id: ExecutionId,

    /// Type tag; expanded into `tasks` before the execution is stored.
    pub stage_type: String,
    pub name: String,
    pub status: ExecutionStatus,

    /// Outputs scoped to this stage.
    #[serde(default)]
    pub context: Context,

    pub tasks: Vec<TaskModel>,

    /// Stages that must succeed before this one starts.
    #[serde(default)]
    pub upstream: Vec<StageId>,

    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Stage {
    pub fn task(&self, task_id: TaskId) -> Option<&TaskModel> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn task_mut(&mut self, task_id: TaskId) -> Option<&mut TaskModel> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    pub fn first_task(&self) -> Option<&TaskModel> {
        self.tasks.first()
    }

    /// The task after `task_id` in declaration order.
    pub fn next_task(&self, task_id: TaskId) -> Option<&TaskModel> {
        let index = self.tasks.iter().position(|t| t.id == task_id)?;
        self.tasks.get(index + 1)
    }

    /// NotStarted -> Running only; a second StartStage is ignored.
    pub fn mark_running(&mut self, now: DateTime<Utc>) -> bool {
        if self.status != ExecutionStatus::NotStarted {
            return false;
        }
        self.status = ExecutionStatus::Running;
        self.start_time = Some(now);
        true
    }

    /// Running -> Succeeded | Terminal | Canceled.
    pub fn mark_complete(&mut self, status: ExecutionStatus, now: DateTime<Utc>) -> bool {
        if !status.is_complete() || !self.status.can_transition_to(status) {
            return false;
        }
        self.status = status;
        self.end_time = Some(now);
        true
    }

    /// Merge outputs; existing keys are overwritten, never removed.
    pub fn merge_outputs(&mut self, outputs: &Context) {
        self.context
            .extend(outputs.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}

/// A top-level run (e.g. a pipeline instance).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub execution_type: ExecutionType,
    pub application: String,
    pub status: ExecutionStatus,
    pub stages: Vec<Stage>,

    /// Outputs visible to every stage.
    #[serde(default)]
    pub context: Context,
}

impl Execution {
    pub fn new(execution_type: ExecutionType, application: impl Into<String>) -> Self {
        Self {
            id: ExecutionId::generate(),
            execution_type,
            application: application.into(),
            status: ExecutionStatus::NotStarted,
            stages: Vec::new(),
            context: Context::new(),
        }
    }

    /// Append a stage owned by this execution and return its id.
    ///
    /// `upstream` must name stages already added.
    pub fn add_stage(
        &mut self,
        stage_type: impl Into<String>,
        name: impl Into<String>,
        tasks: Vec<TaskModel>,
        upstream: Vec<StageId>,
    ) -> StageId {
        let stage = Stage {
            id: StageId::generate(),
            execution_id: self.id,
            stage_type: stage_type.into(),
            name: name.into(),
            status: ExecutionStatus::NotStarted,
            context: Context::new(),
            tasks,
            upstream,
            start_time: None,
            end_time: None,
        };
        let id = stage.id;
        self.stages.push(stage);
        id
    }

    pub fn stage(&self, stage_id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == stage_id)
    }

    pub fn stage_mut(&mut self, stage_id: StageId) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.id == stage_id)
    }

    pub fn all_stages_succeeded(&self) -> bool {
        self.stages
            .iter()
            .all(|s| s.status == ExecutionStatus::Succeeded)
    }

    pub fn merge_outputs(&mut self, outputs: &Context) {
        self.context
            .extend(outputs.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
}
