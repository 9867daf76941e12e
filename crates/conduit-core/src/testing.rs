//! Test doubles shared by the unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    ConfigurationError, Context, Execution, ExecutionComplete, ExecutionEvent, ExecutionId,
    ExecutionStatus, ExecutionType, Message, MessageId, MessageType, QueueError, RepositoryError,
    RunTask, SinkError, Stage, StageComplete, StageId, StartExecution, StartStage, TaskComplete,
    TaskError, TaskModel, TaskRef, TaskResult, TaskStarting, TaskType,
};
use crate::impls::InMemoryExecutionRepository;
use crate::ports::{Envelope, EventSink, ExecutionRepository, Queue};
use crate::typed::Task;

// ========================================
// Tasks
// ========================================

pub enum Step {
    Return(TaskResult),
    Fail(String),
    Panic,
}

/// Task whose successive invocations follow a script; the last step repeats.
pub struct ScriptedTask {
    task_type: TaskType,
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    backoff: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedTask {
    pub fn new(task_type: &str, steps: Vec<Step>) -> Self {
        Self {
            task_type: TaskType::new(task_type),
            steps: Mutex::new(steps.into()),
            last: Mutex::new(None),
            backoff: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn succeeding(task_type: &str) -> Self {
        Self::new(task_type, vec![Step::Return(TaskResult::succeeded())])
    }

    pub fn returning(task_type: &str, result: TaskResult) -> Self {
        Self::new(task_type, vec![Step::Return(result)])
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        if let Some(step) = steps.pop_front() {
            *last = Some(step.repeatable());
            return step;
        }
        last.as_ref()
            .map(Step::repeatable)
            .unwrap_or(Step::Return(TaskResult::succeeded()))
    }
}

impl Step {
    fn repeatable(&self) -> Step {
        match self {
            Step::Return(r) => Step::Return(r.clone()),
            Step::Fail(m) => Step::Fail(m.clone()),
            Step::Panic => Step::Panic,
        }
    }
}

#[async_trait]
impl Task for ScriptedTask {
    fn task_type(&self) -> TaskType {
        self.task_type.clone()
    }

    async fn execute(&self, _stage: &Stage) -> Result<TaskResult, TaskError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Return(result) => Ok(result),
            Step::Fail(message) => Err(TaskError::failed(message)),
            Step::Panic => panic!("scripted panic in {}", self.task_type),
        }
    }

    fn backoff_period(&self) -> Option<Duration> {
        self.backoff
    }
}

// ========================================
// Queue
// ========================================

/// Records pushes; never delivers anything.
#[derive(Default)]
pub struct RecordingQueue {
    pushed: Mutex<Vec<(Message, Duration)>>,
}

impl RecordingQueue {
    pub fn pushed(&self) -> Vec<(Message, Duration)> {
        self.pushed.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.pushed().into_iter().map(|(m, _)| m).collect()
    }
}

#[async_trait]
impl Queue for RecordingQueue {
    async fn push(&self, message: Message, delay: Duration) -> Result<MessageId, QueueError> {
        self.pushed.lock().unwrap().push((message, delay));
        Ok(MessageId::generate())
    }

    async fn poll(&self) -> Result<Option<Envelope>, QueueError> {
        Ok(None)
    }

    async fn ack(&self, _id: MessageId) -> Result<(), QueueError> {
        Ok(())
    }
}

// ========================================
// Repository
// ========================================

/// In-memory repository that records every write.
#[derive(Default)]
pub struct RecordingRepository {
    inner: InMemoryExecutionRepository,
    status_updates: Mutex<Vec<(ExecutionId, ExecutionStatus)>>,
    stage_writes: AtomicUsize,
    context_writes: AtomicUsize,
    read_delay: Option<Duration>,
}

impl RecordingRepository {
    pub async fn with(execution: &Execution) -> Self {
        let repo = Self::default();
        repo.inner.store(execution).await.unwrap();
        repo
    }

    /// Every `retrieve` sleeps first, so concurrent handlers read the same state.
    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    /// Status writes that were applied.
    pub fn status_updates(&self) -> Vec<(ExecutionId, ExecutionStatus)> {
        self.status_updates.lock().unwrap().clone()
    }

    pub fn stage_writes(&self) -> usize {
        self.stage_writes.load(Ordering::SeqCst)
    }

    pub fn context_writes(&self) -> usize {
        self.context_writes.load(Ordering::SeqCst)
    }

    pub async fn stage(&self, execution_id: ExecutionId, stage_id: StageId) -> Stage {
        let execution = self.inner.retrieve(execution_id).await.unwrap();
        execution.stage(stage_id).unwrap().clone()
    }
}

#[async_trait]
impl ExecutionRepository for RecordingRepository {
    async fn store(&self, execution: &Execution) -> Result<(), RepositoryError> {
        self.inner.store(execution).await
    }

    async fn retrieve(&self, id: ExecutionId) -> Result<Execution, RepositoryError> {
        if let Some(delay) = self.read_delay {
            tokio::time::sleep(delay).await;
        }
        self.inner.retrieve(id).await
    }

    async fn store_stage(&self, stage: &Stage) -> Result<(), RepositoryError> {
        self.stage_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.store_stage(stage).await
    }

    async fn update_status(
        &self,
        id: ExecutionId,
        status: ExecutionStatus,
    ) -> Result<bool, RepositoryError> {
        let applied = self.inner.update_status(id, status).await?;
        if applied {
            self.status_updates.lock().unwrap().push((id, status));
        }
        Ok(applied)
    }

    async fn merge_execution_context(
        &self,
        id: ExecutionId,
        outputs: &Context,
    ) -> Result<(), RepositoryError> {
        self.context_writes.fetch_add(1, Ordering::SeqCst);
        self.inner.merge_execution_context(id, outputs).await
    }
}

/// Every call fails with a backend error.
pub struct UnavailableRepository;

#[async_trait]
impl ExecutionRepository for UnavailableRepository {
    async fn store(&self, _execution: &Execution) -> Result<(), RepositoryError> {
        Err(RepositoryError::Backend("unavailable".into()))
    }

    async fn retrieve(&self, _id: ExecutionId) -> Result<Execution, RepositoryError> {
        Err(RepositoryError::Backend("unavailable".into()))
    }

    async fn store_stage(&self, _stage: &Stage) -> Result<(), RepositoryError> {
        Err(RepositoryError::Backend("unavailable".into()))
    }

    async fn update_status(
        &self,
        _id: ExecutionId,
        _status: ExecutionStatus,
    ) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Backend("unavailable".into()))
    }

    async fn merge_execution_context(
        &self,
        _id: ExecutionId,
        _outputs: &Context,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Backend("unavailable".into()))
    }
}

// ========================================
// Event sinks
// ========================================

#[derive(Default)]
pub struct RecordingSink(Mutex<Vec<ExecutionEvent>>);

impl RecordingSink {
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.0.lock().unwrap().clone()
    }
}

impl EventSink for RecordingSink {
    fn publish(&self, event: ExecutionEvent) -> Result<(), SinkError> {
        self.0.lock().unwrap().push(event);
        Ok(())
    }
}

pub struct BrokenSink;

impl EventSink for BrokenSink {
    fn publish(&self, _event: ExecutionEvent) -> Result<(), SinkError> {
        Err(SinkError::Other("listener crashed".into()))
    }
}

// ========================================
// Fixtures
// ========================================

/// Pipeline `foo` with `n` independent `singleTaskStage` stages.
pub fn pipeline_with_initial_stages(n: usize, task_type: &str) -> Execution {
    let mut execution = Execution::new(ExecutionType::Pipeline, "foo");
    for i in 0..n {
        execution.add_stage(
            "singleTaskStage",
            format!("stage {i}"),
            vec![TaskModel::new("dummy", task_type)],
            vec![],
        );
    }
    execution
}

/// One message of `message_type`, carrying as much of `task` as that type holds.
pub fn sample_message(message_type: MessageType, task: &TaskRef) -> Message {
    let run = RunTask {
        task: task.clone(),
        task_type: TaskType::new("deploy.wait"),
    };
    match message_type {
        MessageType::StartExecution => StartExecution {
            execution: task.execution().clone(),
        }
        .into(),
        MessageType::StartStage => StartStage {
            stage: task.stage.clone(),
        }
        .into(),
        MessageType::RunTask => run.into(),
        MessageType::TaskStarting => TaskStarting { task: task.clone() }.into(),
        MessageType::TaskComplete => TaskComplete {
            task: task.clone(),
            status: ExecutionStatus::Succeeded,
        }
        .into(),
        MessageType::StageComplete => StageComplete {
            stage: task.stage.clone(),
            status: ExecutionStatus::Terminal,
        }
        .into(),
        MessageType::ExecutionComplete => ExecutionComplete {
            execution: task.execution().clone(),
            status: ExecutionStatus::Canceled,
        }
        .into(),
        MessageType::ConfigurationError => ConfigurationError::invalid_task_type(&run).into(),
    }
}
