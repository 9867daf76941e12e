//! EngineBuilder - エンジンの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 期待する task type と全メッセージ型の
//!   ハンドラが揃っていなければ `build()` が失敗する

use std::sync::Arc;

use tracing::info;

use super::config::EngineConfig;
use super::handlers::{
    ConfigurationErrorHandler, ExecutionCompleteHandler, HandlerDeps, StageCompleteHandler,
    StartExecutionHandler, StartStageHandler, TaskCompleteHandler, TaskStartingHandler,
};
use super::processor::{PollOutcome, QueueProcessor};
use super::task_worker::TaskWorker;
use super::worker_group::WorkerGroup;
use crate::domain::{
    ConfigurationError, EngineError, Execution, ExecutionComplete, ExecutionRef, MessageType,
    RunTask, StageComplete, StartExecution, StartStage, TaskComplete, TaskStarting, TaskType,
};
use crate::impls::NoopEventSink;
use crate::ports::{
    Activation, ActivationFlag, Clock, EventSink, ExecutionRepository, Queue, SystemClock,
};
use crate::typed::{HandlerRegistry, RegistryError, Task, TaskRegistry};

/// Builds an [`Engine`] around a queue and a repository.
///
/// # 使用例
/// ```ignore
/// let engine = EngineBuilder::new(queue, repository)
///     .with_config(EngineConfig::from_env()?)
///     .register_task(WaitForUpInstances)?
///     .expect_tasks(&["deploy.wait_for_up_instances"])
///     .build()?;
/// let workers = engine.start();
/// ```
///
/// Defaults: `SystemClock`, `NoopEventSink`, an always-active activation flag.
pub struct EngineBuilder {
    queue: Arc<dyn Queue>,
    repository: Arc<dyn ExecutionRepository>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventSink>,
    activation: Arc<dyn Activation>,
    config: EngineConfig,
    tasks: TaskRegistry,
    expected_tasks: Option<Vec<TaskType>>,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("missing task types: {0:?}; these were expected but not registered")]
    MissingTaskTypes(Vec<String>),

    #[error("no handler for message types: {0:?}")]
    MissingHandlers(Vec<MessageType>),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl EngineBuilder {
    pub fn new(queue: Arc<dyn Queue>, repository: Arc<dyn ExecutionRepository>) -> Self {
        Self {
            queue,
            repository,
            clock: Arc::new(SystemClock),
            events: Arc::new(NoopEventSink),
            activation: Arc::new(ActivationFlag::enabled()),
            config: EngineConfig::default(),
            tasks: TaskRegistry::new(),
            expected_tasks: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn with_activation(mut self, activation: Arc<dyn Activation>) -> Self {
        self.activation = activation;
        self
    }

    pub fn register_task<T: Task + 'static>(mut self, task: T) -> Result<Self, RegistryError> {
        self.tasks.register(Arc::new(task))?;
        Ok(self)
    }

    pub fn register_shared_task(mut self, task: Arc<dyn Task>) -> Result<Self, RegistryError> {
        self.tasks.register(task)?;
        Ok(self)
    }

    /// Task types that must be registered for `build()` to succeed.
    pub fn expect_tasks(mut self, task_types: &[&str]) -> Self {
        self.expected_tasks = Some(task_types.iter().map(|&t| TaskType::new(t)).collect());
        self
    }

    pub fn build(self) -> Result<Engine, BuildError> {
        if let Some(expected) = &self.expected_tasks {
            let registered = self.tasks.registered_types();
            let missing: Vec<String> = expected
                .iter()
                .filter(|t| !registered.contains(t))
                .map(|t| t.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingTaskTypes(missing));
            }
        }

        let deps = HandlerDeps {
            queue: Arc::clone(&self.queue),
            repository: Arc::clone(&self.repository),
            clock: self.clock,
            events: self.events,
        };
        let tasks = Arc::new(self.tasks);

        let mut handlers = HandlerRegistry::new();
        handlers.register::<StartExecution, _>(StartExecutionHandler::new(deps.clone()))?;
        handlers.register::<StartStage, _>(StartStageHandler::new(deps.clone()))?;
        handlers.register::<TaskStarting, _>(TaskStartingHandler::new(deps.clone()))?;
        handlers.register::<RunTask, _>(TaskWorker::new(
            deps.clone(),
            Arc::clone(&tasks),
            self.config.default_backoff(),
        ))?;
        handlers.register::<TaskComplete, _>(TaskCompleteHandler::new(deps.clone()))?;
        handlers.register::<StageComplete, _>(StageCompleteHandler::new(deps.clone()))?;
        handlers.register::<ExecutionComplete, _>(ExecutionCompleteHandler::new(deps.clone()))?;
        handlers.register::<ConfigurationError, _>(ConfigurationErrorHandler::new(deps))?;

        let missing = handlers.missing_types();
        if !missing.is_empty() {
            return Err(BuildError::MissingHandlers(missing));
        }

        info!(
            task_types = ?tasks.registered_types(),
            handlers = handlers.len(),
            instances = self.config.instances,
            "engine built"
        );

        let processor = Arc::new(QueueProcessor::new(
            Arc::clone(&self.queue),
            Arc::new(handlers),
            self.activation,
        ));
        Ok(Engine {
            queue: self.queue,
            repository: self.repository,
            processor,
            tasks,
            config: self.config,
        })
    }
}

/// A wired engine: processor plus the collaborators it was built with.
pub struct Engine {
    queue: Arc<dyn Queue>,
    repository: Arc<dyn ExecutionRepository>,
    processor: Arc<QueueProcessor>,
    tasks: Arc<TaskRegistry>,
    config: EngineConfig,
}

impl Engine {
    /// Store a new execution and queue its `StartExecution`.
    pub async fn submit(&self, execution: &Execution) -> Result<(), EngineError> {
        self.repository.store(execution).await?;
        let start = StartExecution {
            execution: ExecutionRef::of(execution),
        };
        self.queue.push_now(start.into()).await?;
        info!(execution_id = %execution.id, application = %execution.application, "execution submitted");
        Ok(())
    }

    pub async fn poll_once(&self) -> Result<PollOutcome, EngineError> {
        self.processor.poll_once().await
    }

    /// Spawn `config.instances` poll loops.
    pub fn start(&self) -> WorkerGroup {
        WorkerGroup::spawn(
            self.config.instances,
            Arc::clone(&self.processor),
            self.config.poll_interval(),
        )
    }

    pub fn repository(&self) -> &Arc<dyn ExecutionRepository> {
        &self.repository
    }

    pub fn task_types(&self) -> Vec<TaskType> {
        self.tasks.registered_types()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
