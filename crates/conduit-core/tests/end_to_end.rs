//! End-to-end runs of the in-memory engine.
//!
//! Each test submits a pipeline and drives the queue until the execution
//! reaches a final status:
//! 1. fan-out / join across stages, with polling tasks that reschedule
//! 2. a failing task terminating the execution
//! 3. an unregistered task type surfacing as a configuration error
//! 4. several poll loops sharing one queue

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use conduit_core::app::{Engine, EngineBuilder, EngineConfig, PollOutcome};
use conduit_core::domain::{
    Execution, ExecutionEvent, ExecutionId, ExecutionStatus, ExecutionType, Stage, TaskError,
    TaskModel, TaskResult, TaskType,
};
use conduit_core::impls::{ChannelEventSink, InMemoryExecutionRepository, InMemoryQueue};
use conduit_core::typed::Task;

/// Reports RUNNING for the first `polls` calls on each stage, then succeeds.
struct WaitForInstances {
    polls: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl Task for WaitForInstances {
    fn task_type(&self) -> TaskType {
        TaskType::new("deploy.wait_for_up_instances")
    }

    async fn execute(&self, stage: &Stage) -> Result<TaskResult, TaskError> {
        let seen = stage
            .context
            .get("polls")
            .and_then(|v| v.as_u64())
            .unwrap_or(0) as usize;
        self.calls.fetch_add(1, Ordering::SeqCst);
        if seen < self.polls {
            return Ok(TaskResult::running().with_stage_output("polls", json!(seen + 1)));
        }
        Ok(TaskResult::succeeded().with_global_output(stage.name.clone(), json!("up")))
    }

    fn backoff_period(&self) -> Option<Duration> {
        Some(Duration::from_millis(50))
    }
}

struct Explode;

#[async_trait]
impl Task for Explode {
    fn task_type(&self) -> TaskType {
        TaskType::new("explode")
    }

    async fn execute(&self, _stage: &Stage) -> Result<TaskResult, TaskError> {
        Err(TaskError::failed("boom"))
    }
}

fn single_task(task_type: &str) -> Vec<TaskModel> {
    vec![TaskModel::new("task", task_type)]
}

fn engine(tasks: Vec<Arc<dyn Task>>) -> (Engine, tokio::sync::mpsc::UnboundedReceiver<ExecutionEvent>) {
    let (sink, events) = ChannelEventSink::new();
    let mut builder = EngineBuilder::new(
        Arc::new(InMemoryQueue::default()),
        Arc::new(InMemoryExecutionRepository::new()),
    )
    .with_event_sink(Arc::new(sink));
    for task in tasks {
        builder = builder.register_shared_task(task).unwrap();
    }
    (builder.build().unwrap(), events)
}

async fn run_to_completion(engine: &Engine, id: ExecutionId) -> Execution {
    for _ in 0..10_000 {
        let execution = engine.repository().retrieve(id).await.unwrap();
        if execution.status.is_complete() {
            return execution;
        }
        if engine.poll_once().await.unwrap() == PollOutcome::Idle {
            tokio::time::advance(Duration::from_millis(10)).await;
        }
    }
    panic!("execution {id} did not complete");
}

#[tokio::test(start_paused = true)]
async fn parallel_stages_join_and_succeed() {
    let wait = Arc::new(WaitForInstances {
        polls: 2,
        calls: AtomicUsize::new(0),
    });
    let (engine, mut events) = engine(vec![wait.clone() as Arc<dyn Task>]);

    let mut pipeline = Execution::new(ExecutionType::Pipeline, "foo");
    let east = pipeline.add_stage(
        "singleTaskStage",
        "us-east-1",
        single_task("deploy.wait_for_up_instances"),
        vec![],
    );
    let west = pipeline.add_stage(
        "singleTaskStage",
        "us-west-2",
        single_task("deploy.wait_for_up_instances"),
        vec![],
    );
    let verify = pipeline.add_stage(
        "singleTaskStage",
        "verify",
        single_task("deploy.wait_for_up_instances"),
        vec![east, west],
    );
    engine.submit(&pipeline).await.unwrap();

    let done = run_to_completion(&engine, pipeline.id).await;

    assert_eq!(done.status, ExecutionStatus::Succeeded);
    for stage in &done.stages {
        assert_eq!(stage.status, ExecutionStatus::Succeeded);
        assert_eq!(stage.tasks[0].status, ExecutionStatus::Succeeded);
        assert_eq!(stage.context["polls"], json!(2));
    }
    assert_eq!(done.context["us-east-1"], json!("up"));
    assert_eq!(done.context["verify"], json!("up"));
    assert_eq!(wait.calls.load(Ordering::SeqCst), 9);

    let verify_start = done.stage(verify).unwrap().start_time.unwrap();
    for upstream in [east, west] {
        assert!(done.stage(upstream).unwrap().end_time.unwrap() <= verify_start);
    }

    assert!(matches!(
        events.try_recv().unwrap(),
        ExecutionEvent::ExecutionStarted { .. }
    ));
    assert!(matches!(
        events.try_recv().unwrap(),
        ExecutionEvent::ExecutionComplete {
            status: ExecutionStatus::Succeeded,
            ..
        }
    ));
}

#[tokio::test(start_paused = true)]
async fn failing_task_terminates_the_execution() {
    let (engine, _events) = engine(vec![Arc::new(Explode) as Arc<dyn Task>]);

    let mut pipeline = Execution::new(ExecutionType::Pipeline, "foo");
    let first = pipeline.add_stage("singleTaskStage", "first", single_task("explode"), vec![]);
    let second = pipeline.add_stage("singleTaskStage", "second", single_task("explode"), vec![first]);
    engine.submit(&pipeline).await.unwrap();

    let done = run_to_completion(&engine, pipeline.id).await;

    assert_eq!(done.status, ExecutionStatus::Terminal);
    assert_eq!(done.stage(first).unwrap().status, ExecutionStatus::Terminal);
    assert_eq!(done.stage(second).unwrap().status, ExecutionStatus::NotStarted);
}

#[tokio::test(start_paused = true)]
async fn unregistered_task_type_terminates_the_execution() {
    let (engine, _events) = engine(vec![Arc::new(Explode) as Arc<dyn Task>]);

    let mut pipeline = Execution::new(ExecutionType::Orchestration, "foo");
    pipeline.add_stage("singleTaskStage", "only", single_task("does.not.exist"), vec![]);
    engine.submit(&pipeline).await.unwrap();

    let done = run_to_completion(&engine, pipeline.id).await;

    assert_eq!(done.status, ExecutionStatus::Terminal);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn worker_group_drives_an_execution() {
    let (sink, mut events) = ChannelEventSink::new();
    let config = EngineConfig {
        poll_interval_ms: 1,
        instances: 3,
        ..EngineConfig::default()
    };
    let engine = EngineBuilder::new(
        Arc::new(InMemoryQueue::new(config.lease_duration())),
        Arc::new(InMemoryExecutionRepository::new()),
    )
    .with_config(config)
    .with_event_sink(Arc::new(sink))
    .register_task(WaitForInstances {
        polls: 1,
        calls: AtomicUsize::new(0),
    })
    .unwrap()
    .expect_tasks(&["deploy.wait_for_up_instances"])
    .build()
    .unwrap();

    let mut pipeline = Execution::new(ExecutionType::Pipeline, "foo");
    for region in ["us-east-1", "us-west-2", "eu-west-1"] {
        pipeline.add_stage(
            "singleTaskStage",
            region,
            single_task("deploy.wait_for_up_instances"),
            vec![],
        );
    }
    engine.submit(&pipeline).await.unwrap();
    let workers = engine.start();

    let completed = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(event) = events.recv().await {
            if let ExecutionEvent::ExecutionComplete { status, .. } = event {
                return status;
            }
        }
        panic!("event channel closed");
    })
    .await
    .unwrap();
    workers.shutdown_and_join().await;

    assert_eq!(completed, ExecutionStatus::Succeeded);
    let done = engine.repository().retrieve(pipeline.id).await.unwrap();
    assert!(done.stages.iter().all(|s| s.status == ExecutionStatus::Succeeded));
}
