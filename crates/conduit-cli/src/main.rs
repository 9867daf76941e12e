use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use conduit_core::app::{EngineBuilder, EngineConfig};
use conduit_core::domain::{
    Execution, ExecutionEvent, ExecutionType, Stage, TaskError, TaskModel, TaskResult, TaskType,
};
use conduit_core::impls::{ChannelEventSink, InMemoryExecutionRepository, InMemoryQueue};
use conduit_core::typed::Task;

/// Produces an image id for the deploy stages.
struct BakeImage;

#[async_trait]
impl Task for BakeImage {
    fn task_type(&self) -> TaskType {
        TaskType::new("bake.image")
    }

    async fn execute(&self, stage: &Stage) -> Result<TaskResult, TaskError> {
        let ami = format!("ami-{:x}", stage.id.as_ulid().timestamp_ms());
        Ok(TaskResult::succeeded()
            .with_stage_output("baked", json!(true))
            .with_global_output("ami", json!(ami)))
    }
}

/// Pretends instances come up one poll at a time.
struct WaitForUpInstances {
    target: u64,
}

#[async_trait]
impl Task for WaitForUpInstances {
    fn task_type(&self) -> TaskType {
        TaskType::new("deploy.wait_for_up_instances")
    }

    async fn execute(&self, stage: &Stage) -> Result<TaskResult, TaskError> {
        let up = stage.context.get("up").and_then(|v| v.as_u64()).unwrap_or(0) + 1;
        let result = if up < self.target {
            TaskResult::running()
        } else {
            TaskResult::succeeded()
        };
        Ok(result.with_stage_output("up", json!(up)))
    }

    fn backoff_period(&self) -> Option<Duration> {
        Some(Duration::from_millis(100))
    }
}

fn demo_pipeline() -> Execution {
    let mut pipeline = Execution::new(ExecutionType::Pipeline, "demo");
    let bake = pipeline.add_stage(
        "bake",
        "bake",
        vec![TaskModel::new("bake", "bake.image")],
        vec![],
    );
    let regions: Vec<_> = ["us-east-1", "us-west-2"]
        .into_iter()
        .map(|region| {
            pipeline.add_stage(
                "deploy",
                format!("deploy {region}"),
                vec![TaskModel::new("waitForUpInstances", "deploy.wait_for_up_instances")],
                vec![bake],
            )
        })
        .collect();
    pipeline.add_stage(
        "verify",
        "verify",
        vec![TaskModel::new("waitForUpInstances", "deploy.wait_for_up_instances")],
        regions,
    );
    pipeline
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = EngineConfig::from_env()?;
    let (sink, mut events) = ChannelEventSink::new();
    let engine = EngineBuilder::new(
        Arc::new(InMemoryQueue::new(config.lease_duration())),
        Arc::new(InMemoryExecutionRepository::new()),
    )
    .with_config(config)
    .with_event_sink(Arc::new(sink))
    .register_task(BakeImage)?
    .register_task(WaitForUpInstances { target: 3 })?
    .expect_tasks(&["bake.image", "deploy.wait_for_up_instances"])
    .build()?;

    let pipeline = demo_pipeline();
    engine.submit(&pipeline).await?;
    let workers = engine.start();

    while let Some(event) = events.recv().await {
        info!(event = event.name(), "received lifecycle event");
        if matches!(event, ExecutionEvent::ExecutionComplete { .. }) {
            break;
        }
    }
    workers.shutdown_and_join().await;

    let done = engine.repository().retrieve(pipeline.id).await?;
    println!("{}", serde_json::to_string_pretty(&done)?);
    Ok(())
}
