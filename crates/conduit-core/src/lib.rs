//! conduit-core
//!
//! Queue-driven execution engine: executions are DAGs of stages, stages are
//! sequences of tasks, and every state transition is a message on a
//! delay-capable, at-least-once queue.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（ids, status, execution, graph, message, result, decision, events, errors）
//! - **ports**: 抽象化レイヤー（Queue, ExecutionRepository, Clock, Activation, EventSink）
//! - **typed**: 型付き API（Task trait + TaskRegistry, MessageHandler + HandlerRegistry）
//! - **impls**: 実装（InMemoryQueue, InMemoryExecutionRepository, event sinks）
//! - **app**: アプリケーション層（handlers, TaskWorker, QueueProcessor, WorkerGroup, EngineBuilder）

pub mod app;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod typed;

#[cfg(test)]
pub(crate) mod testing;
